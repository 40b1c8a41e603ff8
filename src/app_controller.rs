use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_config::Config;
use crate::errors::AppError;
use crate::language_utils;
use crate::providers::{self, ModelClient};
use crate::run_registry::RunRegistry;
use crate::subtitle_processor::{CueTextMode, Segment, SegmentCollection};
use crate::translation::pipeline::{PipelineConfig, PipelineProgress, PipelineResult, PipelineStage, TranslationPipeline};

// @module: Application controller for transcript translation

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Active runs, shared with the signal handler
    registry: RunRegistry,
}

impl Controller {
    /// Create a new controller with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_registry(config, RunRegistry::new())
    }

    /// Create a controller that records its runs in `registry`
    pub fn with_registry(config: Config, registry: RunRegistry) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    /// Translate `input_file` with the configured provider and write the result.
    ///
    /// Returns the path that was written.
    pub async fn run(
        &self,
        input_file: &Path,
        output_file: Option<&Path>,
        cue_mode: CueTextMode,
        force_overwrite: bool,
    ) -> Result<PathBuf> {
        let client = providers::build_client(&self.config.translation);
        self.run_with_client(input_file, output_file, cue_mode, force_overwrite, client).await
    }

    /// Same as [`Controller::run`] with an explicit model client
    pub async fn run_with_client(
        &self,
        input_file: &Path,
        output_file: Option<&Path>,
        cue_mode: CueTextMode,
        force_overwrite: bool,
        client: ModelClient,
    ) -> Result<PathBuf> {
        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = match output_file {
            Some(path) => path.to_path_buf(),
            None => Self::output_path_for(input_file, &self.config.target_language),
        };
        if output_path.exists() && !force_overwrite {
            return Err(anyhow!(
                "Output file already exists: {} (use -f to force overwrite)",
                output_path.display()
            ));
        }

        let collection = SegmentCollection::load(input_file)?;
        info!(
            "Loaded {} segments from {}, translating {} -> {} with {}",
            collection.segments.len(),
            input_file.display(),
            language_utils::display_name(&self.config.source_language),
            language_utils::display_name(&self.config.target_language),
            client.provider_name()
        );

        let result = self.translate_segments(collection.segments, client).await?;

        let translated = SegmentCollection::new(collection.source_file, result.segments);
        Self::save(&translated, &output_path, cue_mode)?;

        info!(
            "Translation completed in {}. {}",
            Self::format_duration(result.duration),
            result.translation_stats.map(|s| format!("{} batches", s.total_batches)).unwrap_or_default()
        );
        info!("Success: {}", output_path.display());

        Ok(output_path)
    }

    /// Run the pipeline over `segments` as a registered, cancellable run
    pub async fn translate_segments(
        &self,
        segments: Vec<Segment>,
        client: ModelClient,
    ) -> Result<PipelineResult, AppError> {
        let pipeline = TranslationPipeline::new(PipelineConfig::from_app_config(&self.config), client);
        let guard = self.registry.register();

        let progress_bar = Self::create_progress_bar();
        let bar = progress_bar.clone();
        let on_progress = move |progress: PipelineProgress| {
            bar.set_position(progress.percent.round() as u64);
            bar.set_message(Self::stage_label(progress.stage));
        };

        let outcome = pipeline.run(segments, guard.token(), Some(&on_progress)).await;

        match &outcome {
            Ok(_) => progress_bar.finish_with_message("done"),
            Err(error) => {
                progress_bar.abandon_with_message(error.to_string());
                warn!("Run {} stopped: {}", guard.id(), error);
            }
        }

        outcome.map_err(AppError::from)
    }

    fn create_progress_bar() -> ProgressBar {
        let progress_bar = ProgressBar::new(100);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.enable_steady_tick(Duration::from_millis(120));
        progress_bar
    }

    fn stage_label(stage: PipelineStage) -> &'static str {
        match stage {
            PipelineStage::Start => "preparing",
            PipelineStage::Translate => "translating",
            PipelineStage::Review => "reviewing",
            PipelineStage::Final => "done",
        }
    }

    /// Write SRT, or JSON when the output path ends in `.json`
    fn save(collection: &SegmentCollection, output_path: &Path, cue_mode: CueTextMode) -> Result<()> {
        let is_json = output_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            collection.write_to_json(output_path)
        } else {
            collection.write_to_srt(output_path, cue_mode)
        }
    }

    /// Default output path: `movie.en.srt` -> `movie.fr.srt`, `talk.json` -> `talk.fr.srt`
    pub fn output_path_for(input_file: &Path, target_language: &str) -> PathBuf {
        let stem = input_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "subtitles".to_string());

        // drop a trailing language tag so it is replaced, not stacked
        let base = match stem.rsplit_once('.') {
            Some((head, tag)) if language_utils::validate_language_code(tag).is_ok() => head.to_string(),
            _ => stem,
        };

        let filename = format!("{}.{}.srt", base, target_language.to_lowercase());
        match input_file.parent() {
            Some(parent) => parent.join(filename),
            None => PathBuf::from(filename),
        }
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
