/*!
 * Pipeline orchestrator for coordinating the stages.
 *
 * One run goes through:
 * 1. Word-timing normalisation (or removal when disabled)
 * 2. Orphan fusion (optional)
 * 3. Translation pass
 * 4. Review pass (optional)
 *
 * Progress from every stage is folded into one monotonic 0-100 percentage.
 */

use log::info;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::errors::PipelineError;
use crate::language_utils::is_original_target;
use crate::providers::ModelClient;
use crate::subtitle_processor::{reindex, Segment};
use crate::translation::fusion::{FusionConfig, FusionStats, OrphanFuser};
use crate::translation::retry::RetryPolicy;
use crate::translation::word_timing::{normalize_word_timings, strip_word_timings};

use super::review_pass::{ReviewPass, ReviewPassConfig, ReviewStats};
use super::translation_pass::{TranslationPass, TranslationPassConfig, TranslationStats};

/// Percentage at which the translate stage starts.
pub const TRANSLATE_START: f32 = 5.0;
/// Percentage at which the review stage starts.
pub const REVIEW_START: f32 = 70.0;
/// Where translation ends when review is disabled.
pub const TRANSLATE_END_WITHOUT_REVIEW: f32 = 95.0;

/// Configuration for the translation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Whether to fuse orphan cues before translating
    pub enable_fusion: bool,

    /// Whether to run the review pass
    pub enable_review: bool,

    /// Whether word timestamps are kept (and normalised)
    pub enable_word_timings: bool,

    /// Orphan fusion thresholds
    pub fusion_config: FusionConfig,

    /// Configuration for the translation pass
    pub translation_config: TranslationPassConfig,

    /// Configuration for the review pass
    pub review_config: ReviewPassConfig,

    /// Source language
    pub source_language: String,

    /// Target language, or "original" for pass-through
    pub target_language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_fusion: true,
            enable_review: true,
            enable_word_timings: true,
            fusion_config: FusionConfig::default(),
            translation_config: TranslationPassConfig::default(),
            review_config: ReviewPassConfig::default(),
            source_language: "en".to_string(),
            target_language: "fr".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline configuration.
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            ..Default::default()
        }
    }

    /// Build from the application config file.
    pub fn from_app_config(config: &Config) -> Self {
        let settings = &config.pipeline;
        let retry = RetryPolicy::new(
            config.translation.common.retry_count,
            Duration::from_millis(config.translation.common.retry_backoff_ms),
        );

        Self {
            enable_fusion: settings.enable_fusion,
            enable_review: settings.enable_review,
            enable_word_timings: settings.enable_word_timings,
            fusion_config: settings.fusion.clone(),
            translation_config: TranslationPassConfig {
                batch_size: settings.translate_batch_size,
                context_size: settings.translate_context_size,
                concurrency: settings.concurrency,
                retry,
            },
            review_config: ReviewPassConfig {
                batch_size: settings.review_batch_size,
                step: settings.review_step,
                context_size: settings.review_context_size,
                retry,
            },
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
        }
    }

    /// Enable or disable the review pass.
    pub fn with_review(mut self, enabled: bool) -> Self {
        self.enable_review = enabled;
        self
    }

    /// Enable or disable orphan fusion.
    pub fn with_fusion(mut self, enabled: bool) -> Self {
        self.enable_fusion = enabled;
        self
    }

    /// Enable or disable word timings.
    pub fn with_word_timings(mut self, enabled: bool) -> Self {
        self.enable_word_timings = enabled;
        self
    }

    /// Set how many translate batches run at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.translation_config.concurrency = concurrency;
        self
    }

    /// Use the same retry policy for both passes.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.translation_config.retry = retry;
        self.review_config.retry = retry;
        self
    }

    fn review_start(&self) -> f32 {
        if self.enable_review {
            REVIEW_START
        } else {
            TRANSLATE_END_WITHOUT_REVIEW
        }
    }
}

/// Stages of the translation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Preparing segments (timings, fusion)
    Start,
    /// Translating batches
    Translate,
    /// Reviewing windows
    Review,
    /// Run finished
    Final,
}

/// Progress information during pipeline execution.
#[derive(Debug, Clone)]
pub struct PipelineProgress {
    /// Overall progress (0 - 100), never decreasing within a run
    pub percent: f32,

    /// Stage that produced this event
    pub stage: PipelineStage,

    /// Transcript as it stands, when the stage has one to show
    pub partial: Option<Vec<Segment>>,
}

/// Progress sink signature.
pub type ProgressFn<'a> = dyn Fn(PipelineProgress) + Send + Sync + 'a;

/// Folds stage-local progress into one monotonic percentage.
struct ProgressReporter<'a> {
    sink: Option<&'a ProgressFn<'a>>,
    last: Mutex<f32>,
}

impl<'a> ProgressReporter<'a> {
    fn new(sink: Option<&'a ProgressFn<'a>>) -> Self {
        Self { sink, last: Mutex::new(0.0) }
    }

    /// Map `done / total` into `[from, to]` and emit.
    fn scaled(&self, stage: PipelineStage, from: f32, to: f32, done: usize, total: usize, partial: &[Segment]) {
        let fraction = if total == 0 { 1.0 } else { done as f32 / total as f32 };
        self.emit(stage, from + (to - from) * fraction.clamp(0.0, 1.0), Some(partial.to_vec()));
    }

    fn emit(&self, stage: PipelineStage, percent: f32, partial: Option<Vec<Segment>>) {
        let percent = {
            let mut last = self.last.lock();
            *last = percent.clamp(*last, 100.0);
            *last
        };

        if let Some(sink) = self.sink {
            sink(PipelineProgress { percent, stage, partial });
        }
    }
}

/// Result of the complete pipeline execution.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Final segments, re-indexed, each with a translation
    pub segments: Vec<Segment>,

    /// Fusion statistics (if fusion ran)
    pub fusion_stats: Option<FusionStats>,

    /// Translation statistics (absent for pass-through runs)
    pub translation_stats: Option<TranslationStats>,

    /// Review statistics (if review ran)
    pub review_stats: Option<ReviewStats>,

    /// Total duration of pipeline execution
    pub duration: Duration,
}

impl PipelineResult {
    /// Get a summary of the pipeline result.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        parts.push(format!("Duration: {:.2}s", self.duration.as_secs_f32()));

        if let Some(ref fusion) = self.fusion_stats {
            parts.push(format!(
                "Fusion: {} -> {} segments",
                fusion.input_segments,
                fusion.input_segments - fusion.merged
            ));
        }

        if let Some(ref translation) = self.translation_stats {
            parts.push(format!(
                "Translation: {} batches, {:.0}% answered, {} retries, {} lines on source text",
                translation.total_batches,
                translation.success_rate(),
                translation.total_retries,
                translation.fallback_lines
            ));
        }

        if let Some(ref review) = self.review_stats {
            parts.push(format!(
                "Review: {}/{} windows applied, {} lines revised, {} soft merges",
                review.applied_batches, review.total_batches, review.revised_lines, review.soft_merges
            ));
        }

        parts.join(" | ")
    }
}

/// The main translation pipeline orchestrator.
pub struct TranslationPipeline {
    config: PipelineConfig,
    client: ModelClient,
}

impl TranslationPipeline {
    /// Create a new pipeline with the given configuration.
    pub fn new(config: PipelineConfig, client: ModelClient) -> Self {
        Self { config, client }
    }

    /// Get the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every enabled stage over `segments`.
    ///
    /// Returns no partial result on cancellation or credit exhaustion.
    pub async fn run(
        &self,
        segments: Vec<Segment>,
        cancel: &CancellationToken,
        progress: Option<&ProgressFn<'_>>,
    ) -> Result<PipelineResult, PipelineError> {
        let start_time = Instant::now();
        let reporter = ProgressReporter::new(progress);
        let target = self.config.target_language.trim();

        if target.is_empty() {
            return Err(PipelineError::InvalidInput("target language is empty".to_string()));
        }

        if is_original_target(target) {
            info!("Target is the original language, passing {} segments through", segments.len());
            reporter.emit(PipelineStage::Final, 100.0, Some(segments.clone()));
            return Ok(PipelineResult {
                segments,
                fusion_stats: None,
                translation_stats: None,
                review_stats: None,
                duration: start_time.elapsed(),
            });
        }

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        reporter.emit(PipelineStage::Start, 0.0, None);
        let mut segments = segments;
        segments.iter_mut().for_each(Segment::clamp_span);
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        reindex(&mut segments);

        if self.config.enable_word_timings {
            normalize_word_timings(&mut segments);
        } else {
            strip_word_timings(&mut segments);
        }

        let fusion_stats = if self.config.enable_fusion {
            let (fused, stats) = OrphanFuser::new(self.config.fusion_config.clone()).fuse(segments);
            info!("Fusion merged {} orphan cues ({} remain)", stats.merged, fused.len());
            segments = fused;
            Some(stats)
        } else {
            None
        };

        // Stage 1: translation
        let review_start = self.config.review_start();
        reporter.emit(PipelineStage::Translate, TRANSLATE_START, None);

        let translation_pass = TranslationPass::new(
            self.config.translation_config.clone(),
            self.client.clone(),
            &self.config.source_language,
            target,
        );
        let (segments, translation_stats) = translation_pass
            .run(segments, cancel, |done, total, partial| {
                reporter.scaled(PipelineStage::Translate, TRANSLATE_START, review_start, done, total, partial);
            })
            .await?;
        let translated_count = segments.len();

        // Stage 2: review
        let (segments, review_stats) = if self.config.enable_review {
            reporter.emit(PipelineStage::Review, REVIEW_START, None);
            let review_pass = ReviewPass::new(
                self.config.review_config.clone(),
                self.client.clone(),
                &self.config.source_language,
                target,
            );
            let (segments, stats) = review_pass
                .run(segments, cancel, |done, total, partial| {
                    reporter.scaled(PipelineStage::Review, REVIEW_START, 100.0, done, total, partial);
                })
                .await?;
            (segments, Some(stats))
        } else {
            (segments, None)
        };
        debug_assert_eq!(translated_count, segments.len());

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        reporter.emit(PipelineStage::Final, 100.0, Some(segments.clone()));

        let result = PipelineResult {
            segments,
            fusion_stats,
            translation_stats: Some(translation_stats),
            review_stats,
            duration: start_time.elapsed(),
        };
        info!("Pipeline finished: {}", result.summary());

        Ok(result)
    }
}
