// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use subweave::app_config::{self, Config, TranslationProvider, MAX_CONCURRENCY};
use subweave::app_controller::Controller;
use subweave::errors::{AppError, PipelineError};
use subweave::run_registry::RunRegistry;
use subweave::subtitle_processor::CueTextMode;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    OpenAI,
    Anthropic,
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Which text goes into each written cue
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCueMode {
    Original,
    Translation,
    Dual,
}

impl From<CliCueMode> for CueTextMode {
    fn from(mode: CliCueMode) -> Self {
        match mode {
            CliCueMode::Original => CueTextMode::Original,
            CliCueMode::Translation => CueTextMode::Translation,
            CliCueMode::Dual => CueTextMode::Dual,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a transcript (SRT or JSON segments)
    Translate(TranslateArgs),

    /// Generate shell completions for subweave
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input transcript (.srt or .json)
    #[arg(value_name = "INPUT")]
    input_path: PathBuf,

    /// Output file (.srt, or .json for segments); defaults next to the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code, or 'original' to keep the source text
    #[arg(short, long)]
    target_language: Option<String>,

    /// Text written into each cue
    #[arg(long, value_enum, default_value = "translation")]
    cue: CliCueMode,

    /// Skip the review pass
    #[arg(long)]
    no_review: bool,

    /// Skip orphan cue fusion
    #[arg(long)]
    no_fusion: bool,

    /// Translate batches in flight at once
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=MAX_CONCURRENCY as i64))]
    concurrency: Option<u8>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Subweave - multi-pass subtitle translation with AI
///
/// Translates timed transcripts into subtitles, then reviews them
/// against a reading-speed budget.
#[derive(Parser, Debug)]
#[command(name = "subweave")]
#[command(version)]
#[command(about = "Multi-pass subtitle translation with language models")]
#[command(long_about = "Subweave translates timed transcripts (SRT or JSON segments) with a language model,
then reviews the result in overlapping windows so each cue fits its reading-speed budget.

EXAMPLES:
    subweave translate talk.en.srt -t fr                  # Translate using default config
    subweave translate talk.json -t de -o talk.de.srt     # Explicit output file
    subweave translate talk.srt -t ja --cue dual          # Source and translation in each cue
    subweave translate talk.srt -t es --no-review         # Single pass, no review
    subweave translate talk.srt -t it -p openai -m gpt-4o # Use specific provider and model
    subweave completions bash > subweave.bash             # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic Claude API (requires API key)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, colour) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subweave", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
    }
}

/// Apply command line overrides on top of the loaded config
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    if options.no_review {
        config.pipeline.enable_review = false;
    }

    if options.no_fusion {
        config.pipeline.enable_fusion = false;
    }

    if let Some(concurrency) = options.concurrency {
        config.pipeline.concurrency = concurrency as usize;
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, &options);
    log::set_max_level(config.log_level.to_level_filter());

    let registry = RunRegistry::new();
    let controller = Controller::with_registry(config, registry.clone())?;

    // Ctrl-C cancels every registered run; the pipeline unwinds on its own
    let signal_registry = registry.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let cancelled = signal_registry.cancel_all();
            warn!("Interrupted, cancelling {} run(s)", cancelled);
        }
    });

    let outcome = controller
        .run(
            &options.input_path,
            options.output.as_deref(),
            options.cue.into(),
            options.force_overwrite,
        )
        .await;

    match outcome {
        Ok(path) => {
            info!("Wrote {}", path.display());
            Ok(())
        }
        Err(error) => match error.downcast_ref::<AppError>() {
            Some(AppError::Pipeline(PipelineError::Cancelled)) => {
                warn!("Translation cancelled, nothing was written");
                Err(anyhow!("cancelled"))
            }
            Some(AppError::Pipeline(PipelineError::InsufficientCredits(message))) => {
                error!("Provider ran out of credits: {}", message);
                Err(error)
            }
            _ => Err(error),
        },
    }
}
