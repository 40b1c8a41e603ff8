/*!
 * # Subweave - multi-pass subtitle translation with language models
 *
 * A Rust library that translates timed transcript segments into subtitles
 * in another language.
 *
 * ## Features
 *
 * - Read segments from SRT or JSON transcripts, write SRT (original, translated or dual cues)
 * - Merge orphan cues before translating
 * - Translate in concurrent batches with surrounding context
 * - Review in overlapping windows against a reading-speed budget
 * - Recover from malformed model output without failing the run
 * - Retry transient provider errors with exponential backoff
 * - Cancel any run at any point
 * - Providers:
 *   - Ollama (local LLM)
 *   - OpenAI API (and OpenAI-compatible servers such as LM Studio)
 *   - Anthropic API
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: Segment model, SRT/JSON reading and writing
 * - `translation`: The translation pipeline:
 *   - `translation::fusion`: Orphan cue fusion
 *   - `translation::batch`: Batch and window planning
 *   - `translation::parser`: Tolerant response parsing
 *   - `translation::pipeline`: Translate and review passes, orchestrator
 * - `app_controller`: Main application controller
 * - `run_registry`: Cancellable registry of active runs
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for various LLM providers
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod run_registry;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, PipelineError, ProviderError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use run_registry::{RunGuard, RunRegistry};
pub use subtitle_processor::{CueTextMode, Segment, SegmentCollection};
pub use translation::{PipelineConfig, PipelineResult, TranslationPipeline};
