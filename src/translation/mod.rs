/*!
 * Subtitle translation with language models.
 *
 * This module is split into several submodules:
 *
 * - `batch`: Batch and window planning over the segment sequence
 * - `fusion`: Merging orphan cues before translation
 * - `word_timing`: Word timestamp normalisation
 * - `prompts`: Prompt templates and builders
 * - `parser`: Line-marker response parsing
 * - `retry`: Exponential backoff around model calls
 * - `pipeline`: The translate and review passes and their orchestrator
 */

// Re-export main types for easier usage
pub use self::batch::{Batch, BatchPlanner};
pub use self::fusion::{FusionConfig, FusionStats, OrphanFuser};
pub use self::pipeline::{PipelineConfig, PipelineProgress, PipelineResult, TranslationPipeline};
pub use self::prompts::{PromptTemplate, ReviewPromptBuilder, TranslationPromptBuilder};
pub use self::retry::RetryPolicy;

// Submodules
pub mod batch;
pub mod fusion;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod word_timing;
