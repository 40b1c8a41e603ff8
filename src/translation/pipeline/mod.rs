/*!
 * Translation pipeline for multi-pass subtitle translation.
 *
 * The pipeline processes a transcript in two model-driven passes:
 * 1. **Translation Pass**: Translate disjoint batches concurrently, with surrounding context
 * 2. **Review Pass**: Polish overlapping windows sequentially against a reading-speed budget
 */

pub mod orchestrator;
pub mod review_pass;
pub mod translation_pass;

// Re-export types used externally
pub use orchestrator::{
    PipelineConfig, PipelineProgress, PipelineResult, PipelineStage, ProgressFn, TranslationPipeline,
};
pub use review_pass::{ReviewPass, ReviewPassConfig, ReviewStats};
pub use translation_pass::{TranslationPass, TranslationPassConfig, TranslationStats};
