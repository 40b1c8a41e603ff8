/*!
 * Review pass.
 *
 * Walks overlapping windows over the translated transcript, one at a time,
 * and lets the model polish drafts against a per-line character budget. A
 * window's answer is applied only if it is well formed; otherwise the window
 * keeps its current translations.
 */

use log::{debug, info, warn};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

use crate::errors::PipelineError;
use crate::providers::ModelClient;
use crate::subtitle_processor::Segment;
use crate::translation::batch::{Batch, BatchPlanner};
use crate::translation::parser::parse_review;
use crate::translation::prompts::ReviewPromptBuilder;
use crate::translation::retry::{invoke_with_retry, RetryPolicy};

/// Configuration for the review pass.
#[derive(Debug, Clone)]
pub struct ReviewPassConfig {
    /// Segments per window
    pub batch_size: usize,

    /// Offset between windows; smaller than `batch_size` for overlap
    pub step: usize,

    /// Context segments shown on each side
    pub context_size: usize,

    pub retry: RetryPolicy,
}

impl Default for ReviewPassConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            step: 15,
            context_size: 5,
            retry: RetryPolicy::default(),
        }
    }
}

/// Statistics for the review pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewStats {
    pub total_batches: usize,

    /// Windows whose answer was applied
    pub applied_batches: usize,

    /// Windows discarded for duplicate IDs or low coverage
    pub rejected_batches: usize,

    /// Windows whose model call failed
    pub failed_batches: usize,

    /// Lines whose translation changed
    pub revised_lines: usize,

    /// Adjacent line pairs that received one shared merged text
    pub soft_merges: usize,
}

/// Adjacent requested lines answered with the same text while their sources differ.
fn count_soft_merges(batch: &Batch, answers: &HashMap<usize, String>) -> usize {
    batch.segments
        .windows(2)
        .filter(|pair| {
            match (answers.get(&pair[0].index), answers.get(&pair[1].index)) {
                (Some(left), Some(right)) => {
                    !left.is_empty() && left == right && pair[0].original.trim() != pair[1].original.trim()
                }
                _ => false,
            }
        })
        .count()
}

/// Review pass over translated segments.
pub struct ReviewPass {
    config: ReviewPassConfig,
    client: ModelClient,
    prompts: ReviewPromptBuilder,
}

impl ReviewPass {
    pub fn new(
        config: ReviewPassConfig,
        client: ModelClient,
        source_language: &str,
        target_language: &str,
    ) -> Self {
        Self {
            config,
            client,
            prompts: ReviewPromptBuilder::new(source_language, target_language),
        }
    }

    /// Write accepted answers into the sequence, honouring the review marker.
    fn apply(
        segments: &mut [Segment],
        batch: &Batch,
        answers: &HashMap<usize, String>,
        stats: &mut ReviewStats,
    ) {
        for (position, reviewed) in batch.segments.iter().enumerate() {
            let Some(text) = answers.get(&reviewed.index) else {
                continue;
            };
            // blank means "keep the draft"
            if text.is_empty() {
                continue;
            }

            let segment = &mut segments[batch.start + position];
            if segment.reviewed_in_batch.is_some_and(|marker| batch.start < marker) {
                continue;
            }

            if segment.translation != *text {
                stats.revised_lines += 1;
                segment.translation = text.clone();
            }
            segment.reviewed_in_batch = Some(batch.start);
        }
    }

    /// Review every window in order.
    ///
    /// `on_progress(done, total, partial)` fires after each window.
    pub async fn run<F>(
        &self,
        mut segments: Vec<Segment>,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<(Vec<Segment>, ReviewStats), PipelineError>
    where
        F: FnMut(usize, usize, &[Segment]),
    {
        let planner = BatchPlanner::overlapping(
            self.config.batch_size,
            self.config.step,
            self.config.context_size,
        );
        let offsets = planner.offsets(segments.len());
        let mut stats = ReviewStats {
            total_batches: offsets.len(),
            ..Default::default()
        };
        info!(
            "Reviewing {} segments in {} windows ({:?} script budget)",
            segments.len(),
            offsets.len(),
            self.prompts.script()
        );

        for (done, offset) in offsets.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            // snapshot after earlier windows so overlap sees revised drafts
            let batch = planner.batch_at(&segments, offset);
            let messages = self.prompts.build(&batch);

            match invoke_with_retry(&self.client, &messages, &self.config.retry, cancel).await {
                Ok(answer) => match parse_review(&answer.text, &batch.ids()) {
                    Ok(answers) => {
                        let merges = count_soft_merges(&batch, &answers);
                        if merges > 0 {
                            debug!("Review window at {}: {} soft merges", offset + 1, merges);
                        }
                        stats.soft_merges += merges;
                        Self::apply(&mut segments, &batch, &answers, &mut stats);
                        stats.applied_batches += 1;
                    }
                    Err(reason) => {
                        warn!("Discarding review of lines {}-{}: {}", offset + 1, batch.end(), reason);
                        stats.rejected_batches += 1;
                    }
                },
                Err(error) => {
                    if let Some(fatal) = PipelineError::from_fatal(&error) {
                        return Err(fatal);
                    }
                    warn!("Review of lines {}-{} failed: {}", offset + 1, batch.end(), error);
                    stats.failed_batches += 1;
                }
            }

            on_progress(done + 1, stats.total_batches, &segments);
        }

        info!(
            "Review done: {} windows applied, {} lines revised, {} soft merges",
            stats.applied_batches, stats.revised_lines, stats.soft_merges
        );

        Ok((segments, stats))
    }
}
