/*!
 * Translation pass.
 *
 * Translates disjoint batches with bounded concurrency. Each batch gets one
 * model call, an optional repair call for the lines the first answer left
 * unresolved, and falls back to the source text for whatever is still
 * missing. Cancellation and credit exhaustion abort the whole pass.
 */

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::app_config::MAX_CONCURRENCY;
use crate::errors::{PipelineError, ProviderError};
use crate::providers::ModelClient;
use crate::subtitle_processor::{reindex, Segment};
use crate::translation::batch::{Batch, BatchPlanner};
use crate::translation::parser::{apply_echo_guard, ParsedResponse};
use crate::translation::prompts::TranslationPromptBuilder;
use crate::translation::retry::{invoke_with_retry, RetryPolicy};

/// Configuration for the translation pass.
#[derive(Debug, Clone)]
pub struct TranslationPassConfig {
    /// Segments per batch
    pub batch_size: usize,

    /// Context segments shown on each side
    pub context_size: usize,

    /// Batches in flight at once; 1 is strictly sequential
    pub concurrency: usize,

    /// Retry policy for every model call
    pub retry: RetryPolicy,
}

impl Default for TranslationPassConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            context_size: 12,
            concurrency: MAX_CONCURRENCY,
            retry: RetryPolicy::default(),
        }
    }
}

/// How a batch obtained its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every line came from the first answer
    Translated,
    /// The repair call was needed
    Repaired,
    /// The model call failed and the batch kept its source text
    Fallback,
}

/// Result of translating a single batch.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Offset of the batch in the sequence
    pub start: usize,

    /// One text per batch segment, in order
    pub texts: Vec<String>,

    pub outcome: BatchOutcome,

    /// Retries spent on this batch
    pub retries_used: u32,

    /// Lines resolved by the repair call
    pub repaired_lines: usize,

    /// Lines that ended with their source text
    pub fallback_lines: usize,
}

/// Statistics for the translation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationStats {
    /// Total number of batches planned
    pub total_batches: usize,

    /// Batches whose model call succeeded
    pub completed_batches: usize,

    /// Batches that needed a repair call
    pub repaired_batches: usize,

    /// Batches that fell back to source text entirely
    pub fallback_batches: usize,

    /// Lines resolved by repair calls
    pub repaired_lines: usize,

    /// Lines left with their source text
    pub fallback_lines: usize,

    /// Total retries across all batches
    pub total_retries: usize,
}

impl TranslationStats {
    /// Share of batches answered by the model, in percent.
    pub fn success_rate(&self) -> f32 {
        if self.total_batches == 0 {
            return 100.0;
        }
        (self.completed_batches as f32 / self.total_batches as f32) * 100.0
    }

    fn record(&mut self, result: &BatchResult) {
        match result.outcome {
            BatchOutcome::Translated => self.completed_batches += 1,
            BatchOutcome::Repaired => {
                self.completed_batches += 1;
                self.repaired_batches += 1;
            }
            BatchOutcome::Fallback => self.fallback_batches += 1,
        }
        self.repaired_lines += result.repaired_lines;
        self.fallback_lines += result.fallback_lines;
        self.total_retries += result.retries_used as usize;
    }
}

fn abort_or_continue(error: ProviderError, what: &str, batch: &Batch) -> Result<(), PipelineError> {
    if let Some(fatal) = PipelineError::from_fatal(&error) {
        return Err(fatal);
    }
    warn!(
        "{} for lines {}-{} failed: {}",
        what,
        batch.start + 1,
        batch.end(),
        error
    );
    Ok(())
}

/// Translation pass for turning source text into target text.
pub struct TranslationPass {
    config: TranslationPassConfig,
    client: ModelClient,
    prompts: TranslationPromptBuilder,
}

impl TranslationPass {
    pub fn new(
        config: TranslationPassConfig,
        client: ModelClient,
        source_language: &str,
        target_language: &str,
    ) -> Self {
        Self {
            config,
            client,
            prompts: TranslationPromptBuilder::new(source_language, target_language),
        }
    }

    /// Translate a single batch.
    ///
    /// Only fatal errors are returned; every other failure degrades to source text.
    pub async fn translate_batch(
        &self,
        batch: Batch,
        cancel: &CancellationToken,
    ) -> Result<BatchResult, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let ids = batch.ids();
        let sources: Vec<&str> = batch.segments.iter().map(|s| s.original.as_str()).collect();
        let mut result = BatchResult {
            start: batch.start,
            texts: Vec::with_capacity(batch.len()),
            outcome: BatchOutcome::Translated,
            retries_used: 0,
            repaired_lines: 0,
            fallback_lines: 0,
        };

        let messages = self.prompts.build(&batch);
        let answer = match invoke_with_retry(&self.client, &messages, &self.config.retry, cancel).await {
            Ok(answer) => answer,
            Err(error) => {
                abort_or_continue(error, "Translation", &batch)?;
                result.outcome = BatchOutcome::Fallback;
                result.fallback_lines = batch.len();
                result.texts = sources.iter().map(|s| s.to_string()).collect();
                return Ok(result);
            }
        };
        result.retries_used = answer.retries;

        let mut resolved = ParsedResponse::parse(&answer.text).resolve(&ids);
        let echoed = apply_echo_guard(&mut resolved, &sources);
        if echoed > 0 {
            debug!("Batch at {}: {} echoed lines", batch.start + 1, echoed);
        }

        let missing: Vec<usize> = resolved
            .iter()
            .enumerate()
            .filter_map(|(position, text)| text.is_none().then_some(position))
            .collect();

        if !missing.is_empty() {
            result.outcome = BatchOutcome::Repaired;
            self.repair(&batch, &missing, &mut resolved, &mut result, cancel).await?;
        }

        for (text, source) in resolved.into_iter().zip(&sources) {
            match text {
                Some(text) => result.texts.push(text),
                None => {
                    result.fallback_lines += 1;
                    result.texts.push(source.to_string());
                }
            }
        }

        Ok(result)
    }

    /// Ask once more for the unresolved lines only.
    async fn repair(
        &self,
        batch: &Batch,
        missing: &[usize],
        resolved: &mut [Option<String>],
        result: &mut BatchResult,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let segments: Vec<&Segment> = missing.iter().map(|&p| &batch.segments[p]).collect();
        let ids: Vec<usize> = segments.iter().map(|s| s.index).collect();
        let sources: Vec<&str> = segments.iter().map(|s| s.original.as_str()).collect();

        debug!("Repairing {} lines of batch at {}", missing.len(), batch.start + 1);
        let messages = self.prompts.build_repair(&segments);

        let answer = match invoke_with_retry(&self.client, &messages, &self.config.retry, cancel).await {
            Ok(answer) => answer,
            Err(error) => return abort_or_continue(error, "Repair", batch),
        };
        result.retries_used += answer.retries;

        let mut repaired = ParsedResponse::parse(&answer.text).resolve(&ids);
        apply_echo_guard(&mut repaired, &sources);

        for (&position, text) in missing.iter().zip(repaired) {
            if text.is_some() {
                result.repaired_lines += 1;
                resolved[position] = text;
            }
        }

        Ok(())
    }

    /// Translate every segment.
    ///
    /// `on_progress(translated, total, partial)` fires after each finished batch
    /// with the transcript as it stands.
    ///
    /// A fatal error from any batch returns at once. Batches still in flight
    /// are dropped with the stream and their answers are never applied.
    pub async fn run<F>(
        &self,
        mut segments: Vec<Segment>,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<(Vec<Segment>, TranslationStats), PipelineError>
    where
        F: FnMut(usize, usize, &[Segment]),
    {
        reindex(&mut segments);
        let total = segments.len();
        let planner = BatchPlanner::disjoint(self.config.batch_size, self.config.context_size);
        let batches = planner.plan(&segments);
        let concurrency = self.config.concurrency.clamp(1, MAX_CONCURRENCY);

        let mut stats = TranslationStats {
            total_batches: batches.len(),
            ..Default::default()
        };
        info!(
            "Translating {} segments in {} batches ({} in flight)",
            total,
            batches.len(),
            concurrency
        );

        let mut results = stream::iter(batches)
            .map(|batch| self.translate_batch(batch, cancel))
            .buffer_unordered(concurrency);

        let mut translated = 0;
        while let Some(result) = results.next().await {
            // early return drops `results` and every pending batch with it
            let result = result?;

            for (offset, text) in result.texts.iter().enumerate() {
                segments[result.start + offset].translation = text.clone();
            }
            translated += result.texts.len();
            stats.record(&result);

            on_progress(translated, total, &segments);
        }

        if stats.fallback_lines > 0 {
            warn!(
                "{} of {} lines kept their source text",
                stats.fallback_lines,
                total
            );
        }

        Ok((segments, stats))
    }
}
