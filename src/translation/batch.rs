/*!
 * Batch planning.
 *
 * Splits a segment sequence into contiguous batches, each carrying read-only
 * context windows on both sides. Translation uses disjoint batches
 * (`step == batch_size`); review uses overlapping windows (`step < batch_size`).
 */

use crate::subtitle_processor::Segment;

/// Owned snapshot of one batch and its surrounding context.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Offset of the first batch segment in the full sequence
    pub start: usize,

    /// Segments whose output this batch produces
    pub segments: Vec<Segment>,

    /// Segments immediately before the batch, for prompting only
    pub context_before: Vec<Segment>,

    /// Segments immediately after the batch, for prompting only
    pub context_after: Vec<Segment>,
}

impl Batch {
    /// Offset one past the last batch segment
    pub fn end(&self) -> usize {
        self.start + self.segments.len()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment indices in batch order
    pub fn ids(&self) -> Vec<usize> {
        self.segments.iter().map(|s| s.index).collect()
    }
}

/// Partitioning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlanner {
    pub batch_size: usize,
    pub step: usize,
    pub context_size: usize,
}

impl BatchPlanner {
    /// Planner for the translate stage: disjoint batches.
    pub fn disjoint(batch_size: usize, context_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self { batch_size, step: batch_size, context_size }
    }

    /// Planner for the review stage: windows advancing by `step`.
    pub fn overlapping(batch_size: usize, step: usize, context_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            step: step.clamp(1, batch_size),
            context_size,
        }
    }

    /// Batch start offsets for a sequence of `total` segments.
    ///
    /// Planning stops once a batch reaches the end of the sequence, so an
    /// overlapping plan never emits a window fully contained in the previous one.
    pub fn offsets(&self, total: usize) -> Vec<usize> {
        let mut offsets = Vec::new();
        let mut offset = 0;

        while offset < total {
            offsets.push(offset);
            if offset + self.batch_size >= total {
                break;
            }
            offset += self.step;
        }

        offsets
    }

    /// Snapshot the batch starting at `offset`.
    pub fn batch_at(&self, segments: &[Segment], offset: usize) -> Batch {
        let total = segments.len();
        let start = offset.min(total);
        let end = (start + self.batch_size).min(total);
        let before = start.saturating_sub(self.context_size);
        let after = (end + self.context_size).min(total);

        Batch {
            start,
            segments: segments[start..end].to_vec(),
            context_before: segments[before..start].to_vec(),
            context_after: segments[end..after].to_vec(),
        }
    }

    /// Snapshot every batch of the plan.
    pub fn plan(&self, segments: &[Segment]) -> Vec<Batch> {
        self.offsets(segments.len())
            .into_iter()
            .map(|offset| self.batch_at(segments, offset))
            .collect()
    }
}
