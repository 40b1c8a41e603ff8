/*!
 * Orphan fusion.
 *
 * Short cues ("orphans") that follow closely on the previous cue are folded
 * into it when the merged cue still reads comfortably. Only source text and
 * timing are touched; translations are produced later.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::subtitle_processor::{reindex, Segment};

/// Thresholds for deciding whether an orphan may be merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Segments with fewer words than this are orphan candidates
    pub min_words: usize,

    /// Largest gap (seconds) between the previous cue's end and the orphan's start
    pub max_gap_secs: f64,

    /// Merged cue must last at least this long
    pub min_duration_secs: f64,

    /// Merged cue must not last longer than this
    pub max_duration_secs: f64,

    /// Merged text length cap, in characters
    pub max_chars: usize,

    /// Merged reading speed cap, in characters per second
    pub max_cps: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            min_words: 4,
            max_gap_secs: 0.8,
            min_duration_secs: 1.0,
            max_duration_secs: 7.0,
            max_chars: 84,
            max_cps: 20.0,
        }
    }
}

/// Counts from one fusion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionStats {
    pub input_segments: usize,
    pub merged: usize,
}

/// Join two cue texts, adding a space only between two word characters.
pub fn join_text(left: &str, right: &str) -> String {
    let needs_space = matches!(
        (left.chars().last(), right.chars().next()),
        (Some(l), Some(r)) if l.is_alphanumeric() && r.is_alphanumeric()
    );

    let mut joined = String::with_capacity(left.len() + right.len() + 1);
    joined.push_str(left);
    if needs_space {
        joined.push(' ');
    }
    joined.push_str(right);
    joined
}

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Visible characters; line breaks do not count toward reading load.
pub fn display_chars(text: &str) -> usize {
    text.chars().filter(|c| *c != '\n' && *c != '\r').count()
}

/// Fuser for orphan segments.
#[derive(Debug, Clone, Default)]
pub struct OrphanFuser {
    config: FusionConfig,
}

impl OrphanFuser {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    fn is_orphan(&self, previous: &Segment, current: &Segment) -> bool {
        word_count(&current.original) < self.config.min_words
            && current.start - previous.end < self.config.max_gap_secs
    }

    /// Build the merged cue if it passes every readability gate.
    fn try_merge(&self, previous: &Segment, current: &Segment) -> Option<Segment> {
        let start = previous.start;
        let end = current.end.max(previous.end);
        let duration = end - start;
        let text = join_text(&previous.original, &current.original);
        let chars = display_chars(&text);

        if duration < self.config.min_duration_secs || duration > self.config.max_duration_secs {
            return None;
        }
        if chars > self.config.max_chars {
            return None;
        }
        if chars as f64 / duration > self.config.max_cps {
            return None;
        }

        let mut merged = Segment::new(previous.index, start, end, text);
        merged.translation = previous.translation.clone();
        merged.words = match (&previous.words, &current.words) {
            (None, None) => None,
            (left, right) => Some(
                left.iter()
                    .flatten()
                    .chain(right.iter().flatten())
                    .cloned()
                    .collect(),
            ),
        };

        Some(merged)
    }

    /// Fuse orphans left to right; the output is re-indexed and never longer than the input.
    pub fn fuse(&self, segments: Vec<Segment>) -> (Vec<Segment>, FusionStats) {
        let mut stats = FusionStats {
            input_segments: segments.len(),
            merged: 0,
        };
        let mut kept: Vec<Segment> = Vec::with_capacity(segments.len());

        for current in segments {
            let merged = kept
                .last()
                .filter(|previous| self.is_orphan(previous, &current))
                .and_then(|previous| self.try_merge(previous, &current));

            match merged {
                Some(merged) => {
                    debug!("Fused orphan cue {} into {}", current.index, merged.index);
                    if let Some(last) = kept.last_mut() {
                        *last = merged;
                    }
                    stats.merged += 1;
                }
                None => kept.push(current),
            }
        }

        reindex(&mut kept);
        (kept, stats)
    }
}
