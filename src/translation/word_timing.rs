/*!
 * Word-timestamp normalisation.
 *
 * Transcribers disagree on whether word timestamps are measured from the start
 * of the media or from the start of their segment. The pipeline keeps them
 * absolute so fusion can concatenate word lists without re-basing.
 */

use log::debug;

use crate::subtitle_processor::Segment;

/// Slack (seconds) allowed around a segment span when classifying word times.
pub const WORD_TIME_TOLERANCE_SECS: f64 = 0.5;

/// Decide whether a segment's word timestamps are absolute media times.
///
/// Counts the word starts that fall inside the segment's absolute window and
/// those that fall inside the relative window `[0, duration]`. Absolute wins
/// ties, which covers segments starting near zero where both readings agree.
pub fn word_times_are_absolute(segment: &Segment) -> bool {
    let Some(words) = segment.words.as_deref() else {
        return true;
    };

    let tolerance = WORD_TIME_TOLERANCE_SECS;
    let duration = segment.end - segment.start;

    let (absolute_hits, relative_hits) = words.iter().fold((0usize, 0usize), |(abs, rel), word| {
        let in_absolute = word.start >= segment.start - tolerance && word.start <= segment.end + tolerance;
        let in_relative = word.start >= -tolerance && word.start <= duration + tolerance;
        (abs + in_absolute as usize, rel + in_relative as usize)
    });

    absolute_hits >= relative_hits
}

/// Rewrite word timestamps to absolute times, clamped into the segment span.
pub fn normalize_word_timings(segments: &mut [Segment]) -> usize {
    let mut rebased = 0;

    for segment in segments.iter_mut() {
        let offset = if word_times_are_absolute(segment) { 0.0 } else { segment.start };
        if offset != 0.0 {
            rebased += 1;
        }

        let (start, end) = (segment.start, segment.end.max(segment.start));
        if let Some(words) = segment.words.as_mut() {
            for word in words.iter_mut() {
                word.start = (word.start + offset).max(start).min(end);
                word.end = (word.end + offset).max(word.start).min(end);
            }
        }
    }

    if rebased > 0 {
        debug!("Rebased relative word timings in {} segments", rebased);
    }
    rebased
}

/// Drop word timings everywhere.
pub fn strip_word_timings(segments: &mut [Segment]) {
    for segment in segments.iter_mut() {
        segment.words = None;
    }
}
