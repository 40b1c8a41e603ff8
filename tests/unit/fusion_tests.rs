/*!
 * Tests for orphan fusion and word timing normalisation
 */

use subweave::subtitle_processor::{Segment, WordTiming};
use subweave::translation::fusion::{FusionConfig, OrphanFuser};
use subweave::translation::word_timing::{normalize_word_timings, word_times_are_absolute};

fn word(text: &str, start: f64, end: f64) -> WordTiming {
    WordTiming { word: text.to_string(), start, end }
}

#[test]
fn test_fuse_shortTrailingWord_shouldJoinPreviousCue() {
    let segments = vec![
        Segment::new(1, 0.0, 0.7, "Hi. "),
        Segment::new(2, 0.7, 1.5, "there"),
    ];

    let (fused, stats) = OrphanFuser::default().fuse(segments);

    assert_eq!(stats.merged, 1);
    assert_eq!(fused.len(), 1);
    assert_eq!(fused[0].original, "Hi. there");
    assert_eq!(fused[0].start, 0.0);
    assert_eq!(fused[0].end, 1.5);
    assert_eq!(fused[0].index, 1);
}

#[test]
fn test_fuse_largeGap_shouldKeepCuesApart() {
    let segments = vec![
        Segment::new(1, 0.0, 1.0, "Are you coming?"),
        Segment::new(2, 3.0, 3.5, "Yes."),
    ];

    let (fused, stats) = OrphanFuser::default().fuse(segments);

    assert_eq!(stats.merged, 0);
    assert_eq!(fused.len(), 2);
}

#[test]
fn test_fuse_mergedTooLong_shouldKeepCuesApart() {
    let config = FusionConfig { max_duration_secs: 2.0, ..FusionConfig::default() };
    let segments = vec![
        Segment::new(1, 0.0, 1.8, "We should leave now"),
        Segment::new(2, 1.9, 2.6, "okay"),
    ];

    let (fused, _) = OrphanFuser::new(config).fuse(segments);

    assert_eq!(fused.len(), 2);
    assert_eq!(fused[1].index, 2);
}

#[test]
fn test_fuse_shouldConcatenateWordTimings() {
    let segments = vec![
        Segment::new(1, 10.0, 11.0, "Good morning").with_words(vec![word("Good", 10.0, 10.4), word("morning", 10.4, 11.0)]),
        Segment::new(2, 11.1, 11.6, "everyone").with_words(vec![word("everyone", 11.1, 11.6)]),
    ];

    let (fused, _) = OrphanFuser::default().fuse(segments);

    let words = fused[0].words.as_ref().unwrap();
    let texts: Vec<&str> = words.iter().map(|w| w.word.as_str()).collect();
    assert_eq!(texts, vec!["Good", "morning", "everyone"]);
}

#[test]
fn test_normalizeWordTimings_relativeTimes_shouldBecomeAbsolute() {
    let mut segments = vec![
        Segment::new(1, 30.0, 32.0, "Relative times").with_words(vec![word("Relative", 0.0, 0.8), word("times", 0.9, 1.6)]),
        Segment::new(2, 40.0, 41.0, "Absolute").with_words(vec![word("Absolute", 40.1, 40.9)]),
    ];
    assert!(!word_times_are_absolute(&segments[0]));
    assert!(word_times_are_absolute(&segments[1]));

    let rebased = normalize_word_timings(&mut segments);

    assert_eq!(rebased, 1);
    let words = segments[0].words.as_ref().unwrap();
    assert_eq!(words[0].start, 30.0);
    assert!((words[1].end - 31.6).abs() < 1e-9);
    assert_eq!(segments[1].words.as_ref().unwrap()[0].start, 40.1);
}
