/*!
 * Tests for model response parsing and batch planning
 */

use subweave::subtitle_processor::Segment;
use subweave::translation::batch::BatchPlanner;
use subweave::translation::parser::{apply_echo_guard, parse_review, ParsedResponse, ReviewParseError};

fn segments(count: usize) -> Vec<Segment> {
    (1..=count)
        .map(|i| Segment::new(i, i as f64, i as f64 + 0.9, format!("line {}", i)))
        .collect()
}

#[test]
fn test_resolve_markerLineThenBareLine_shouldMapBothIds() {
    let planner = BatchPlanner::disjoint(2, 0);
    let batch = planner.batch_at(&segments(4), 2);
    assert_eq!(batch.ids(), vec![3, 4]);

    let resolved = ParsedResponse::parse("@@SUB_LINE@@ 3: foo\nbar").resolve(&batch.ids());

    assert_eq!(resolved, vec![Some("foo".to_string()), Some("bar".to_string())]);
}

#[test]
fn test_resolve_withChattyWrapper_shouldStillFindIds() {
    let raw = "Sure! Here are the translations:\n```\n@@SUB_LINE@@ 1: Bonjour\nLine 2: Au revoir\n```";

    let resolved = ParsedResponse::parse(raw).resolve(&[1, 2]);

    assert_eq!(resolved, vec![Some("Bonjour".to_string()), Some("Au revoir".to_string())]);
}

#[test]
fn test_resolve_missingLine_shouldLeaveGapForRepair() {
    let resolved = ParsedResponse::parse("1: un\n3: trois").resolve(&[1, 2, 3, 4]);

    assert_eq!(resolved[0].as_deref(), Some("un"));
    assert_eq!(resolved[1], None);
    assert_eq!(resolved[2].as_deref(), Some("trois"));
    assert_eq!(resolved[3], None);
}

#[test]
fn test_echoGuard_sourceCopiedBack_shouldNotCountAsTranslation() {
    let mut resolved = vec![Some("Hello".to_string()), Some("Salut".to_string()), Some("World".to_string())];

    let replaced = apply_echo_guard(&mut resolved, &["Hello", "Hi", "World"]);

    assert_eq!(replaced, 2);
    assert_eq!(resolved, vec![None, Some("Salut".to_string()), Some("Salut".to_string())]);
}

#[test]
fn test_parseReview_ninetyPercentCoverage_shouldBeAccepted() {
    let ids: Vec<usize> = (1..=10).collect();
    let raw: String = (1..=9).map(|id| format!("@@SUB_LINE@@ {}: text {}\n", id, id)).collect();

    let answers = parse_review(&raw, &ids).unwrap();

    assert_eq!(answers.len(), 9);
}

#[test]
fn test_parseReview_seventyPercentCoverage_shouldBeRejected() {
    let ids: Vec<usize> = (1..=10).collect();
    let raw: String = (1..=7).map(|id| format!("@@SUB_LINE@@ {}: text {}\n", id, id)).collect();

    assert_eq!(
        parse_review(&raw, &ids),
        Err(ReviewParseError::LowCoverage { covered: 7, expected: 10 })
    );
}

#[test]
fn test_planner_overlappingWindows_shouldStopAtEnd() {
    let planner = BatchPlanner::overlapping(20, 15, 5);

    assert_eq!(planner.offsets(50), vec![0, 15, 30]);
    assert_eq!(planner.offsets(20), vec![0]);
    assert!(planner.offsets(0).is_empty());
}

#[test]
fn test_planner_disjointBatches_shouldCarryContext() {
    let planner = BatchPlanner::disjoint(3, 2);
    let batches = planner.plan(&segments(7));

    assert_eq!(batches.len(), 3);
    assert_eq!(batches[1].ids(), vec![4, 5, 6]);
    assert_eq!(batches[1].context_before.len(), 2);
    assert_eq!(batches[1].context_after.len(), 1);
    assert_eq!(batches[2].ids(), vec![7]);
    assert!(batches[2].context_after.is_empty());
}
