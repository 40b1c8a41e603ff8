/*!
 * Integration tests for the translation pipeline against scripted providers
 */

use parking_lot::Mutex;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use subweave::errors::{PipelineError, ProviderError};
use subweave::providers::mock::{last_user_message, requested_lines, tagged_answer, MockProvider};
use subweave::subtitle_processor::Segment;
use subweave::translation::pipeline::{PipelineProgress, PipelineStage};
use subweave::translation::{PipelineConfig, RetryPolicy, TranslationPipeline};

use crate::common::{self, mock_providers};

/// Small disjoint batches, no review or fusion, one batch in flight
fn sequential_config(batch_size: usize) -> PipelineConfig {
    let mut config = PipelineConfig::new("en", "fr")
        .with_review(false)
        .with_fusion(false)
        .with_concurrency(1)
        .with_retry(RetryPolicy::new(3, Duration::from_millis(10)));
    config.translation_config.batch_size = batch_size;
    config
}

#[tokio::test]
async fn test_run_originalTarget_shouldReturnInputWithSingleProgressEvent() {
    let mock = mock_providers::translate_and_review("[fr]");
    let counter = mock.request_counter();
    let pipeline = TranslationPipeline::new(PipelineConfig::new("en", "original"), mock_providers::client_for(mock));
    let events = Mutex::new(Vec::new());
    let sink = |progress: PipelineProgress| events.lock().push((progress.percent, progress.stage));
    let input = common::sample_segments(12);

    let result = pipeline.run(input.clone(), &CancellationToken::new(), Some(&sink)).await.unwrap();

    assert_eq!(result.segments, input);
    assert_eq!(events.into_inner(), vec![(100.0, PipelineStage::Final)]);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_run_fullPipeline_shouldTranslateEverySegmentInOrder() {
    common::init_logging();
    let pipeline = TranslationPipeline::new(
        PipelineConfig::new("en", "fr"),
        mock_providers::client_for(mock_providers::translate_and_review("[fr]")),
    );

    let result = pipeline
        .run(common::sample_segments(25), &CancellationToken::new(), None)
        .await
        .unwrap();

    assert_eq!(result.segments.len(), 25);
    for (position, segment) in result.segments.iter().enumerate() {
        assert_eq!(segment.index, position + 1);
        assert_eq!(segment.translation, format!("rev {}", position + 1));
        assert!(segment.reviewed_in_batch.is_some());
    }
    assert!(result.segments.windows(2).all(|pair| pair[0].start < pair[1].start));

    let review = result.review_stats.unwrap();
    assert_eq!(review.total_batches, 2);
    assert_eq!(review.applied_batches, 2);
    assert_eq!(result.translation_stats.unwrap().total_batches, 3);
}

#[tokio::test]
async fn test_run_translationOnly_shouldCoverEverySegment() {
    let pipeline = TranslationPipeline::new(
        sequential_config(4),
        mock_providers::client_for(MockProvider::translating("[fr]")),
    );

    let result = pipeline
        .run(common::sample_segments(9), &CancellationToken::new(), None)
        .await
        .unwrap();

    assert!(result.segments.iter().all(Segment::has_translation));
    assert_eq!(result.segments[8].translation, "[fr] This is spoken sentence number 9.");
    assert!(result.review_stats.is_none());
}

#[tokio::test]
async fn test_run_fusionEnabled_shouldMergeOrphanBeforeTranslating() {
    let config = PipelineConfig::new("en", "fr").with_review(false);
    let pipeline = TranslationPipeline::new(
        config,
        mock_providers::client_for(MockProvider::translating("[fr]")),
    );
    let input = vec![
        Segment::new(1, 0.0, 0.7, "Hi. "),
        Segment::new(2, 0.7, 1.5, "there"),
    ];

    let result = pipeline.run(input, &CancellationToken::new(), None).await.unwrap();

    assert_eq!(result.segments.len(), 1);
    assert_eq!(result.segments[0].original, "Hi. there");
    assert_eq!(result.segments[0].translation, "[fr] Hi. there");
    assert_eq!(result.fusion_stats.unwrap().merged, 1);
}

#[tokio::test]
async fn test_run_markerThenBareLine_shouldResolveByPosition() {
    let mock = MockProvider::new(|messages, _| {
        let prompt = last_user_message(messages);
        if requested_lines(prompt).iter().any(|(id, _)| *id == 3) {
            Ok("@@SUB_LINE@@ 3: foo\nbar".to_string())
        } else {
            Ok(tagged_answer(prompt, "[fr]"))
        }
    });
    let counter = mock.request_counter();
    let pipeline = TranslationPipeline::new(sequential_config(2), mock_providers::client_for(mock));

    let result = pipeline
        .run(common::sample_segments(4), &CancellationToken::new(), None)
        .await
        .unwrap();

    assert_eq!(result.segments[2].translation, "foo");
    assert_eq!(result.segments[3].translation, "bar");
    // no repair call was needed
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_twoTransientFailures_shouldBackOffThenSucceed() {
    let mock = MockProvider::scripted(vec![
        Err(ProviderError::Timeout("request timed out".into())),
        Err(ProviderError::ConnectionError("connection reset".into())),
        Ok("@@SUB_LINE@@ 1: un\n@@SUB_LINE@@ 2: deux\n@@SUB_LINE@@ 3: trois".into()),
    ]);
    let counter = mock.request_counter();
    let config = sequential_config(10).with_retry(RetryPolicy::new(3, Duration::from_millis(1000)));
    let pipeline = TranslationPipeline::new(config, mock_providers::client_for(mock));
    let started = Instant::now();

    let result = pipeline
        .run(common::sample_segments(3), &CancellationToken::new(), None)
        .await
        .unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert_eq!(started.elapsed(), Duration::from_millis(3000));
    let texts: Vec<&str> = result.segments.iter().map(|s| s.translation.as_str()).collect();
    assert_eq!(texts, vec!["un", "deux", "trois"]);
    assert_eq!(result.translation_stats.unwrap().total_retries, 2);
}

#[tokio::test]
async fn test_run_creditsExhaustedOnSecondBatch_shouldAbortWithoutLaterCalls() {
    let mock = mock_providers::credits_run_out_at(3);
    let counter = mock.request_counter();
    let pipeline = TranslationPipeline::new(sequential_config(2), mock_providers::client_for(mock));

    let result = pipeline
        .run(common::sample_segments(10), &CancellationToken::new(), None)
        .await;

    assert_eq!(result.unwrap_err(), PipelineError::InsufficientCredits("balance is zero".to_string()));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_run_cancelAfterFirstBatch_shouldStopWithCancellation() {
    let mock = MockProvider::translating("[fr]");
    let counter = mock.request_counter();
    let pipeline = TranslationPipeline::new(sequential_config(2), mock_providers::client_for(mock));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let sink = move |progress: PipelineProgress| {
        if progress.stage == PipelineStage::Translate && progress.partial.is_some() {
            trigger.cancel();
        }
    };

    let result = pipeline.run(common::sample_segments(10), &cancel, Some(&sink)).await;

    assert_eq!(result.unwrap_err(), PipelineError::Cancelled);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_run_providerAlwaysFailing_shouldDegradeToSourceText() {
    let pipeline = TranslationPipeline::new(
        PipelineConfig::new("en", "fr").with_retry(RetryPolicy::new(1, Duration::from_millis(1))),
        mock_providers::client_for(MockProvider::failing(ProviderError::AuthenticationError("bad key".into()))),
    );
    let input = common::sample_segments(5);

    let result = pipeline.run(input.clone(), &CancellationToken::new(), None).await.unwrap();

    for (segment, source) in result.segments.iter().zip(&input) {
        assert_eq!(segment.translation, source.original);
    }
    let translation = result.translation_stats.unwrap();
    assert_eq!(translation.fallback_lines, 5);
    assert_eq!(result.review_stats.unwrap().failed_batches, 1);
}

#[tokio::test]
async fn test_run_withReview_progressShouldClimbThroughEveryStage() {
    let mut config = PipelineConfig::new("en", "fr");
    config.translation_config.batch_size = 3;
    config.review_config.batch_size = 4;
    config.review_config.step = 3;
    let pipeline = TranslationPipeline::new(
        config,
        mock_providers::client_for(mock_providers::translate_and_review("[fr]")),
    );
    let events = Mutex::new(Vec::new());
    let sink = |progress: PipelineProgress| events.lock().push((progress.percent, progress.stage));

    pipeline
        .run(common::sample_segments(12), &CancellationToken::new(), Some(&sink))
        .await
        .unwrap();

    let events = events.into_inner();
    assert!(events.windows(2).all(|pair| pair[0].0 <= pair[1].0));
    assert_eq!(events.first().map(|e| e.0), Some(0.0));
    assert_eq!(events.last(), Some(&(100.0, PipelineStage::Final)));
    assert!(events.iter().any(|e| e.1 == PipelineStage::Review && e.0 == 70.0));
    assert!(events.iter().all(|e| e.1 != PipelineStage::Review || e.0 >= 70.0));
}
