/*!
 * Integration tests for the file-to-file workflow through the controller
 */

use anyhow::Result;

use subweave::app_config::Config;
use subweave::app_controller::Controller;
use subweave::errors::{AppError, PipelineError};
use subweave::subtitle_processor::{CueTextMode, SegmentCollection};

use crate::common::{self, mock_providers};

fn controller(target_language: &str) -> Result<Controller> {
    let mut config = Config::default();
    config.target_language = target_language.to_string();
    Controller::with_config(config)
}

#[tokio::test]
async fn test_runWithClient_srtInput_shouldWriteDualCues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "talk.en.srt")?;
    let controller = controller("fr")?;

    let output = controller
        .run_with_client(
            &input,
            None,
            CueTextMode::Dual,
            false,
            mock_providers::client_for(mock_providers::translate_and_review("[fr]")),
        )
        .await?;

    assert_eq!(output, temp_dir.path().join("talk.fr.srt"));
    let written = std::fs::read_to_string(&output)?;
    assert!(written.starts_with("1\n00:00:01,000 --> 00:00:04,000\nrev 1\nThis is a test subtitle.\n"));
    assert_eq!(controller.registry().active_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_runWithClient_jsonOutput_shouldKeepTimingAndTranslations() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "talk.srt")?;
    let output = temp_dir.path().join("talk.fr.json");
    let controller = controller("fr")?;

    controller
        .run_with_client(
            &input,
            Some(&output),
            CueTextMode::Translation,
            false,
            mock_providers::client_for(mock_providers::translate_and_review("[fr]")),
        )
        .await?;

    let loaded = SegmentCollection::load(&output)?;
    assert_eq!(loaded.segments.len(), 3);
    assert_eq!(loaded.segments[1].start, 5.0);
    assert_eq!(loaded.segments[1].original, "It contains multiple entries.");
    assert_eq!(loaded.segments[1].translation, "rev 2");
    Ok(())
}

#[tokio::test]
async fn test_runWithClient_existingOutputWithoutForce_shouldRefuse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "talk.en.srt")?;
    common::create_test_file(temp_dir.path(), "talk.fr.srt", "keep me")?;
    let controller = controller("fr")?;

    let result = controller
        .run_with_client(
            &input,
            None,
            CueTextMode::Translation,
            false,
            mock_providers::client_for(mock_providers::translate_and_review("[fr]")),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(std::fs::read_to_string(temp_dir.path().join("talk.fr.srt"))?, "keep me");
    Ok(())
}

#[tokio::test]
async fn test_runWithClient_creditsExhausted_shouldFailWithoutWriting() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "talk.en.srt")?;
    let controller = controller("fr")?;

    let error = controller
        .run_with_client(
            &input,
            None,
            CueTextMode::Translation,
            false,
            mock_providers::client_for(mock_providers::credits_run_out_at(1)),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        error.downcast_ref::<AppError>(),
        Some(AppError::Pipeline(PipelineError::InsufficientCredits(_)))
    ));
    assert!(!temp_dir.path().join("talk.fr.srt").exists());
    assert_eq!(controller.registry().active_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_runWithClient_originalTarget_shouldCopyCuesWithoutModelCalls() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "talk.srt")?;
    let mock = mock_providers::translate_and_review("[fr]");
    let counter = mock.request_counter();
    let controller = controller("original")?;

    let output = controller
        .run_with_client(&input, None, CueTextMode::Translation, false, mock_providers::client_for(mock))
        .await?;

    assert_eq!(output, temp_dir.path().join("talk.original.srt"));
    let written = std::fs::read_to_string(&output)?;
    assert!(written.contains("For testing purposes."));
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
    Ok(())
}
