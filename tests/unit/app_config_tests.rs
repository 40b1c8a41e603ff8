/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;

use subweave::app_config::{Config, LogLevel, ProviderConfig, TranslationProvider};
use subweave::translation::PipelineConfig;
use crate::common;

/// Test default configuration values
#[test]
fn test_defaultConfig_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.log_level, LogLevel::Info);

    assert!(config.pipeline.enable_fusion);
    assert!(config.pipeline.enable_review);
    assert_eq!(config.pipeline.concurrency, 4);
    assert_eq!(config.pipeline.translate_batch_size, 10);
    assert_eq!(config.pipeline.review_batch_size, 20);
    assert_eq!(config.pipeline.review_step, 15);
    assert_eq!(config.translation.common.retry_count, 3);
    assert_eq!(config.translation.common.retry_backoff_ms, 1000);
}

/// Test configuration validation
#[test]
fn test_configValidation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();

    config.target_language = "".to_string();
    assert!(config.validate().is_err());
    config.target_language = "original".to_string();
    assert!(config.validate().is_ok());
    config.target_language = "fr".to_string();

    config.translation.provider = TranslationProvider::OpenAI;
    assert!(config.validate().is_err());
    config.translation.active_provider_config_mut().api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());

    config.pipeline.review_step = 0;
    assert!(config.validate().is_err());
    config.pipeline.review_step = 21;
    assert!(config.validate().is_err());
}

#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let json = r#"{
        "source_language": "en",
        "target_language": "ja",
        "translation": {
            "provider": "anthropic",
            "available_providers": [
                {"type": "anthropic", "model": "claude-test", "api_key": "key"}
            ]
        },
        "pipeline": {"enable_review": false, "concurrency": 2}
    }"#;
    let path = common::create_test_file(temp_dir.path(), "conf.json", json)?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.translation.provider, TranslationProvider::Anthropic);
    assert_eq!(config.translation.get_model(), "claude-test");
    assert!(!config.translation.get_endpoint().is_empty());
    assert!(!config.pipeline.enable_review);
    assert_eq!(config.pipeline.concurrency, 2);
    assert_eq!(config.pipeline.review_step, 15);
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_pipelineConfig_fromAppConfig_shouldShareRetryPolicy() {
    let mut config = Config::default();
    config.translation.common.retry_count = 5;
    config.pipeline.enable_fusion = false;

    let pipeline = PipelineConfig::from_app_config(&config);

    assert!(!pipeline.enable_fusion);
    assert_eq!(pipeline.translation_config.retry.max_attempts, 5);
    assert_eq!(pipeline.review_config.retry, pipeline.translation_config.retry);
    assert_eq!(pipeline.target_language, "fr");
}

#[test]
fn test_providerConfig_new_shouldCarryProviderDefaults() {
    let lmstudio = ProviderConfig::new(TranslationProvider::LMStudio);
    assert_eq!(lmstudio.provider_type, "lmstudio");
    assert!(lmstudio.endpoint.contains("1234"));

    assert!(TranslationProvider::OpenAI.requires_api_key());
    assert!(!TranslationProvider::Ollama.requires_api_key());
    assert_eq!("anthropic".parse::<TranslationProvider>().unwrap(), TranslationProvider::Anthropic);
}
