use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

use crate::language_utils;
use crate::translation::fusion::FusionConfig;

/// Application configuration module
/// This module handles loading, validating and saving the `conf.json` settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO, or "original" for pass-through)
    pub target_language: String,

    /// Translation config
    pub translation: TranslationConfig,

    /// Pipeline stage settings
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: OpenAI
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    // @returns: Whether requests must carry an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::Anthropic)
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Per-attempt timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Completion token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        let (model, endpoint, timeout_secs) = match provider_type {
            TranslationProvider::Ollama => (default_ollama_model(), default_ollama_endpoint(), default_timeout_secs()),
            TranslationProvider::OpenAI => (default_openai_model(), default_openai_endpoint(), default_timeout_secs()),
            TranslationProvider::Anthropic => (default_anthropic_model(), default_anthropic_endpoint(), default_anthropic_timeout_secs()),
            TranslationProvider::LMStudio => (default_lmstudio_model(), default_lmstudio_endpoint(), default_timeout_secs()),
        };

        Self {
            provider_type: provider_type.to_lowercase_string(),
            model,
            api_key: String::new(),
            endpoint,
            timeout_secs,
            max_tokens: default_max_tokens(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Total attempts per model call, first try included
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Stage toggles and batch geometry for the translation pipeline
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineSettings {
    /// Merge short orphan cues before translation
    #[serde(default = "default_true")]
    pub enable_fusion: bool,

    /// Run the review stage after translation
    #[serde(default = "default_true")]
    pub enable_review: bool,

    /// Keep and normalise per-word timestamps
    #[serde(default = "default_true")]
    pub enable_word_timings: bool,

    /// Translate batches in flight at once (1 to 4)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Segments per translate batch
    #[serde(default = "default_translate_batch_size")]
    pub translate_batch_size: usize,

    /// Read-only neighbours shown on each side of a translate batch
    #[serde(default = "default_translate_context_size")]
    pub translate_context_size: usize,

    /// Segments per review window
    #[serde(default = "default_review_batch_size")]
    pub review_batch_size: usize,

    /// Offset between consecutive review windows
    #[serde(default = "default_review_step")]
    pub review_step: usize,

    /// Read-only neighbours shown on each side of a review window
    #[serde(default = "default_review_context_size")]
    pub review_context_size: usize,

    /// Orphan fusion thresholds
    #[serde(default)]
    pub fusion: FusionConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            enable_fusion: true,
            enable_review: true,
            enable_word_timings: true,
            concurrency: default_concurrency(),
            translate_batch_size: default_translate_batch_size(),
            translate_context_size: default_translate_context_size(),
            review_batch_size: default_review_batch_size(),
            review_step: default_review_step(),
            review_context_size: default_review_context_size(),
            fusion: FusionConfig::default(),
        }
    }
}

/// Upper bound on concurrently running translate batches
pub const MAX_CONCURRENCY: usize = 4;

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Map onto the `log` crate filter
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_anthropic_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    MAX_CONCURRENCY
}

fn default_translate_batch_size() -> usize {
    10
}

fn default_translate_context_size() -> usize {
    12
}

fn default_review_batch_size() -> usize {
    20
}

fn default_review_step() -> usize {
    15
}

fn default_review_context_size() -> usize {
    5
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_lmstudio_endpoint() -> String {
    // LM Studio serves the OpenAI-compatible API on port 1234 under /v1
    "http://localhost:1234/v1".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_lmstudio_model() -> String {
    "local-model".to_string()
}

impl Config {
    /// Load the config file, or write a default one when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            return serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()));
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        language_utils::get_language_name(&self.source_language)
            .context("Invalid source language")?;

        if !language_utils::is_original_target(&self.target_language) {
            language_utils::get_language_name(&self.target_language)
                .context("Invalid target language")?;
        }

        if self.translation.provider.requires_api_key() && self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider",
                self.translation.provider.display_name()
            ));
        }

        let endpoint = self.translation.get_endpoint();
        if !endpoint.is_empty() {
            parse_endpoint(&endpoint)
                .with_context(|| format!("Invalid endpoint for {} provider", self.translation.provider.display_name()))?;
        }

        if self.translation.common.retry_count == 0 {
            return Err(anyhow!("retry_count must be at least 1"));
        }

        let pipeline = &self.pipeline;
        if pipeline.concurrency == 0 || pipeline.concurrency > MAX_CONCURRENCY {
            return Err(anyhow!("concurrency must be between 1 and {}", MAX_CONCURRENCY));
        }
        if pipeline.translate_batch_size == 0 {
            return Err(anyhow!("translate_batch_size must be at least 1"));
        }
        if pipeline.review_step == 0 || pipeline.review_step > pipeline.review_batch_size {
            return Err(anyhow!(
                "review_step must be between 1 and review_batch_size ({})",
                pipeline.review_batch_size
            ));
        }
        if pipeline.fusion.min_duration_secs > pipeline.fusion.max_duration_secs {
            return Err(anyhow!("fusion min_duration_secs exceeds max_duration_secs"));
        }

        Ok(())
    }
}

/// Parse a provider endpoint, assuming http when no scheme is given.
pub fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    if url.host_str().is_none() {
        return Err(anyhow!("Invalid host in endpoint: {}", endpoint));
    }

    Ok(url)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "fr".to_string(),
            translation: TranslationConfig::default(),
            pipeline: PipelineSettings::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access used by CLI overrides
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let position = self.available_providers.iter()
            .position(|p| p.provider_type == provider_str);

        match position {
            Some(index) => &mut self.available_providers[index],
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider.clone()));
                let last = self.available_providers.len() - 1;
                &mut self.available_providers[last]
            }
        }
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.model.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| ProviderConfig::new(self.provider.clone()).model)
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.endpoint.clone())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| ProviderConfig::new(self.provider.clone()).endpoint)
    }

    /// Get the per-attempt timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|t| *t > 0)
            .unwrap_or_else(default_timeout_secs)
    }

    /// Get the completion token cap for the active provider
    pub fn get_max_tokens(&self) -> u32 {
        self.get_active_provider_config()
            .map(|p| p.max_tokens)
            .filter(|t| *t > 0)
            .unwrap_or_else(default_max_tokens)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::Ollama),
                ProviderConfig::new(TranslationProvider::OpenAI),
                ProviderConfig::new(TranslationProvider::Anthropic),
                ProviderConfig::new(TranslationProvider::LMStudio),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
