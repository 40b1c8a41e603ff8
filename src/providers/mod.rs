/*!
 * Model invocation layer.
 *
 * Every backend implements [`Provider`]: one attempt, role-tagged chat messages
 * in, raw completion text out. [`ModelClient`] wraps a provider with the
 * per-attempt timeout and the run's cancellation token. Retrying lives one level
 * up in `translation::retry`.
 *
 * Backends:
 * - `ollama`: local Ollama chat API
 * - `openai`: OpenAI-compatible chat completions (OpenAI, LM Studio)
 * - `anthropic`: Anthropic messages API
 * - `mock`: scripted provider for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;

pub mod ollama;
pub mod openai;
pub mod anthropic;
pub mod mock;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message of a model conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Common trait for all LLM providers
///
/// Implementations perform exactly one request and map failures onto
/// [`ProviderError`]; they never retry.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Send the conversation and return the completion text
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Provider handle bound to a per-attempt timeout and cancellation
#[derive(Debug, Clone)]
pub struct ModelClient {
    provider: Arc<dyn Provider>,
    timeout: Duration,
}

impl ModelClient {
    pub fn new(provider: Arc<dyn Provider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run a single attempt.
    ///
    /// Cancellation wins over an in-flight request, and a request that finishes
    /// after the token fired is still reported as cancelled.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.provider.complete(messages)) => result,
        };

        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        match outcome {
            Ok(Ok(text)) if text.trim().is_empty() => Err(ProviderError::EmptyResponse),
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "{} did not answer within {:?}",
                self.provider.name(),
                self.timeout
            ))),
        }
    }
}

/// Build the configured backend
pub fn build_provider(config: &TranslationConfig) -> Arc<dyn Provider> {
    let model = config.get_model();
    let endpoint = config.get_endpoint();
    let temperature = config.common.temperature;
    let max_tokens = config.get_max_tokens();

    match config.provider {
        TranslationProvider::Ollama => Arc::new(
            ollama::Ollama::new(endpoint, model).with_temperature(temperature),
        ),
        TranslationProvider::OpenAI | TranslationProvider::LMStudio => Arc::new(
            openai::OpenAI::new(endpoint, config.get_api_key(), model)
                .with_temperature(temperature)
                .with_max_tokens(max_tokens),
        ),
        TranslationProvider::Anthropic => Arc::new(
            anthropic::Anthropic::new(config.get_api_key(), endpoint, model)
                .with_temperature(temperature)
                .with_max_tokens(max_tokens),
        ),
    }
}

/// Build a [`ModelClient`] around the configured backend
pub fn build_client(config: &TranslationConfig) -> ModelClient {
    ModelClient::new(
        build_provider(config),
        Duration::from_secs(config.get_timeout_secs()),
    )
}
