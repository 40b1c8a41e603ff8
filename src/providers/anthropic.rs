use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{ChatMessage, Provider, Role};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic client for the messages API
#[derive(Debug)]
pub struct Anthropic {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (empty means the public API)
    endpoint: String,
    /// Model name
    model: String,
    /// Sampling temperature
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
pub struct AnthropicRequest<'a> {
    /// The model to use
    model: &'a str,

    /// The non-system messages of the conversation
    messages: Vec<AnthropicMessage<'a>>,

    /// System prompt, joined from every system message
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Serialize)]
pub struct AnthropicMessage<'a> {
    /// Role of the message sender (user, assistant)
    pub role: Role,

    /// Content of the message
    pub content: &'a str,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens
    pub input_tokens: u32,
    /// Number of output tokens
    pub output_tokens: u32,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    /// The content of the response
    pub content: Vec<AnthropicContent>,
    /// Token usage information
    pub usage: Option<TokenUsage>,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicContent {
    /// The type of content
    #[serde(rename = "type")]
    pub content_type: String,

    /// The actual text content
    #[serde(default)]
    pub text: String,
}

impl<'a> AnthropicRequest<'a> {
    /// Split system messages out of the conversation, as the API requires
    pub fn from_messages(model: &'a str, messages: &'a [ChatMessage], max_tokens: u32) -> Self {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        Self {
            model,
            messages: messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(|m| AnthropicMessage { role: m.role, content: &m.content })
                .collect(),
            system: if system.is_empty() { None } else { Some(system.join("\n\n")) },
            temperature: None,
            max_tokens,
        }
    }
}

impl Anthropic {
    /// Create a new Anthropic client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            temperature: None,
            max_tokens: 4096,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn messages_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.anthropic.com/v1/messages".to_string()
        } else {
            format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
        }
    }

    /// Extract text from Anthropic response
    pub fn extract_text_from_response(response: &AnthropicResponse) -> String {
        response.content.iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect()
    }
}

#[async_trait]
impl Provider for Anthropic {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let mut request = AnthropicRequest::from_messages(&self.model, messages, self.max_tokens);
        request.temperature = self.temperature;

        let response = self.client.post(self.messages_url())
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Anthropic API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), &error_text));
        }

        let anthropic_response = response.json::<AnthropicResponse>().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(usage) = &anthropic_response.usage {
            debug!("Anthropic tokens: input={} output={}", usage.input_tokens, usage.output_tokens);
        }

        Ok(Self::extract_text_from_response(&anthropic_response))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
