use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{ChatMessage, Provider};

/// Ollama client for the local chat API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model name
    model: String,
    /// Sampling temperature
    temperature: Option<f32>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    /// Model name to use for generation
    model: &'a str,
    /// Messages of the conversation
    messages: &'a [ChatMessage],
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Message part of a chat response
#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: String,
}

/// Chat response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Response message
    pub message: Option<ResponseMessage>,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl Ollama {
    /// Create a client for `base_url` (e.g. `http://localhost:11434`)
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    /// Extract the completion from a body that is either one JSON object or JSONL chunks
    pub fn extract_text(body: &str) -> Result<String, ProviderError> {
        if let Ok(response) = serde_json::from_str::<ChatResponse>(body) {
            debug!(
                "Ollama tokens: prompt={:?} completion={:?}",
                response.prompt_eval_count, response.eval_count
            );
            return Ok(response.message.map(|m| m.content).unwrap_or_default());
        }

        // Streaming servers ignore `stream: false` sometimes; stitch the chunks
        let mut text = String::new();
        let mut parsed_any = false;
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            let chunk: ChatResponse = serde_json::from_str(line).map_err(|e| {
                let preview: String = body.chars().take(500).collect();
                error!("Failed to parse Ollama API response: {}. Raw response: {}", e, preview);
                ProviderError::ParseError(e.to_string())
            })?;
            parsed_any = true;
            if let Some(message) = chunk.message {
                text.push_str(&message.content);
            }
        }

        if parsed_any {
            Ok(text)
        } else {
            Err(ProviderError::ParseError("empty Ollama response body".to_string()))
        }
    }
}

#[async_trait]
impl Provider for Ollama {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            options: self.temperature.map(|temperature| GenerationOptions {
                temperature: Some(temperature),
                ..Default::default()
            }),
            stream: false,
        };

        let response = self.client.post(self.chat_url())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Ollama API error ({}): {}", status, body);
            return Err(ProviderError::from_status(status.as_u16(), &body));
        }

        Self::extract_text(&body)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
