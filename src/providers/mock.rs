/*!
 * Mock provider implementations for testing.
 *
 * A [`MockProvider`] answers through a responder closure that sees the
 * conversation and the zero-based call number. Constructors cover the common
 * shapes:
 * - `MockProvider::translating(tag)` - answers every `@@SUB_LINE@@` line with a tagged copy
 * - `MockProvider::scripted(..)` - replays a fixed list of outcomes
 * - `MockProvider::failing(err)` - always fails with the same error
 * - `MockProvider::slow(delay)` - answers after a delay (timeout and cancellation tests)
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{ChatMessage, Provider, Role};

static REQUEST_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@@SUB_LINE@@\s*(\d+)\s*:\s?(.*)$").unwrap()
});

/// Closure producing the answer for one call
pub type Responder = Arc<dyn Fn(&[ChatMessage], usize) -> Result<String, ProviderError> + Send + Sync>;

/// Mock provider for testing pipeline behaviour
pub struct MockProvider {
    /// Answer generator
    responder: Responder,
    /// Calls made so far, shared with the test
    request_count: Arc<AtomicUsize>,
    /// Every conversation received, in call order
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    /// Simulated latency before answering
    delay: Option<Duration>,
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("request_count", &self.request_count.load(Ordering::SeqCst))
            .field("delay", &self.delay)
            .finish()
    }
}

impl MockProvider {
    /// Create a mock around an arbitrary responder
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&[ChatMessage], usize) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Answer with the last user message unchanged
    pub fn echo() -> Self {
        Self::new(|messages, _| Ok(last_user_message(messages).to_string()))
    }

    /// Answer every requested line with `<tag> <source>`
    pub fn translating(tag: &str) -> Self {
        let tag = tag.to_string();
        Self::new(move |messages, _| Ok(tagged_answer(last_user_message(messages), &tag)))
    }

    /// Replay outcomes in order; calls past the end fail
    pub fn scripted(outcomes: Vec<Result<String, ProviderError>>) -> Self {
        Self::new(move |_, call| {
            outcomes
                .get(call)
                .cloned()
                .unwrap_or_else(|| Err(ProviderError::RequestFailed("mock script exhausted".to_string())))
        })
    }

    /// Always fail with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self::new(move |_, _| Err(error.clone()))
    }

    /// Answer "ok" after `delay`
    pub fn slow(delay: Duration) -> Self {
        Self::new(|_, _| Ok("ok".to_string())).with_delay(delay)
    }

    /// Add simulated latency to every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared call counter; stays valid after the provider moves into a client
    pub fn request_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.request_count)
    }

    /// Shared log of received conversations
    pub fn request_log(&self) -> Arc<Mutex<Vec<Vec<ChatMessage>>>> {
        Arc::clone(&self.requests)
    }

    /// Calls made so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let call = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(messages.to_vec());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        (self.responder)(messages, call)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Content of the last user message, or "" when there is none
pub fn last_user_message(messages: &[ChatMessage]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

/// IDs and texts of the `@@SUB_LINE@@` lines in a prompt, in order
pub fn requested_lines(prompt: &str) -> Vec<(usize, String)> {
    prompt
        .lines()
        .filter_map(|line| {
            let caps = REQUEST_LINE_REGEX.captures(line.trim())?;
            let id = caps[1].parse().ok()?;
            Some((id, caps[2].to_string()))
        })
        .collect()
}

/// Build a well-formed answer tagging each requested line
pub fn tagged_answer(prompt: &str, tag: &str) -> String {
    requested_lines(prompt)
        .into_iter()
        .map(|(id, text)| format!("@@SUB_LINE@@ {}: {} {}", id, tag, text))
        .collect::<Vec<_>>()
        .join("\n")
}
