/*!
 * Retry with exponential backoff around single model calls.
 */

use log::warn;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::providers::{ChatMessage, ModelClient};

/// Attempt budget and backoff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,

    /// Delay before the first retry; doubled for each further retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay after the failed attempt number `attempt` (0-based): `base × 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

/// Successful answer plus the number of retries it took.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome {
    pub text: String,
    pub retries: u32,
}

/// Call the model until it answers, a non-transient error occurs, or the budget is spent.
///
/// Cancellation is checked before every attempt and before and during every
/// backoff sleep. Fatal errors return immediately.
pub async fn invoke_with_retry(
    client: &ModelClient,
    messages: &[ChatMessage],
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<RetryOutcome, ProviderError> {
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let error = match client.complete(messages, cancel).await {
            Ok(text) => return Ok(RetryOutcome { text, retries: attempt }),
            Err(error) => error,
        };

        if error.is_fatal() || !error.is_retryable() || attempt + 1 >= policy.max_attempts {
            return Err(error);
        }

        let delay = policy.delay_for(attempt);
        warn!(
            "{} attempt {}/{} failed: {}. Retrying in {:?}",
            client.provider_name(),
            attempt + 1,
            policy.max_attempts,
            error,
            delay
        );

        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        tokio::select! {
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
    }
}
