/*!
 * Error types for the subweave pipeline.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when invoking a model provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The caller's cancellation token fired before or during the call
    #[error("Request cancelled")]
    Cancelled,

    /// The account behind the provider has run out of credits
    #[error("Insufficient credits: {0}")]
    InsufficientCredits(String),

    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The attempt did not finish within the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The model answered with nothing usable
    #[error("Provider returned an empty response")]
    EmptyResponse,
}

impl ProviderError {
    /// Fatal errors end the whole run and are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::InsufficientCredits(_))
    }

    /// Transient errors are worth another attempt after a backoff delay.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_)
            | Self::RateLimitExceeded(_)
            | Self::ConnectionError(_)
            | Self::EmptyResponse => true,
            Self::ApiError { status_code, .. } => *status_code == 408 || *status_code >= 500,
            _ => false,
        }
    }

    /// Map a non-success HTTP status and body onto the failure taxonomy.
    pub fn from_status(status_code: u16, body: &str) -> Self {
        let lowered = body.to_lowercase();
        let credits_exhausted = lowered.contains("insufficient_quota")
            || lowered.contains("insufficient credits")
            || lowered.contains("insufficient_credits")
            || lowered.contains("credit balance is too low");

        if status_code == 402 || credits_exhausted {
            return Self::InsufficientCredits(body.to_string());
        }

        match status_code {
            401 | 403 => Self::AuthenticationError(body.to_string()),
            429 => Self::RateLimitExceeded(body.to_string()),
            _ => Self::ApiError {
                status_code,
                message: body.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors that end a pipeline run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The run was cancelled by the caller
    #[error("Translation cancelled")]
    Cancelled,

    /// Credits ran out; the message is the provider's, verbatim
    #[error("Insufficient credits: {0}")]
    InsufficientCredits(String),

    /// The request itself cannot be processed
    #[error("Invalid pipeline input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    /// Convert a provider error that must abort the run.
    ///
    /// Returns `None` for errors that only affect a single batch.
    pub fn from_fatal(error: &ProviderError) -> Option<Self> {
        match error {
            ProviderError::Cancelled => Some(Self::Cancelled),
            ProviderError::InsufficientCredits(message) => {
                Some(Self::InsufficientCredits(message.clone()))
            }
            _ => None,
        }
    }

    /// Whether this is the cancellation kind
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
