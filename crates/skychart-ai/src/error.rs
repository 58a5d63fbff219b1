use std::time::Duration;
use thiserror::Error;

/// Terminal failure of a completion call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("Provider rejected the request ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed provider response: {0}")]
    BadGateway(String),

    #[error("Completion service unavailable: {0}")]
    ServiceUnavailable(String),
}

