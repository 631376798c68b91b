//! Error types for broker operations.

use thiserror::Error;

/// Result type for broker operations.
pub type Result<T> = std::result::Result<T, RealtimeError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RealtimeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to publish to channel {channel}: broker returned {status}")]
    Rejected { channel: String, status: u16 },

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token lifetime: {0}")]
    InvalidTtl(String),

    #[error("Broker unavailable: {0}")]
    Unavailable(String),
}

impl RealtimeError {
    /// Whether a later retry of the same publish could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            RealtimeError::Http(err) => err.is_timeout() || err.is_connect(),
            RealtimeError::Rejected { status, .. } => {
                matches!(status, 408 | 429 | 502 | 503 | 504)
            }
            RealtimeError::Unavailable(_) => true,
            _ => false,
        }
    }
}
