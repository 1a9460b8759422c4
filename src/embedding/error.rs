use thiserror::Error;

use crate::retry::Transient;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding service rate limited the request")]
    RateLimited,

    #[error("embedding request timed out: {reason}")]
    Timeout { reason: String },

    #[error("embedding service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("embedding service rejected the request ({status}): {reason}")]
    Rejected { status: u16, reason: String },

    #[error("invalid embedding response: {reason}")]
    InvalidResponse { reason: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid embedding configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Transient for EmbeddingError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            EmbeddingError::RateLimited
                | EmbeddingError::Timeout { .. }
                | EmbeddingError::Unavailable { .. }
        )
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EmbeddingError::Timeout {
                reason: err.to_string(),
            }
        } else if err.is_connect() || err.is_request() {
            EmbeddingError::Unavailable {
                reason: err.to_string(),
            }
        } else if err.is_decode() {
            EmbeddingError::InvalidResponse {
                reason: err.to_string(),
            }
        } else {
            EmbeddingError::Unavailable {
                reason: err.to_string(),
            }
        }
    }
}
