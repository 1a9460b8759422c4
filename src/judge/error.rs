use std::path::PathBuf;
use thiserror::Error;

use crate::retry::Transient;

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("judge model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load judge model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("judge inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("judge service rate limited the request")]
    RateLimited,

    #[error("judge request timed out: {reason}")]
    Timeout { reason: String },

    #[error("judge service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("invalid judge response: {reason}")]
    InvalidResponse { reason: String },

    #[error("judge returned {actual} scores for {expected} passages")]
    ScoreCountMismatch { expected: usize, actual: usize },

    #[error("invalid judge configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Transient for JudgeError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            JudgeError::RateLimited | JudgeError::Timeout { .. } | JudgeError::Unavailable { .. }
        )
    }
}

impl From<candle_core::Error> for JudgeError {
    fn from(err: candle_core::Error) -> Self {
        JudgeError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}
