use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The embedding service kept failing transiently until the retry budget ran out.
    #[error("embedding service exhausted after {attempts} attempts: {reason}")]
    EmbeddingExhausted { attempts: u32, reason: String },

    #[error("query embedding failed: {reason}")]
    EmbeddingFailed { reason: String },

    #[error("query embedding has dimension {actual}, corpus expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid retrieval configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl RetrievalError {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetrievalError::EmbeddingExhausted { .. })
    }
}
