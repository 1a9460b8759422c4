use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read corpus file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid corpus record at {path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("corpus record #{index} has an empty id")]
    EmptyId { index: usize },

    #[error("duplicate corpus id: {id}")]
    DuplicateId { id: String },

    #[error("corpus record '{id}' has no embedding")]
    MissingEmbedding { id: String },

    #[error("corpus record '{id}' has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("failed to embed corpus record '{id}': {reason}")]
    Embedding { id: String, reason: String },
}

impl CorpusError {
    pub(crate) fn embedding(id: &str, err: &EmbeddingError) -> Self {
        CorpusError::Embedding {
            id: id.to_string(),
            reason: err.to_string(),
        }
    }
}
