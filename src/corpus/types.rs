use half::f16;
use serde::{Deserialize, Serialize};

/// Non-semantic quality signals carried by each document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateMetadata {
    pub upvotes: u64,
    pub comments: u64,
    /// Curated or official source (team site, league recap, beat writer).
    pub authoritative: bool,
    pub source: Option<String>,
}

impl CandidateMetadata {
    /// Raw engagement magnitude: comments count double.
    pub fn engagement(&self) -> u64 {
        self.upvotes.saturating_add(self.comments.saturating_mul(2))
    }
}

/// One line of a corpus JSONL file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub metadata: CandidateMetadata,
}

impl CorpusRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding: None,
            metadata: CandidateMetadata::default(),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_metadata(mut self, metadata: CandidateMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Indexed document. Read-only once the index is built.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub text: String,
    pub metadata: CandidateMetadata,
    /// Unit-length embedding.
    pub embedding: Vec<f16>,
}
