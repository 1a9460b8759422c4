//! In-memory corpus index.
//!
//! Built once at startup from JSONL records and shared read-only as `Arc<CorpusIndex>`.
//! Holds unit-normalized `f16` vectors for the exact cosine scan and a [`KeywordIndex`]
//! for BM25.

pub mod error;
pub mod keyword;
pub mod loader;
pub mod types;


pub use error::CorpusError;
pub use keyword::{KeywordIndex, STOP_WORDS, is_stop_word, tokenize};
pub use loader::{load_jsonl, parse_jsonl};
pub use types::{Candidate, CandidateMetadata, CorpusRecord};

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::embedding::{EmbeddingService, to_unit_f16};
use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct CorpusIndex {
    candidates: Vec<Candidate>,
    positions: HashMap<String, usize>,
    keywords: KeywordIndex,
    dimension: usize,
}

impl CorpusIndex {
    /// Builds from records that all carry an embedding of `dimension` floats.
    pub fn build(records: Vec<CorpusRecord>, dimension: usize) -> Result<Self, CorpusError> {
        let mut candidates = Vec::with_capacity(records.len());
        let mut positions = HashMap::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            if record.id.trim().is_empty() {
                return Err(CorpusError::EmptyId { index });
            }
            if positions.contains_key(&record.id) {
                return Err(CorpusError::DuplicateId { id: record.id });
            }

            let Some(embedding) = record.embedding else {
                return Err(CorpusError::MissingEmbedding { id: record.id });
            };
            if embedding.len() != dimension {
                return Err(CorpusError::DimensionMismatch {
                    id: record.id,
                    expected: dimension,
                    actual: embedding.len(),
                });
            }

            positions.insert(record.id.clone(), candidates.len());
            candidates.push(Candidate {
                id: record.id,
                text: record.text,
                metadata: record.metadata,
                embedding: to_unit_f16(embedding),
            });
        }

        let keywords = KeywordIndex::build(candidates.iter().map(|c| c.text.as_str()));

        if candidates.is_empty() {
            warn!("Corpus index is empty; retrieval will return no evidence");
        } else {
            info!(documents = candidates.len(), dimension, "Built corpus index");
        }

        Ok(Self {
            candidates,
            positions,
            keywords,
            dimension,
        })
    }

    /// Embeds records that have no vector, then builds.
    pub async fn build_with_embedder(
        mut records: Vec<CorpusRecord>,
        embedder: &dyn EmbeddingService,
        retry: &RetryPolicy,
    ) -> Result<Self, CorpusError> {
        let mut embedded = 0usize;

        for record in records.iter_mut().filter(|r| r.embedding.is_none()) {
            let text = record.text.as_str();
            let vector = retry
                .run("corpus_embed", || embedder.embed(text))
                .await
                .map_err(|e| CorpusError::embedding(&record.id, e.inner()))?;
            record.embedding = Some(vector);
            embedded += 1;
        }

        debug!(embedded, embedder = embedder.name(), "Embedded corpus records");
        Self::build(records, embedder.dimension())
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn get(&self, id: &str) -> Option<&Candidate> {
        self.positions.get(id).map(|&pos| &self.candidates[pos])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn keywords(&self) -> &KeywordIndex {
        &self.keywords
    }
}
