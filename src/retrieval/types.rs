use serde::Serialize;

use crate::judge::ScoreDistribution;
use crate::services::StructuredRows;

/// Per-query score breakdown for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate_id: String,
    pub cosine_score: f32,
    /// Max-normalized BM25, in `[0, 1]`.
    pub keyword_score: f32,
    /// Weighted and capped metadata contribution already included in `fused_score`.
    pub metadata_boost: f32,
    pub fused_score: f32,
    /// Judge score on the judge's own scale, when re-ranking ran.
    pub rerank_score: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RerankOutcome {
    /// No judge, re-ranking disabled, or nothing to judge.
    Skipped,
    Applied { kept: usize, dropped: usize },
    /// Every candidate fell below the floor; the fused order was kept.
    FilteredAll,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    /// Sorted by the score used for selection: judge score when `reranked`, else fused.
    pub ranked: Vec<ScoredCandidate>,
    pub k_used: usize,
    pub reranked: bool,
    pub rerank_outcome: RerankOutcome,
    pub score_distribution: Option<ScoreDistribution>,
    /// Text actually embedded, after transformation.
    pub query_used: String,
    pub query_variants: Vec<String>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.ranked.iter().map(|c| c.candidate_id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetrievalRequest {
    pub query: String,
    /// Adaptive breadth, normally the classifier's `complexity_k`.
    pub k: usize,
    pub max_expansions: usize,
    /// Rows from the structured path, used to add entity names on hybrid routes.
    pub structured_context: Option<StructuredRows>,
}

impl RetrievalRequest {
    pub fn new(query: impl Into<String>, k: usize) -> Self {
        Self {
            query: query.into(),
            k,
            max_expansions: 1,
            structured_context: None,
        }
    }

    pub fn with_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub fn with_structured_context(mut self, rows: StructuredRows) -> Self {
        self.structured_context = Some(rows);
        self
    }
}
