//! Hybrid retrieval over the corpus index.
//!
//! One query embedding, an exact cosine scan over every candidate, BM25 over the
//! expanded query terms, a capped metadata boost, linear fusion, adaptive top-k and an
//! optional judge re-rank with a relevance floor. If the floor removes everything the
//! fused order is returned instead of nothing.

pub mod config;
pub mod error;
pub mod fusion;
pub mod transform;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{FusionWeights, RetrievalConfig};
pub use error::RetrievalError;
pub use fusion::{fuse, metadata_boost, metadata_signal};
pub use transform::{QueryExpander, QueryTransformer};
pub use types::{RerankOutcome, RetrievalRequest, RetrievalResult, ScoredCandidate};

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::corpus::{CorpusIndex, is_stop_word, tokenize};
use crate::embedding::{EmbeddingService, cosine_f16_f32, normalize};
use crate::judge::{RelevanceJudge, ScoreDistribution};
use crate::retry::{RetryError, RetryPolicy};

/// Stateless over requests; construct once and share.
#[derive(Clone)]
pub struct HybridRetriever {
    index: Arc<CorpusIndex>,
    embedder: Arc<dyn EmbeddingService>,
    judge: Option<Arc<dyn RelevanceJudge>>,
    config: RetrievalConfig,
    retry: RetryPolicy,
    transformer: QueryTransformer,
    expander: QueryExpander,
}

impl std::fmt::Debug for HybridRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridRetriever")
            .field("documents", &self.index.len())
            .field("embedder", &self.embedder.name())
            .field("judge", &self.judge.as_ref().map(|j| j.name()))
            .field("config", &self.config)
            .finish()
    }
}

impl HybridRetriever {
    pub fn new(
        index: Arc<CorpusIndex>,
        embedder: Arc<dyn EmbeddingService>,
        judge: Option<Arc<dyn RelevanceJudge>>,
        config: RetrievalConfig,
        retry: RetryPolicy,
    ) -> Result<Self, RetrievalError> {
        config
            .validate()
            .map_err(|reason| RetrievalError::InvalidConfig { reason })?;

        if embedder.dimension() != index.dimension() {
            return Err(RetrievalError::DimensionMismatch {
                expected: index.dimension(),
                actual: embedder.dimension(),
            });
        }

        Ok(Self {
            transformer: QueryTransformer::new(config.max_entity_terms),
            expander: QueryExpander::new(),
            index,
            embedder,
            judge,
            config,
            retry,
        })
    }

    pub fn index(&self) -> &Arc<CorpusIndex> {
        &self.index
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Plain query at breadth `k_hint`, no expansion or structured context.
    pub async fn retrieve(
        &self,
        query: &str,
        k_hint: usize,
    ) -> Result<RetrievalResult, RetrievalError> {
        self.retrieve_request(RetrievalRequest::new(query, k_hint))
            .await
    }

    #[instrument(skip(self, request), fields(query_len = request.query.len(), k = request.k))]
    pub async fn retrieve_request(
        &self,
        request: RetrievalRequest,
    ) -> Result<RetrievalResult, RetrievalError> {
        let k = request.k.max(1);

        let query_used = self
            .transformer
            .transform(&request.query, request.structured_context.as_ref());
        let query_variants = self.expander.expand(&query_used, request.max_expansions);

        if self.index.is_empty() {
            warn!("Corpus is empty, nothing to retrieve");
            return Ok(RetrievalResult {
                ranked: Vec::new(),
                k_used: 0,
                reranked: false,
                rerank_outcome: RerankOutcome::Skipped,
                score_distribution: None,
                query_used,
                query_variants,
            });
        }

        let query_vector = self.embed_query(&query_used).await?;

        let terms: HashSet<String> = query_variants
            .iter()
            .flat_map(|v| tokenize(v))
            .filter(|t| !is_stop_word(t))
            .collect();
        let keyword_scores = self.index.keywords().normalized_scores(&terms);

        let mut scored = self.fuse_all(&query_vector, &keyword_scores);
        scored.sort_by(compare_fused);
        scored.truncate(k);

        debug!(
            terms = terms.len(),
            variants = query_variants.len(),
            top_fused = scored.first().map(|c| c.fused_score),
            "Fused candidates"
        );

        let mut result = RetrievalResult {
            ranked: scored,
            k_used: k,
            reranked: false,
            rerank_outcome: RerankOutcome::Skipped,
            score_distribution: None,
            query_used,
            query_variants,
        };

        if self.config.rerank
            && let Some(ref judge) = self.judge
        {
            self.rerank(judge.as_ref(), &mut result).await;
        }

        info!(
            k_used = result.k_used,
            returned = result.ranked.len(),
            reranked = result.reranked,
            "Retrieval complete"
        );

        Ok(result)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let mut vector = self
            .retry
            .run("embedding", || self.embedder.embed(text))
            .await
            .map_err(|e| match e {
                RetryError::Exhausted { attempts, source } => RetrievalError::EmbeddingExhausted {
                    attempts,
                    reason: source.to_string(),
                },
                RetryError::Permanent(source) => RetrievalError::EmbeddingFailed {
                    reason: source.to_string(),
                },
            })?;

        if vector.len() != self.index.dimension() {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.index.dimension(),
                actual: vector.len(),
            });
        }

        normalize(&mut vector);
        Ok(vector)
    }

    fn fuse_all(&self, query_vector: &[f32], keyword_scores: &[f32]) -> Vec<ScoredCandidate> {
        self.index
            .candidates()
            .iter()
            .enumerate()
            .map(|(pos, candidate)| {
                let cosine_score = cosine_f16_f32(&candidate.embedding, query_vector);
                let keyword_score = keyword_scores.get(pos).copied().unwrap_or(0.0);
                let boost = metadata_boost(&candidate.metadata, &self.config);
                ScoredCandidate {
                    candidate_id: candidate.id.clone(),
                    cosine_score,
                    keyword_score,
                    metadata_boost: boost,
                    fused_score: fuse(cosine_score, keyword_score, boost, &self.config),
                    rerank_score: None,
                }
            })
            .collect()
    }

    /// Judges the fused top-k in place. Any judge failure leaves the fused order intact.
    async fn rerank(&self, judge: &dyn RelevanceJudge, result: &mut RetrievalResult) {
        if result.ranked.is_empty() {
            return;
        }

        let texts: Vec<&str> = result
            .ranked
            .iter()
            .filter_map(|c| self.index.get(&c.candidate_id).map(|doc| doc.text.as_str()))
            .collect();
        let passages = texts.as_slice();
        let query = result.query_used.as_str();

        let scores = match self
            .retry
            .run("judge", || judge.judge(query, passages))
            .await
        {
            Ok(scores) if scores.len() == result.ranked.len() => scores,
            Ok(scores) => {
                let reason = format!(
                    "judge returned {} scores for {} passages",
                    scores.len(),
                    result.ranked.len()
                );
                warn!(judge = judge.name(), %reason, "Re-rank skipped");
                result.rerank_outcome = RerankOutcome::Failed { reason };
                return;
            }
            Err(e) => {
                warn!(judge = judge.name(), error = %e, "Judge failed, keeping fused order");
                result.rerank_outcome = RerankOutcome::Failed {
                    reason: e.to_string(),
                };
                return;
            }
        };

        let scale = judge.scale();
        let floor = self.config.relevance_floor.map(|f| scale.threshold(f));
        let distribution = ScoreDistribution::from_scores(&scores);
        let surviving = floor.map_or(scores.len(), |f| ScoreDistribution::above(&scores, f));

        if let Some(ref dist) = distribution {
            info!(
                judge = judge.name(),
                count = dist.count,
                min = dist.min,
                max = dist.max,
                mean = dist.mean,
                p50 = dist.p50,
                p90 = dist.p90,
                floor = ?floor,
                surviving,
                "Judge score distribution"
            );
        }
        result.score_distribution = distribution;

        let total = result.ranked.len();
        let mut kept: Vec<ScoredCandidate> = result
            .ranked
            .iter()
            .zip(&scores)
            .filter(|(_, score)| floor.is_none_or(|f| **score >= f))
            .map(|(candidate, score)| ScoredCandidate {
                rerank_score: Some(*score),
                ..candidate.clone()
            })
            .collect();

        if kept.is_empty() {
            warn!(
                judge = judge.name(),
                floor = ?floor,
                candidates = total,
                "Relevance floor removed every candidate, falling back to fused order"
            );
            result.rerank_outcome = RerankOutcome::FilteredAll;
            return;
        }

        kept.sort_by(compare_reranked);
        result.rerank_outcome = RerankOutcome::Applied {
            kept: kept.len(),
            dropped: total - kept.len(),
        };
        result.k_used = kept.len();
        result.ranked = kept;
        result.reranked = true;
    }
}

fn compare_fused(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.fused_score
        .partial_cmp(&a.fused_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

fn compare_reranked(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    let (sa, sb) = (a.rerank_score.unwrap_or(f32::MIN), b.rerank_score.unwrap_or(f32::MIN));
    sb.partial_cmp(&sa)
        .unwrap_or(Ordering::Equal)
        .then_with(|| compare_fused(a, b))
}
