//! Cross-cutting, shared constants.
//!
//! Tunables live in the per-module config structs; the values here are their defaults.
//! The relevance floor default is conservative; tune it against the score distribution of
//! the judge in use (see [`crate::retrieval::RetrievalConfig`]).

/// Default embedding dimension for the stub embedder and `SIFT_EMBEDDING_DIM`.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Fusion weight for cosine similarity.
pub const DEFAULT_WEIGHT_COSINE: f32 = 0.55;
/// Fusion weight for the BM25 keyword score.
pub const DEFAULT_WEIGHT_KEYWORD: f32 = 0.30;
/// Fusion weight for the metadata quality signal.
pub const DEFAULT_WEIGHT_METADATA: f32 = 0.15;
/// Upper bound on the absolute metadata contribution to a fused score.
pub const DEFAULT_METADATA_CAP: f32 = 0.08;
/// Tolerance used when checking that fusion weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

/// Default relevance floor, as a fraction of the judge's scale.
pub const DEFAULT_RELEVANCE_FLOOR: f32 = 0.3;

/// BM25 term-frequency saturation.
pub const BM25_K1: f32 = 1.2;
/// BM25 length normalization.
pub const BM25_B: f32 = 0.75;

/// Engagement count at which the log-scaled engagement signal saturates.
pub const ENGAGEMENT_SATURATION: f32 = 10_000.0;

/// Retrieval breadth per complexity class.
pub const K_LOOKUP: usize = 3;
pub const K_MODERATE: usize = 5;
pub const K_COMPARATIVE: usize = 7;
pub const K_ANALYTICAL: usize = 9;

/// Hard ceiling on attempts for any external call.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 8_000;

/// Longest query accepted before any external call.
pub const DEFAULT_MAX_QUERY_CHARS: usize = 1_000;

/// Entity names appended to a retrieval query from structured rows.
pub const MAX_ENTITY_TERMS: usize = 2;

/// Upper bound on retrieval-query expansions.
pub const MAX_EXPANSIONS: usize = 5;
