use super::*;
use serial_test::serial;
use std::env;
use std::time::Duration;

use crate::corpus::{CandidateMetadata, CorpusRecord};
use crate::embedding::{EmbeddingError, MockEmbedder};
use crate::judge::{JudgeError, JudgeScale, MockJudge};
use crate::services::StructuredRows;

const DIM: usize = 4;
const QUERY: &str = "playoff rotation";

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1))
}

/// `near` points along the query, `mid` at 45°, `far` orthogonal. No shared words.
fn corpus() -> Arc<CorpusIndex> {
    Arc::new(
        CorpusIndex::build(
            vec![
                CorpusRecord::new("near", "coaching staff changes")
                    .with_embedding(vec![1.0, 0.0, 0.0, 0.0]),
                CorpusRecord::new("mid", "arena parking lot")
                    .with_embedding(vec![1.0, 1.0, 0.0, 0.0]),
                CorpusRecord::new("far", "ticket prices rising")
                    .with_embedding(vec![0.0, 1.0, 0.0, 0.0]),
            ],
            DIM,
        )
        .unwrap(),
    )
}

fn embedder() -> Arc<MockEmbedder> {
    Arc::new(MockEmbedder::new(DIM).with_vector(QUERY, vec![1.0, 0.0, 0.0, 0.0]))
}

fn retriever(
    index: Arc<CorpusIndex>,
    embedder: Arc<MockEmbedder>,
    judge: Option<Arc<MockJudge>>,
    config: RetrievalConfig,
) -> HybridRetriever {
    HybridRetriever::new(
        index,
        embedder,
        judge.map(|j| j as Arc<dyn RelevanceJudge>),
        config,
        fast_retry(),
    )
    .unwrap()
}

#[test]
fn test_fuse_is_monotonic_in_cosine() {
    let config = RetrievalConfig::default();
    let mut prev = f32::MIN;
    for step in 0..=10 {
        let cos = step as f32 / 10.0;
        let fused = fuse(cos, 0.4, 0.02, &config);
        assert!(fused > prev);
        prev = fused;
    }
}

#[test]
fn test_metadata_boost_is_capped() {
    let config = RetrievalConfig::default();
    let viral = CandidateMetadata {
        upvotes: 1_000_000,
        comments: 50_000,
        authoritative: true,
        source: None,
    };

    assert!((metadata_signal(&viral) - 1.0).abs() < 1e-6);
    assert!(metadata_boost(&viral, &config) <= config.metadata_cap);
    assert_eq!(metadata_boost(&CandidateMetadata::default(), &config), 0.0);

    let modest = CandidateMetadata {
        upvotes: 40,
        ..Default::default()
    };
    assert!(metadata_signal(&modest) > 0.0);
    assert!(metadata_signal(&modest) < metadata_signal(&viral));
}

#[test]
fn test_config_validation() {
    assert!(RetrievalConfig::default().validate().is_ok());

    let heavy_metadata = RetrievalConfig::default().with_weights(FusionWeights::new(0.3, 0.3, 0.4));
    assert!(heavy_metadata.validate().unwrap_err().contains("must not exceed"));

    let bad_sum = RetrievalConfig::default().with_weights(FusionWeights::new(0.5, 0.3, 0.1));
    assert!(bad_sum.validate().unwrap_err().contains("sum to 1.0"));

    let bad_floor = RetrievalConfig::default().with_relevance_floor(Some(1.5));
    assert!(bad_floor.validate().is_err());

    let err = HybridRetriever::new(corpus(), embedder(), None, bad_floor, fast_retry()).unwrap_err();
    assert!(matches!(err, RetrievalError::InvalidConfig { .. }));
}

#[test]
fn test_new_rejects_dimension_mismatch() {
    let err = HybridRetriever::new(
        corpus(),
        Arc::new(MockEmbedder::new(8)),
        None,
        RetrievalConfig::default(),
        fast_retry(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RetrievalError::DimensionMismatch {
            expected: 4,
            actual: 8
        }
    ));
}

#[test]
#[serial]
fn test_config_from_env() {
    with_env_vars(
        &[
            ("SIFT_WEIGHT_COSINE", "0.6"),
            ("SIFT_WEIGHT_KEYWORD", "0.3"),
            ("SIFT_WEIGHT_METADATA", "0.1"),
            ("SIFT_RELEVANCE_FLOOR", "off"),
            ("SIFT_RERANK", "false"),
        ],
        || {
            let config = RetrievalConfig::from_env();
            assert_eq!(config.weights, FusionWeights::new(0.6, 0.3, 0.1));
            assert_eq!(config.relevance_floor, None);
            assert!(!config.rerank);
            assert!(config.validate().is_ok());
        },
    );

    with_env_vars(&[("SIFT_RELEVANCE_FLOOR", "0.5")], || {
        let config = RetrievalConfig::from_env();
        assert_eq!(config.relevance_floor, Some(0.5));
        assert!(config.rerank);
    });
}

#[tokio::test]
async fn test_ranks_by_cosine_and_truncates_to_k() {
    let retriever = retriever(corpus(), embedder(), None, RetrievalConfig::default());

    let result = retriever.retrieve(QUERY, 2).await.unwrap();

    assert_eq!(result.ids(), vec!["near", "mid"]);
    assert_eq!(result.k_used, 2);
    assert!(!result.reranked);
    assert_eq!(result.rerank_outcome, RerankOutcome::Skipped);
    assert!(result.ranked[0].fused_score > result.ranked[1].fused_score);
    assert!((result.ranked[0].cosine_score - 1.0).abs() < 1e-2);
    assert!((result.ranked[1].cosine_score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-2);
}

#[tokio::test]
async fn test_k_larger_than_corpus_returns_everything() {
    let retriever = retriever(corpus(), embedder(), None, RetrievalConfig::default());

    let result = retriever.retrieve(QUERY, 9).await.unwrap();

    assert_eq!(result.ranked.len(), 3);
    assert_eq!(result.k_used, 9);
}

#[tokio::test]
async fn test_keyword_breaks_semantic_tie() {
    let index = Arc::new(
        CorpusIndex::build(
            vec![
                CorpusRecord::new("plain", "arena parking lot")
                    .with_embedding(vec![1.0, 0.0, 0.0, 0.0]),
                CorpusRecord::new("match", "the playoff rotation shortened")
                    .with_embedding(vec![1.0, 0.0, 0.0, 0.0]),
            ],
            DIM,
        )
        .unwrap(),
    );
    let retriever = retriever(index, embedder(), None, RetrievalConfig::default());

    let result = retriever.retrieve(QUERY, 2).await.unwrap();

    assert_eq!(result.ids(), vec!["match", "plain"]);
    assert!((result.ranked[0].keyword_score - 1.0).abs() < 1e-6);
    assert_eq!(result.ranked[1].keyword_score, 0.0);
}

#[tokio::test]
async fn test_metadata_cannot_overturn_semantic_gap() {
    let viral = CandidateMetadata {
        upvotes: 250_000,
        comments: 9_000,
        authoritative: true,
        source: Some("r/nba".to_string()),
    };
    let index = Arc::new(
        CorpusIndex::build(
            vec![
                CorpusRecord::new("relevant", "coaching staff changes")
                    .with_embedding(vec![1.0, 0.0, 0.0, 0.0]),
                CorpusRecord::new("popular", "ticket prices rising")
                    .with_embedding(vec![0.0, 1.0, 0.0, 0.0])
                    .with_metadata(viral),
            ],
            DIM,
        )
        .unwrap(),
    );
    let retriever = retriever(index, embedder(), None, RetrievalConfig::default());

    let result = retriever.retrieve(QUERY, 2).await.unwrap();

    assert_eq!(result.ids(), vec!["relevant", "popular"]);
    assert!(result.ranked[1].metadata_boost > 0.0);
    assert!(result.ranked[1].metadata_boost <= DEFAULT_CAP);
}

const DEFAULT_CAP: f32 = crate::constants::DEFAULT_METADATA_CAP;

#[tokio::test]
async fn test_rerank_applies_floor_and_reorders() {
    let judge = Arc::new(
        MockJudge::new(JudgeScale::UNIT, 0.0)
            .with_score("coaching staff changes", 0.1)
            .with_score("arena parking lot", 0.5)
            .with_score("ticket prices rising", 0.9),
    );
    let retriever = retriever(
        corpus(),
        embedder(),
        Some(judge.clone()),
        RetrievalConfig::default(),
    );

    let result = retriever.retrieve(QUERY, 3).await.unwrap();

    assert!(result.reranked);
    assert_eq!(result.ids(), vec!["far", "mid"]);
    assert_eq!(result.k_used, 2);
    assert_eq!(
        result.rerank_outcome,
        RerankOutcome::Applied {
            kept: 2,
            dropped: 1
        }
    );
    assert_eq!(result.ranked[0].rerank_score, Some(0.9));
    let dist = result.score_distribution.unwrap();
    assert_eq!(dist.count, 3);
    assert_eq!(dist.max, 0.9);
    assert_eq!(judge.calls(), 1);
}

#[tokio::test]
async fn test_floor_scales_with_judge_range() {
    // 2.5 of 10 sits below a 0.3 floor; 3.5 clears it
    let judge = Arc::new(
        MockJudge::new(JudgeScale::TEN_POINT, 2.5).with_score("arena parking lot", 3.5),
    );
    let retriever = retriever(corpus(), embedder(), Some(judge), RetrievalConfig::default());

    let result = retriever.retrieve(QUERY, 3).await.unwrap();

    assert_eq!(result.ids(), vec!["mid"]);
    assert_eq!(result.k_used, 1);
}

#[tokio::test]
async fn test_everything_below_floor_falls_back_to_fused_order() {
    let judge = Arc::new(MockJudge::new(JudgeScale::UNIT, 0.05));
    let retriever = retriever(corpus(), embedder(), Some(judge), RetrievalConfig::default());

    let result = retriever.retrieve(QUERY, 3).await.unwrap();

    assert_eq!(result.rerank_outcome, RerankOutcome::FilteredAll);
    assert!(!result.reranked);
    assert_eq!(result.ids(), vec!["near", "mid", "far"]);
    assert_eq!(result.k_used, 3);
    assert!(result.score_distribution.is_some());
    assert!(result.ranked.iter().all(|c| c.rerank_score.is_none()));
}

#[tokio::test]
async fn test_floor_disabled_only_reorders() {
    let judge = Arc::new(
        MockJudge::new(JudgeScale::UNIT, 0.01).with_score("ticket prices rising", 0.02),
    );
    let config = RetrievalConfig::default().with_relevance_floor(None);
    let retriever = retriever(corpus(), embedder(), Some(judge), config);

    let result = retriever.retrieve(QUERY, 3).await.unwrap();

    assert!(result.reranked);
    assert_eq!(result.ranked.len(), 3);
    assert_eq!(result.ranked[0].candidate_id, "far");
    // equal judge scores keep fused order
    assert_eq!(result.ranked[1].candidate_id, "near");
}

#[tokio::test]
async fn test_judge_exhaustion_degrades_to_fused_order() {
    let judge = Arc::new(MockJudge::new(JudgeScale::UNIT, 0.9));
    judge.fail_next(3, || JudgeError::Timeout {
        reason: "slow".to_string(),
    });
    let retriever = retriever(
        corpus(),
        embedder(),
        Some(judge.clone()),
        RetrievalConfig::default(),
    );

    let result = retriever.retrieve(QUERY, 2).await.unwrap();

    assert_eq!(judge.calls(), 3);
    assert!(!result.reranked);
    assert!(matches!(result.rerank_outcome, RerankOutcome::Failed { .. }));
    assert_eq!(result.ids(), vec!["near", "mid"]);
}

#[tokio::test]
async fn test_judge_recovers_after_transient_failure() {
    let judge = Arc::new(MockJudge::new(JudgeScale::UNIT, 0.9));
    judge.fail_next(1, || JudgeError::RateLimited);
    let retriever = retriever(
        corpus(),
        embedder(),
        Some(judge.clone()),
        RetrievalConfig::default(),
    );

    let result = retriever.retrieve(QUERY, 2).await.unwrap();

    assert_eq!(judge.calls(), 2);
    assert!(result.reranked);
}

#[tokio::test]
async fn test_rerank_disabled_skips_judge() {
    let judge = Arc::new(MockJudge::new(JudgeScale::UNIT, 0.9));
    let config = RetrievalConfig::default().with_rerank(false);
    let retriever = retriever(corpus(), embedder(), Some(judge.clone()), config);

    let result = retriever.retrieve(QUERY, 2).await.unwrap();

    assert_eq!(judge.calls(), 0);
    assert_eq!(result.rerank_outcome, RerankOutcome::Skipped);
}

#[tokio::test]
async fn test_embedding_exhaustion_is_reported() {
    let embedder = embedder();
    embedder.fail_next(3, || EmbeddingError::RateLimited);
    let retriever = retriever(corpus(), embedder.clone(), None, RetrievalConfig::default());

    let err = retriever.retrieve(QUERY, 3).await.unwrap_err();

    assert!(err.is_exhausted());
    assert!(matches!(err, RetrievalError::EmbeddingExhausted { attempts: 3, .. }));
    assert_eq!(embedder.calls(), 3);
}

#[tokio::test]
async fn test_permanent_embedding_failure_is_not_retried() {
    let embedder = embedder();
    embedder.fail_next(1, || EmbeddingError::Rejected {
        status: 400,
        reason: "bad input".to_string(),
    });
    let retriever = retriever(corpus(), embedder.clone(), None, RetrievalConfig::default());

    let err = retriever.retrieve(QUERY, 3).await.unwrap_err();

    assert!(matches!(err, RetrievalError::EmbeddingFailed { .. }));
    assert_eq!(embedder.calls(), 1);
}

#[tokio::test]
async fn test_empty_corpus_returns_empty_result() {
    let index = Arc::new(CorpusIndex::build(Vec::new(), DIM).unwrap());
    let embedder = embedder();
    let retriever = retriever(index, embedder.clone(), None, RetrievalConfig::default());

    let result = retriever.retrieve(QUERY, 5).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(result.k_used, 0);
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn test_structured_rows_add_entity_names() {
    let embedder = embedder();
    let retriever = retriever(corpus(), embedder.clone(), None, RetrievalConfig::default());
    let rows = StructuredRows {
        query: None,
        columns: vec!["player_name".to_string(), "ast".to_string()],
        rows: vec![
            vec![serde_json::json!("Nikola Jokić"), serde_json::json!(10.2)],
            vec![serde_json::json!("Tyrese Haliburton"), serde_json::json!(9.8)],
            vec![serde_json::json!("Trae Young"), serde_json::json!(9.6)],
        ],
    };

    let request = RetrievalRequest::new("What makes an effective playmaker?", 3)
        .with_structured_context(rows);
    let result = retriever.retrieve_request(request).await.unwrap();

    assert_eq!(
        result.query_used,
        "What makes an effective playmaker? Nikola Jokić Tyrese Haliburton"
    );
    assert_eq!(embedder.calls(), 1);
}

#[test]
fn test_transformer_skips_names_already_mentioned() {
    let rows = StructuredRows {
        query: None,
        columns: vec!["player".to_string()],
        rows: vec![vec![serde_json::json!("LeBron James")]],
    };
    let transformer = QueryTransformer::new(2);

    assert_eq!(
        transformer.transform("How did LeBron James age so well?", Some(&rows)),
        "How did LeBron James age so well?"
    );
    assert_eq!(transformer.transform("  plain  ", None), "plain");
}

#[test]
fn test_expander_variants() {
    let expander = QueryExpander::new();

    assert_eq!(expander.expand("lebron ppg", 1), vec!["lebron ppg"]);

    let variants = expander.expand("lebron ppg", 5);
    assert_eq!(variants[0], "lebron ppg");
    assert!(variants.contains(&"lebron points per game".to_string()));

    let variants = expander.expand("Curry is sooooo good", 5);
    assert!(variants.contains(&"Curry is soo good".to_string()));

    let variants = expander.expand("is he an elite playmaker", 5);
    assert!(variants.iter().any(|v| v.contains("facilitator")));
    assert!(variants.len() <= 5);
    assert!(expander.expand("anything", 0).len() == 1);
}

#[test]
fn test_per_game_is_not_read_as_efficiency_rating() {
    let expander = QueryExpander::new();

    let variants = expander.expand("most assists per game this season", 5);
    assert!(variants.iter().all(|v| !v.contains("efficiency")), "{variants:?}");

    let variants = expander.expand("Jokic points PER 36 minutes", 5);
    assert!(variants.iter().all(|v| !v.contains("efficiency")), "{variants:?}");

    let variants = expander.expand("highest PER among centers", 5);
    assert!(variants.iter().any(|v| v.contains("player efficiency rating")));
}

#[tokio::test]
async fn test_expansion_terms_feed_keyword_scoring() {
    let index = Arc::new(
        CorpusIndex::build(
            vec![
                CorpusRecord::new("plain", "arena parking lot")
                    .with_embedding(vec![1.0, 0.0, 0.0, 0.0]),
                CorpusRecord::new("spelled", "he leads in points per game")
                    .with_embedding(vec![1.0, 0.0, 0.0, 0.0]),
            ],
            DIM,
        )
        .unwrap(),
    );
    let embedder = Arc::new(MockEmbedder::new(DIM).with_vector("lebron ppg", vec![1.0, 0.0, 0.0, 0.0]));
    let retriever = retriever(index, embedder, None, RetrievalConfig::default());

    let request = RetrievalRequest::new("lebron ppg", 2).with_expansions(5);
    let result = retriever.retrieve_request(request).await.unwrap();

    assert_eq!(result.ids()[0], "spelled");
    assert!(result.query_variants.len() > 1);
}
