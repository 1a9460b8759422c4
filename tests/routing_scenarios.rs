//! End-to-end routing scenarios over mock services.

mod common;

use std::sync::Arc;

use common::fixtures::{DIM, corpus_file, corpus_records, jokic_rows};
use common::harness::{HarnessConfig, default_harness, scripted_judge, spawn_harness};
use sift::{
    CorpusIndex, EmbeddingError, EmbeddingService, FailureKind, HybridTier, MockEmbedder,
    OverrideKind, RerankOutcome, RetryPolicy, Route, RoutingConfig, RoutingState, ServiceError,
    StructuredRows, TerminalStatus, load_jsonl,
};

#[tokio::test]
async fn test_top_scorer_question_routes_statistical() {
    let h = default_harness().await;

    let response = h
        .orchestrator
        .handle("Who scored the most points this season?", None)
        .await
        .expect("statistical question answers");

    assert_eq!(response.route_taken, Route::Statistical);
    assert_eq!(response.classification.complexity_k, 3);
    assert_eq!(response.answer, "Answer from 3 rows and 0 passages.");
    assert_eq!(response.routing_trail.terminal_status, TerminalStatus::Ok);
    assert!(response.routing_trail.fallback_reason.is_none());
    assert_eq!(
        h.structured.questions(),
        vec!["Who scored the most points this season?".to_string()]
    );
    assert_eq!(h.embedder.calls(), 0);
}

#[tokio::test]
async fn test_biographical_question_gathers_both_kinds_of_evidence() {
    let h = spawn_harness(HarnessConfig {
        rows: jokic_rows(),
        ..HarnessConfig::default()
    })
    .await;

    let response = h
        .orchestrator
        .handle("What makes Jokić an elite playmaker?", None)
        .await
        .expect("biographical question answers");

    assert_eq!(response.route_taken, Route::Hybrid);
    assert!(response.classification.is_biographical);
    assert_eq!(
        response.classification.override_kind,
        Some(OverrideKind::Biographical)
    );
    assert!(response.routing_trail.states.contains(&RoutingState::ExecutingBoth));

    let bundle = &response.evidence_bundle;
    assert_eq!(bundle.structured.as_ref().map(|r| r.len()), Some(1));
    assert!(!bundle.passages.is_empty());
    assert_eq!(bundle.passages[0].id, "jokic-vision");
    assert_eq!(h.structured.calls(), 1);
    assert_eq!(h.embedder.calls(), 1);
}

#[tokio::test]
async fn test_connector_question_feeds_entities_into_retrieval() {
    let h = default_harness().await;

    let response = h
        .orchestrator
        .handle(
            "Tell me about the Lakers, and explain why they're exciting",
            None,
        )
        .await
        .expect("connector question answers");

    assert_eq!(response.route_taken, Route::Hybrid);
    assert_eq!(
        response.classification.hybrid_tier,
        Some(HybridTier::Connector)
    );

    let bundle = &response.evidence_bundle;
    assert!(bundle.structured.is_some());
    let retrieval_query = bundle
        .retrieval_query
        .as_deref()
        .expect("retrieval query recorded");
    assert!(retrieval_query.contains("Luka Dončić"), "{retrieval_query}");
    assert!(bundle.passages.iter().any(|p| p.id.starts_with("lakers")));
}

#[tokio::test]
async fn test_zero_rows_fall_back_with_reason() {
    let h = default_harness().await;
    h.structured.push_result(Ok(StructuredRows::default()));

    let response = h
        .orchestrator
        .handle("Who scored the most points this season?", None)
        .await
        .expect("fallback answers");

    let trail = &response.routing_trail;
    assert_eq!(trail.chosen_route, Route::Statistical);
    assert_eq!(response.route_taken, Route::Contextual);
    assert_eq!(trail.attempted_routes, vec![Route::Statistical, Route::Contextual]);
    assert!(trail.fallback_reason.is_some());
    assert_eq!(trail.failures.len(), 1);
    assert_eq!(trail.failures[0].kind, FailureKind::PathFailure);
    assert_eq!(
        trail.states.last().copied(),
        Some(RoutingState::Succeeded)
    );

    let json = serde_json::to_value(&response).expect("response serializes");
    assert_eq!(json["route_taken"], "CONTEXTUAL");
    assert_eq!(json["routing_trail"]["chosen_route"], "STATISTICAL");
    assert!(json["routing_trail"]["fallback_reason"].is_string());
}

#[tokio::test]
async fn test_structured_outage_falls_back_after_three_attempts() {
    let h = default_harness().await;
    h.structured.fail_next(3, || ServiceError::Unavailable {
        service: "structured executor",
        reason: "connection refused".to_string(),
    });

    let response = h
        .orchestrator
        .handle("Who scored the most points this season?", None)
        .await
        .expect("fallback answers");

    assert_eq!(h.structured.calls(), 3);
    assert_eq!(response.route_taken, Route::Contextual);
    assert_eq!(
        response.routing_trail.failures[0].kind,
        FailureKind::TransientExternal
    );
    assert!(!response.evidence_bundle.passages.is_empty());
}

#[tokio::test]
async fn test_greeting_makes_no_external_calls() {
    let h = default_harness().await;

    let response = h
        .orchestrator
        .handle("hey there!", Some("conv-1"))
        .await
        .expect("greeting answers");

    assert_eq!(response.answer, h.orchestrator.config().greeting_reply);
    assert!(response.classification.is_greeting());
    assert!(response.evidence_bundle.is_empty());
    assert_eq!(h.structured.calls(), 0);
    assert_eq!(h.embedder.calls(), 0);
    assert_eq!(h.synthesis.calls(), 0);
}

#[tokio::test]
async fn test_embedding_outage_is_terminal() {
    let h = default_harness().await;
    h.embedder.fail_next(3, || EmbeddingError::RateLimited);

    let err = h
        .orchestrator
        .handle("Why do fans love watching Curry?", None)
        .await
        .expect_err("no evidence and exhausted retries");

    assert!(err.is_exhausted());
    let trail = err.trail().expect("trail attached");
    assert_eq!(trail.terminal_status, TerminalStatus::Exhausted);
    assert_eq!(trail.state(), RoutingState::Failed);
    assert_eq!(h.embedder.calls(), 3);
    assert_eq!(h.synthesis.calls(), 0);
}

#[tokio::test]
async fn test_judge_floor_trims_evidence() {
    let curry = corpus_records()
        .into_iter()
        .find(|r| r.id == "curry-gravity")
        .expect("fixture present");
    let h = spawn_harness(HarnessConfig {
        judge: Some(scripted_judge(&[(curry.text.as_str(), 0.9)], 0.1)),
        ..HarnessConfig::default()
    })
    .await;

    let response = h
        .orchestrator
        .handle("Why do fans love watching Curry?", None)
        .await
        .expect("contextual question answers");

    let bundle = &response.evidence_bundle;
    assert!(bundle.reranked);
    assert_eq!(bundle.k_used, Some(1));
    assert_eq!(bundle.passages.len(), 1);
    assert_eq!(bundle.passages[0].id, "curry-gravity");
    assert_eq!(bundle.passages[0].rerank_score, Some(0.9));
    assert!(matches!(
        bundle.rerank_outcome,
        Some(RerankOutcome::Applied { kept: 1, .. })
    ));
}

#[tokio::test]
async fn test_concurrent_requests_share_one_orchestrator() {
    let h = default_harness().await;
    let orchestrator = Arc::clone(&h.orchestrator);

    let (a, b, c) = tokio::join!(
        orchestrator.handle("Who scored the most points this season?", Some("a")),
        orchestrator.handle("Why do fans love watching Curry?", Some("b")),
        orchestrator.handle("What makes Jokić an elite playmaker?", Some("c")),
    );

    assert_eq!(a.expect("a answers").route_taken, Route::Statistical);
    assert_eq!(b.expect("b answers").route_taken, Route::Contextual);
    assert_eq!(c.expect("c answers").route_taken, Route::Hybrid);
    assert_eq!(h.structured.calls(), 2);
}

#[tokio::test]
async fn test_follow_up_is_rewritten_from_history() {
    let h = default_harness().await;

    h.orchestrator
        .handle("Why do fans love watching Curry?", Some("thread"))
        .await
        .expect("first turn answers");
    let response = h
        .orchestrator
        .handle("Why is he so popular?", Some("thread"))
        .await
        .expect("follow-up answers");

    assert_eq!(h.rewriter.calls(), 1);
    assert!(response.resolved_query.contains("Curry"));
}

#[tokio::test]
async fn test_corpus_loaded_from_jsonl() {
    let embedder = MockEmbedder::new(DIM);
    let mut records = Vec::new();
    for record in corpus_records() {
        let vector = embedder.embed(&record.text).await.expect("mock embedder succeeds");
        records.push(record.with_embedding(vector));
    }
    let file = corpus_file(&records);

    let loaded = load_jsonl(file.path()).expect("corpus parses");
    assert_eq!(loaded.len(), records.len());

    let index = CorpusIndex::build_with_embedder(loaded, &embedder, &RetryPolicy::no_retry())
        .await
        .expect("index builds");
    assert_eq!(index.len(), records.len());
    assert_eq!(index.dimension(), DIM);
    assert!(index.get("arena").is_some());
    // every record carried a vector, so nothing was re-embedded
    assert_eq!(embedder.calls(), records.len());
}

#[tokio::test]
async fn test_query_over_length_limit_rejected() {
    let h = spawn_harness(HarnessConfig {
        routing: RoutingConfig::default().with_max_query_chars(20),
        ..HarnessConfig::default()
    })
    .await;

    let err = h
        .orchestrator
        .handle("Who scored the most points across the whole season?", None)
        .await
        .expect_err("query exceeds limit");
    assert!(err.to_string().contains("limit is 20"));
    assert_eq!(h.structured.calls(), 0);
}
