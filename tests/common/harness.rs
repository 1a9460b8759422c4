//! Builds a full orchestrator over mock services.

use std::sync::Arc;
use std::time::Duration;

use sift::{
    CorpusIndex, CorpusRecord, HybridRetriever, InMemoryHistory, MockEmbedder, MockJudge,
    MockRewriter, MockStructuredExecutor, MockSynthesizer, QueryClassifier, RelevanceJudge,
    RetrievalConfig, RetryPolicy, RoutingConfig, RoutingOrchestrator, ServiceHandles,
    StructuredRows,
};

use super::fixtures::{DIM, corpus_records, scoring_rows};

pub struct HarnessConfig {
    pub records: Vec<CorpusRecord>,
    pub rows: StructuredRows,
    pub routing: RoutingConfig,
    pub retrieval: RetrievalConfig,
    pub judge: Option<Arc<dyn RelevanceJudge>>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            records: corpus_records(),
            rows: scoring_rows(),
            routing: RoutingConfig::default(),
            retrieval: RetrievalConfig::default(),
            judge: None,
        }
    }
}

pub struct TestHarness {
    pub orchestrator: Arc<RoutingOrchestrator>,
    pub retriever: Arc<HybridRetriever>,
    pub structured: Arc<MockStructuredExecutor>,
    pub synthesis: Arc<MockSynthesizer>,
    pub embedder: Arc<MockEmbedder>,
    pub history: Arc<InMemoryHistory>,
    pub rewriter: Arc<MockRewriter>,
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1))
}

pub async fn build_index(records: Vec<CorpusRecord>) -> Arc<CorpusIndex> {
    let index = CorpusIndex::build_with_embedder(
        records,
        &MockEmbedder::new(DIM),
        &RetryPolicy::no_retry(),
    )
    .await
    .expect("corpus index builds");
    Arc::new(index)
}

pub async fn spawn_harness(config: HarnessConfig) -> TestHarness {
    let index = build_index(config.records).await;
    let embedder = Arc::new(MockEmbedder::new(DIM));

    let retriever = Arc::new(
        HybridRetriever::new(
            index,
            embedder.clone(),
            config.judge,
            config.retrieval,
            fast_retry(),
        )
        .expect("retriever builds"),
    );

    let structured = Arc::new(MockStructuredExecutor::new(config.rows));
    let synthesis = Arc::new(MockSynthesizer::new());
    let history = Arc::new(InMemoryHistory::new(1_000, 20));
    let rewriter = Arc::new(MockRewriter::new());

    let services = ServiceHandles::new(structured.clone(), synthesis.clone(), history.clone())
        .with_rewriter(rewriter.clone());

    let orchestrator = RoutingOrchestrator::new(
        Arc::new(QueryClassifier::standard().expect("standard classifier")),
        retriever.clone(),
        services,
        fast_retry(),
        config.routing,
    )
    .expect("orchestrator builds");

    TestHarness {
        orchestrator: Arc::new(orchestrator),
        retriever,
        structured,
        synthesis,
        embedder,
        history,
        rewriter,
    }
}

pub async fn default_harness() -> TestHarness {
    spawn_harness(HarnessConfig::default()).await
}

/// Judge that scores passages by exact text.
pub fn scripted_judge(scores: &[(&str, f32)], default: f32) -> Arc<MockJudge> {
    let mut judge = MockJudge::new(sift::JudgeScale::UNIT, default);
    for (text, score) in scores {
        judge = judge.with_score(*text, *score);
    }
    Arc::new(judge)
}
