//! Sift library crate (used by the `sift` binary and integration tests).
//!
//! # Public API Surface
//!
//! The exports are organized by module:
//!
//! ## Routing
//! - [`RoutingOrchestrator`], [`ServiceHandles`] - Per-request state machine
//! - [`AnswerResponse`], [`RouteDecision`], [`EvidenceBundle`] - What a caller gets back
//!
//! ## Classification
//! - [`QueryClassifier`], [`SignalLibrary`] - Signal-weighted route selection
//! - [`ClassificationResult`], [`Route`] - Classifier output
//!
//! ## Retrieval
//! - [`CorpusIndex`], [`CorpusRecord`] - In-memory corpus built once at startup
//! - [`HybridRetriever`], [`RetrievalConfig`] - Cosine + BM25 + metadata fusion
//! - [`RelevanceJudge`], [`JudgeConfig`] - Optional re-ranking with a relevance floor
//!
//! ## External Services
//! - [`EmbeddingService`], [`StructuredExecutor`], [`SynthesisService`],
//!   [`QueryRewriter`], [`HistoryProvider`] - Injected collaborators
//! - [`RetryPolicy`] - Bounded exponential backoff applied at every boundary
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod classifier;
pub mod config;
pub mod constants;
pub mod corpus;
pub mod embedding;
pub mod judge;
pub mod retrieval;
pub mod retry;
pub mod routing;
pub mod services;

pub use classifier::{
    ClassificationResult, ClassifierConfig, ClassifierError, ComplexityClass, HybridTier,
    OverrideKind, PatternSpec, QueryCategory, QueryClassifier, Route, SignalLibrary,
};
pub use config::{Config, ConfigError};
pub use corpus::{
    Candidate, CandidateMetadata, CorpusError, CorpusIndex, CorpusRecord, load_jsonl,
};
pub use embedding::{EmbeddingError, EmbeddingService, HttpEmbedder, HttpEmbedderConfig, StubEmbedder};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use judge::{
    JudgeConfig, JudgeError, JudgeKind, JudgeScale, RelevanceJudge, ScoreDistribution, build_judge,
};
#[cfg(any(test, feature = "mock"))]
pub use judge::MockJudge;
pub use retrieval::{
    FusionWeights, HybridRetriever, RerankOutcome, RetrievalConfig, RetrievalError,
    RetrievalRequest, RetrievalResult, ScoredCandidate,
};
pub use retry::{RetryError, RetryPolicy, Transient};
pub use routing::{
    AnswerResponse, EvidenceBundle, EvidenceItem, FailureKind, PathFailureRecord, RouteDecision,
    RoutingConfig, RoutingError, RoutingOrchestrator, RoutingState, ServiceHandles,
    TerminalStatus,
};
pub use services::{
    GenaiRewriter, GenaiSynthesizer, HistoryProvider, HttpStructuredExecutor, InMemoryHistory,
    QueryRewriter, ServiceError, StructuredExecutor, StructuredRows, StructuredSchema, Synthesis,
    SynthesisService, Turn, UnconfiguredExecutor,
};
#[cfg(any(test, feature = "mock"))]
pub use services::{MockRewriter, MockStructuredExecutor, MockSynthesizer};
