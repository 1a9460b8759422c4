//! External collaborators of the router.
//!
//! Each service is a trait object injected into the orchestrator, with one real
//! adapter and, behind the `mock` feature, an in-memory double. All adapter errors
//! are [`ServiceError`]s so the retry wrapper can tell transient failures apart.

pub mod error;
pub mod history;
pub mod rewrite;
pub mod structured;
pub mod synthesis;
pub mod types;
pub mod upstream;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use error::ServiceError;
pub use history::{
    DEFAULT_HISTORY_CAPACITY, DEFAULT_HISTORY_MAX_TURNS, HistoryProvider, InMemoryHistory,
};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockRewriter, MockStructuredExecutor, MockSynthesizer};
pub use rewrite::{GenaiRewriter, QueryRewriter, is_follow_up};
pub use structured::{HttpStructuredExecutor, StructuredExecutor, UnconfiguredExecutor};
pub use synthesis::{GenaiSynthesizer, SynthesisService, is_decline, render_evidence};
pub use types::{
    StructuredRows, StructuredSchema, Synthesis, SynthesisRequest, Turn, TurnRole,
};
pub use upstream::{UpstreamFailure, classify_message};
