use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::ServiceError;
use super::rewrite::QueryRewriter;
use super::structured::StructuredExecutor;
use super::synthesis::{SynthesisService, is_decline};
use super::types::{StructuredRows, StructuredSchema, Synthesis, SynthesisRequest, Turn};

/// Returns queued results first, then the default rows.
#[derive(Debug, Default)]
pub struct MockStructuredExecutor {
    default_rows: StructuredRows,
    queued: Mutex<VecDeque<Result<StructuredRows, ServiceError>>>,
    questions: Mutex<Vec<String>>,
}

impl MockStructuredExecutor {
    pub fn new(default_rows: StructuredRows) -> Self {
        Self {
            default_rows,
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push_result(&self, result: Result<StructuredRows, ServiceError>) {
        self.queued.lock().push_back(result);
    }

    pub fn fail_next(&self, n: usize, make: impl Fn() -> ServiceError) {
        let mut queued = self.queued.lock();
        for _ in 0..n {
            queued.push_back(Err(make()));
        }
    }

    pub fn calls(&self) -> usize {
        self.questions.lock().len()
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().clone()
    }
}

#[async_trait]
impl StructuredExecutor for MockStructuredExecutor {
    async fn execute(
        &self,
        question: &str,
        _schema: &StructuredSchema,
    ) -> Result<StructuredRows, ServiceError> {
        self.questions.lock().push(question.to_string());
        match self.queued.lock().pop_front() {
            Some(result) => result,
            None => Ok(self.default_rows.clone()),
        }
    }
}

/// Summarizes the evidence it was given. Declines when there is none, like a careful
/// model would.
#[derive(Debug, Default)]
pub struct MockSynthesizer {
    queued: Mutex<VecDeque<Result<Synthesis, ServiceError>>>,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply; `declined` is derived from the text.
    pub fn push_reply(&self, text: impl Into<String>) {
        let text = text.into();
        let declined = is_decline(&text);
        self.queued.lock().push_back(Ok(Synthesis { text, declined }));
    }

    pub fn fail_next(&self, n: usize, make: impl Fn() -> ServiceError) {
        let mut queued = self.queued.lock();
        for _ in 0..n {
            queued.push_back(Err(make()));
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl SynthesisService for MockSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Synthesis, ServiceError> {
        let has_evidence = request.has_evidence();
        let rows = request.structured.as_ref().map_or(0, |r| r.len());
        let passages = request.retrieved.len();
        self.requests.lock().push(request);

        if let Some(result) = self.queued.lock().pop_front() {
            return result;
        }

        if !has_evidence {
            return Ok(Synthesis {
                text: "I don't have information to answer that.".to_string(),
                declined: true,
            });
        }

        Ok(Synthesis {
            text: format!("Answer from {rows} rows and {passages} passages."),
            declined: false,
        })
    }
}

/// Appends the most recent user turn so tests can see the rewrite happened.
#[derive(Debug, Default)]
pub struct MockRewriter {
    calls: AtomicUsize,
}

impl MockRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryRewriter for MockRewriter {
    async fn rewrite(&self, query: &str, history: &[Turn]) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let context = history
            .iter()
            .rev()
            .find(|t| t.role == super::types::TurnRole::User)
            .map(|t| t.text.as_str())
            .unwrap_or_default();
        Ok(format!("{query} (regarding: {context})"))
    }
}
