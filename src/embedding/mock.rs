use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{EmbeddingError, EmbeddingService, StubEmbedder, normalize};

/// Scriptable embedder: pinned vectors per text, queued failures, call counting.
#[derive(Debug)]
pub struct MockEmbedder {
    stub: StubEmbedder,
    pinned: HashMap<String, Vec<f32>>,
    failures: Mutex<VecDeque<EmbeddingError>>,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            stub: StubEmbedder::new(dim),
            pinned: HashMap::new(),
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns `vector` (normalized) whenever exactly `text` is embedded.
    pub fn with_vector(mut self, text: impl Into<String>, mut vector: Vec<f32>) -> Self {
        normalize(&mut vector);
        self.pinned.insert(text.into(), vector);
        self
    }

    /// The next `n` calls fail with errors produced by `make`.
    pub fn fail_next(&self, n: usize, make: impl Fn() -> EmbeddingError) {
        let mut failures = self.failures.lock();
        for _ in 0..n {
            failures.push_back(make());
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.failures.lock().pop_front() {
            return Err(err);
        }

        Ok(self
            .pinned
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.stub.embed_sync(text)))
    }

    fn dimension(&self) -> usize {
        self.stub.dimension()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
