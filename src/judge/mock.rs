use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{JudgeError, JudgeScale, RelevanceJudge};

/// Judge returning preset scores per passage text.
#[derive(Debug)]
pub struct MockJudge {
    scores: HashMap<String, f32>,
    default_score: f32,
    scale: JudgeScale,
    failures: Mutex<VecDeque<JudgeError>>,
    calls: AtomicUsize,
}

impl MockJudge {
    pub fn new(scale: JudgeScale, default_score: f32) -> Self {
        Self {
            scores: HashMap::new(),
            default_score,
            scale,
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_score(mut self, passage: impl Into<String>, score: f32) -> Self {
        self.scores.insert(passage.into(), score);
        self
    }

    pub fn fail_next(&self, n: usize, make: impl Fn() -> JudgeError) {
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
impl RelevanceJudge for MockJudge {
    async fn judge(&self, _query: &str, passages: &[&str]) -> Result<Vec<f32>, JudgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failures.lock().pop_front() {
            return Err(err);
        }
        Ok(passages
            .iter()
            .map(|p| self.scores.get(*p).copied().unwrap_or(self.default_score))
            .collect())
    }

    fn scale(&self) -> JudgeScale {
        self.scale
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
