use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use super::{JudgeError, JudgeScale, RelevanceJudge};
use crate::corpus::{is_stop_word, tokenize};

/// Term-overlap judge: recall and Jaccard over content words, squashed through a
/// logistic centered at 0.5. Needs no model, so it is the default.
#[derive(Debug, Clone, Default)]
pub struct LexicalJudge;

impl LexicalJudge {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, query: &str, passage: &str) -> f32 {
        let query_words = content_words(query);
        let passage_words = content_words(passage);

        if query_words.is_empty() {
            let len_ratio = (query.len().min(passage.len()) as f32)
                / (query.len().max(passage.len()).max(1) as f32);
            return len_ratio * 0.3;
        }

        let matches = query_words.intersection(&passage_words).count();
        let recall = matches as f32 / query_words.len() as f32;

        let union = query_words.union(&passage_words).count();
        let jaccard = if union > 0 {
            matches as f32 / union as f32
        } else {
            0.0
        };

        let base = 0.6 * recall + 0.4 * jaccard;
        let squashed = 1.0 / (1.0 + (-8.0 * (base - 0.5)).exp());

        squashed.clamp(0.0, 1.0)
    }
}

fn content_words(text: &str) -> HashSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|w| !is_stop_word(w))
        .collect()
}

#[async_trait]
impl RelevanceJudge for LexicalJudge {
    async fn judge(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, JudgeError> {
        let scores: Vec<f32> = passages.iter().map(|p| self.score(query, p)).collect();
        debug!(passages = passages.len(), "Lexical judge scored passages");
        Ok(scores)
    }

    fn scale(&self) -> JudgeScale {
        JudgeScale::UNIT
    }

    fn name(&self) -> &'static str {
        "lexical"
    }
}
