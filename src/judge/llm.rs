use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatRequest};
use tracing::debug;

use super::{JudgeError, JudgeScale, RelevanceJudge};
use crate::services::upstream::{UpstreamFailure, classify_genai_error};

const PASSAGE_CHAR_LIMIT: usize = 1_200;

const SYSTEM_PROMPT: &str = "You rate how well passages answer a basketball question. \
Reply with only a JSON array of integers from 0 (irrelevant) to 10 (directly answers), \
one per passage, in passage order.";

/// Chat-model judge rating passages on a 0..10 scale.
#[derive(Clone)]
pub struct LlmJudge {
    client: Client,
    model: String,
}

impl std::fmt::Debug for LlmJudge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmJudge").field("model", &self.model).finish()
    }
}

impl LlmJudge {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
        }
    }

    fn prompt(query: &str, passages: &[&str]) -> String {
        let mut prompt = format!("Question: {query}\n\n");
        for (i, passage) in passages.iter().enumerate() {
            let clipped: String = passage.chars().take(PASSAGE_CHAR_LIMIT).collect();
            prompt.push_str(&format!("Passage {}:\n{}\n\n", i + 1, clipped));
        }
        prompt.push_str(&format!("Return exactly {} scores.", passages.len()));
        prompt
    }
}

/// Pulls the first `[...]` block out of a model reply and parses it as scores.
pub fn parse_scores(reply: &str, expected: usize) -> Result<Vec<f32>, JudgeError> {
    let (Some(start), Some(end)) = (reply.find('['), reply.rfind(']')) else {
        return Err(JudgeError::InvalidResponse {
            reason: "no JSON array in judge reply".to_string(),
        });
    };
    if end < start {
        return Err(JudgeError::InvalidResponse {
            reason: "malformed JSON array in judge reply".to_string(),
        });
    }

    let scores: Vec<f32> =
        serde_json::from_str(&reply[start..=end]).map_err(|e| JudgeError::InvalidResponse {
            reason: e.to_string(),
        })?;

    if scores.len() != expected {
        return Err(JudgeError::ScoreCountMismatch {
            expected,
            actual: scores.len(),
        });
    }

    let scale = JudgeScale::TEN_POINT;
    Ok(scores
        .into_iter()
        .map(|s| s.clamp(scale.min, scale.max))
        .collect())
}

#[async_trait]
impl RelevanceJudge for LlmJudge {
    async fn judge(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, JudgeError> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(Self::prompt(query, passages)),
        ]);

        let response = self
            .client
            .exec_chat(&self.model, request, None)
            .await
            .map_err(|e| match classify_genai_error(&e) {
                UpstreamFailure::RateLimited => JudgeError::RateLimited,
                UpstreamFailure::Timeout => JudgeError::Timeout {
                    reason: e.to_string(),
                },
                UpstreamFailure::Unavailable => JudgeError::Unavailable {
                    reason: e.to_string(),
                },
                UpstreamFailure::Auth => JudgeError::InvalidConfig {
                    reason: e.to_string(),
                },
                UpstreamFailure::Other => JudgeError::InvalidResponse {
                    reason: e.to_string(),
                },
            })?;

        let reply = response.first_text().unwrap_or_default();
        debug!(model = %self.model, reply_len = reply.len(), "LLM judge replied");

        parse_scores(reply, passages.len())
    }

    fn scale(&self) -> JudgeScale {
        JudgeScale::TEN_POINT
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}
