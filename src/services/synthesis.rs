use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatRequest};
use tracing::debug;

use super::error::ServiceError;
use super::types::{Synthesis, SynthesisRequest, TurnRole};
use super::upstream::genai_service_error;

const SERVICE: &str = "synthesis";

const HISTORY_TURNS: usize = 6;

const SYSTEM_PROMPT: &str = "You answer basketball questions using only the evidence provided. \
Statistics tables are authoritative for numbers; community posts give context and opinion. \
If the evidence does not contain the answer, say \"I don't have information\" about it \
instead of guessing. Be concise.";

/// Phrases a model uses when it cannot answer from the evidence.
const DECLINE_PHRASES: &[&str] = &[
    "i don't have information",
    "i do not have information",
    "i don't have enough information",
    "i do not have enough information",
    "not enough information",
    "cannot find",
    "can't find",
    "couldn't find",
    "could not find",
    "unable to find",
    "no data",
    "no relevant information",
];

pub fn is_decline(text: &str) -> bool {
    let lower = text.to_lowercase().replace('’', "'");
    DECLINE_PHRASES.iter().any(|p| lower.contains(p))
}

#[async_trait]
pub trait SynthesisService: Send + Sync {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Synthesis, ServiceError>;
}

#[derive(Clone)]
pub struct GenaiSynthesizer {
    client: Client,
    model: String,
}

impl std::fmt::Debug for GenaiSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiSynthesizer")
            .field("model", &self.model)
            .finish()
    }
}

impl GenaiSynthesizer {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
        }
    }
}

/// Evidence section of the user prompt.
pub fn render_evidence(request: &SynthesisRequest) -> String {
    let mut out = String::new();

    if let Some(ref rows) = request.structured
        && !rows.is_empty()
    {
        out.push_str("## Statistics\n");
        out.push_str(&rows.render());
        out.push_str("\n\n");
    }

    if !request.retrieved.is_empty() {
        out.push_str("## Community discussion\n");
        for (i, passage) in request.retrieved.iter().enumerate() {
            out.push_str(&format!("[{}] {}\n", i + 1, passage));
        }
        out.push('\n');
    }

    if let Some(ref gap) = request.evidence_gap {
        out.push_str(&format!("Note: {gap}\n\n"));
    }

    if out.is_empty() {
        out.push_str("No evidence was found.\n\n");
    }

    out
}

#[async_trait]
impl SynthesisService for GenaiSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Synthesis, ServiceError> {
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];

        let skip = request.history.len().saturating_sub(HISTORY_TURNS);
        for turn in request.history.iter().skip(skip) {
            messages.push(match turn.role {
                TurnRole::User => ChatMessage::user(turn.text.clone()),
                TurnRole::Assistant => ChatMessage::assistant(turn.text.clone()),
            });
        }

        messages.push(ChatMessage::user(format!(
            "{}Question: {}",
            render_evidence(&request),
            request.question
        )));

        let response = self
            .client
            .exec_chat(&self.model, ChatRequest::new(messages), None)
            .await
            .map_err(|e| genai_service_error(SERVICE, e))?;

        let text = response.first_text().unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(ServiceError::InvalidResponse {
                service: SERVICE,
                reason: "empty completion".to_string(),
            });
        }

        let declined = is_decline(&text);
        debug!(model = %self.model, declined, answer_len = text.len(), "Synthesized answer");
        Ok(Synthesis { text, declined })
    }
}
