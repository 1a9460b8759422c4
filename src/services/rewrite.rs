use std::sync::LazyLock;

use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatRequest};
use regex::Regex;
use tracing::debug;

use super::error::ServiceError;
use super::types::{Turn, TurnRole};
use super::upstream::genai_service_error;

const SERVICE: &str = "rewriter";

const CONTEXT_TURNS: usize = 4;

const SYSTEM_PROMPT: &str = "Rewrite the user's latest question so it stands alone, replacing \
pronouns with the players or teams they refer to in the conversation. Reply with the rewritten \
question only.";

static PRONOUN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:he|him|his|himself|she|her|hers|they|them|their|theirs|it|its|that team|that player|those guys)\b",
    )
    .ok()
});

/// A follow-up needs a personal pronoun and something earlier to refer to.
pub fn is_follow_up(query: &str, history: &[Turn]) -> bool {
    !history.is_empty()
        && PRONOUN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(query))
}

/// Resolves references in a follow-up against prior turns.
#[async_trait]
pub trait QueryRewriter: Send + Sync {
    async fn rewrite(&self, query: &str, history: &[Turn]) -> Result<String, ServiceError>;
}

#[derive(Clone)]
pub struct GenaiRewriter {
    client: Client,
    model: String,
}

impl std::fmt::Debug for GenaiRewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiRewriter")
            .field("model", &self.model)
            .finish()
    }
}

impl GenaiRewriter {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl QueryRewriter for GenaiRewriter {
    async fn rewrite(&self, query: &str, history: &[Turn]) -> Result<String, ServiceError> {
        let skip = history.len().saturating_sub(CONTEXT_TURNS);
        let transcript: Vec<String> = history
            .iter()
            .skip(skip)
            .map(|t| match t.role {
                TurnRole::User => format!("User: {}", t.text),
                TurnRole::Assistant => format!("Assistant: {}", t.text),
            })
            .collect();

        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Conversation:\n{}\n\nLatest question: {query}",
                transcript.join("\n")
            )),
        ]);

        let response = self
            .client
            .exec_chat(&self.model, request, None)
            .await
            .map_err(|e| genai_service_error(SERVICE, e))?;

        let rewritten = response.first_text().unwrap_or_default().trim().to_string();
        if rewritten.is_empty() {
            return Err(ServiceError::InvalidResponse {
                service: SERVICE,
                reason: "empty rewrite".to_string(),
            });
        }

        debug!(original = query, rewritten = %rewritten, "Rewrote follow-up");
        Ok(rewritten)
    }
}
