use crate::constants::DEFAULT_MAX_QUERY_CHARS;

pub const DEFAULT_GREETING_REPLY: &str =
    "Hi! Ask me about player and team stats, or what fans are saying around the league.";

/// Prior turns passed to synthesis.
pub const DEFAULT_SYNTHESIS_HISTORY: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct RoutingConfig {
    pub max_query_chars: usize,

    /// Reply to a standalone greeting. No evidence is gathered for it.
    pub greeting_reply: String,

    /// Run the structured path before retrieval on HYBRID routes so its rows can add
    /// entity names to the retrieval query. When off, both paths run concurrently.
    pub entity_bias: bool,

    pub synthesis_history: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_query_chars: DEFAULT_MAX_QUERY_CHARS,
            greeting_reply: DEFAULT_GREETING_REPLY.to_string(),
            entity_bias: true,
            synthesis_history: DEFAULT_SYNTHESIS_HISTORY,
        }
    }
}

impl RoutingConfig {
    pub fn with_max_query_chars(mut self, max_query_chars: usize) -> Self {
        self.max_query_chars = max_query_chars;
        self
    }

    pub fn with_entity_bias(mut self, entity_bias: bool) -> Self {
        self.entity_bias = entity_bias;
        self
    }

    pub fn with_greeting_reply(mut self, reply: impl Into<String>) -> Self {
        self.greeting_reply = reply.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_query_chars == 0 {
            return Err("max_query_chars must be at least 1".to_string());
        }
        if self.greeting_reply.trim().is_empty() {
            return Err("greeting_reply must not be empty".to_string());
        }
        Ok(())
    }
}
