use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;

use super::error::ServiceError;
use super::types::Turn;

pub const DEFAULT_HISTORY_CAPACITY: u64 = 10_000;
pub const DEFAULT_HISTORY_MAX_TURNS: usize = 20;
pub const DEFAULT_HISTORY_IDLE: Duration = Duration::from_secs(60 * 60);

/// Ordered prior turns per conversation.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn turns(&self, conversation_id: &str) -> Result<Vec<Turn>, ServiceError>;

    async fn append(&self, conversation_id: &str, turn: Turn) -> Result<(), ServiceError>;
}

/// Bounded in-process history: LRU over conversations, capped turns per conversation,
/// idle conversations expire.
#[derive(Clone)]
pub struct InMemoryHistory {
    conversations: Cache<String, Arc<Vec<Turn>>>,
    max_turns: usize,
}

impl std::fmt::Debug for InMemoryHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryHistory")
            .field("conversations", &self.conversations.entry_count())
            .field("max_turns", &self.max_turns)
            .finish()
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY, DEFAULT_HISTORY_MAX_TURNS)
    }
}

impl InMemoryHistory {
    pub fn new(capacity: u64, max_turns: usize) -> Self {
        Self::with_idle(capacity, max_turns, DEFAULT_HISTORY_IDLE)
    }

    pub fn with_idle(capacity: u64, max_turns: usize, idle: Duration) -> Self {
        Self {
            conversations: Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(idle)
                .build(),
            max_turns: max_turns.max(1),
        }
    }
}

#[async_trait]
impl HistoryProvider for InMemoryHistory {
    async fn turns(&self, conversation_id: &str) -> Result<Vec<Turn>, ServiceError> {
        Ok(self
            .conversations
            .get(conversation_id)
            .map(|turns| turns.as_ref().clone())
            .unwrap_or_default())
    }

    async fn append(&self, conversation_id: &str, turn: Turn) -> Result<(), ServiceError> {
        let max_turns = self.max_turns;
        self.conversations
            .entry(conversation_id.to_string())
            .and_upsert_with(|existing| {
                let mut turns = existing
                    .map(|entry| entry.into_value().as_ref().clone())
                    .unwrap_or_default();
                turns.push(turn.clone());
                let overflow = turns.len().saturating_sub(max_turns);
                turns.drain(..overflow);
                Arc::new(turns)
            });
        Ok(())
    }
}
