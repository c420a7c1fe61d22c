//! Process-local conversation store.

use crate::traits::{ConversationStore, Role, StoredTurn};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Conversation store kept in memory for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryConversationStore {
    turns: RwLock<Vec<StoredTurn>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, role: Role, content: &str) -> anyhow::Result<i64> {
        let mut turns = self.turns.write().await;
        let id = turns.last().map_or(1, |t| t.id + 1);
        turns.push(StoredTurn {
            id,
            role,
            content: content.to_string(),
        });
        Ok(id)
    }

    async fn append_exchange(&self, query: &str, answer: &str) -> anyhow::Result<(i64, i64)> {
        let mut turns = self.turns.write().await;
        let user_id = turns.last().map_or(1, |t| t.id + 1);
        turns.push(StoredTurn {
            id: user_id,
            role: Role::User,
            content: query.to_string(),
        });
        turns.push(StoredTurn {
            id: user_id + 1,
            role: Role::Assistant,
            content: answer.to_string(),
        });
        Ok((user_id, user_id + 1))
    }

    async fn list_all(&self) -> anyhow::Result<Vec<StoredTurn>> {
        Ok(self.turns.read().await.clone())
    }

    async fn get(&self, id: i64) -> anyhow::Result<Option<StoredTurn>> {
        Ok(self.turns.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn count(&self) -> anyhow::Result<usize> {
        Ok(self.turns.read().await.len())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
