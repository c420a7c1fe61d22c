//! Core conversation types and the store trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => anyhow::bail!("Unknown conversation role: {other}"),
        }
    }
}

/// A single immutable turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A turn as persisted, with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTurn {
    pub id: i64,
    pub role: Role,
    pub content: String,
}

impl StoredTurn {
    pub fn turn(&self) -> ConversationTurn {
        ConversationTurn::new(self.role, self.content.clone())
    }
}

/// Append-only conversation store owned by the caller.
///
/// Insertion order is conversation order; ids increase monotonically.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Backend name (e.g., "sqlite", "memory")
    fn name(&self) -> &str;

    /// Append a turn and return its id.
    async fn append(&self, role: Role, content: &str) -> anyhow::Result<i64>;

    /// Append a user query and its answer as one unit.
    ///
    /// Either both turns are stored, with consecutive ids, or neither is.
    async fn append_exchange(&self, query: &str, answer: &str) -> anyhow::Result<(i64, i64)>;

    /// All turns in chronological order.
    async fn list_all(&self) -> anyhow::Result<Vec<StoredTurn>>;

    /// A single turn by id.
    async fn get(&self, id: i64) -> anyhow::Result<Option<StoredTurn>>;

    /// The most recent `limit` turns, oldest first.
    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<ConversationTurn>> {
        let all = self.list_all().await?;
        let skip = all.len().saturating_sub(limit);
        Ok(all.into_iter().skip(skip).map(|t| t.turn()).collect())
    }

    /// Number of stored turns.
    async fn count(&self) -> anyhow::Result<usize> {
        Ok(self.list_all().await?.len())
    }

    /// Health check: returns true if backend is operational.
    async fn health_check(&self) -> bool;
}
