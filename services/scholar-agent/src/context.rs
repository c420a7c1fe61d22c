//! Conversation context handed to one agent run.
//!
//! A read-only, bounded view of the caller's history. Only the most recent
//! turns are kept; they decide the prompt mode and fill the follow-up
//! template's context block.

use scholar_memory::{ConversationTurn, Role};

/// Turns kept by default (the last three exchanges).
pub const DEFAULT_CONTEXT_WINDOW: usize = 6;

/// The most recent turns of a conversation, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationContext {
    turns: Vec<ConversationTurn>,
}

impl ConversationContext {
    /// Keep the last `window` turns of `history`.
    pub fn new(history: impl IntoIterator<Item = ConversationTurn>, window: usize) -> Self {
        let mut turns: Vec<ConversationTurn> = history.into_iter().collect();
        let skip = turns.len().saturating_sub(window);
        turns.drain(..skip);
        Self { turns }
    }

    /// Context with the default window.
    pub fn recent(history: impl IntoIterator<Item = ConversationTurn>) -> Self {
        Self::new(history, DEFAULT_CONTEXT_WINDOW)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render as `User: ...` / `Assistant: ...` lines for the prompt.
    pub fn format(&self) -> String {
        self.turns
            .iter()
            .map(|turn| {
                let speaker = match turn.role {
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                };
                format!("{speaker}: {}", turn.content.trim())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
