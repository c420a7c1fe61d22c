//! Scholar Memory - conversation history for the research assistant.
//!
//! The agent core only ever reads a bounded window of recent turns; the
//! caller owns the store and appends turns once a run has finished.
//!
//! Backends:
//! - SQLite (`history` table, one row per turn)
//! - In-memory (tests and throwaway sessions)

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod in_memory;
pub mod sqlite;
pub mod traits;

pub use in_memory::InMemoryConversationStore;
pub use sqlite::SqliteConversationStore;
pub use traits::{ConversationStore, ConversationTurn, Role, StoredTurn};
