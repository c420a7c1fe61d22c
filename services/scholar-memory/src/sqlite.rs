//! SQLite-backed conversation history.
//!
//! One row per turn in the `history` table. Every call opens its own
//! connection inside `spawn_blocking`, so the store is cheap to share
//! between concurrent requests.

use crate::traits::{ConversationStore, ConversationTurn, Role, StoredTurn};
use anyhow::Context;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    role TEXT NOT NULL,
    content TEXT NOT NULL
);
"#;

/// SQLite conversation store.
pub struct SqliteConversationStore {
    db_path: PathBuf,
}

impl SqliteConversationStore {
    /// Open (and initialize if needed) the database at `db_path`.
    ///
    /// Parent directories are created.
    pub fn new(db_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open {}", db_path.display()))?;
        conn.execute_batch(SCHEMA)?;

        tracing::debug!(path = %db_path.display(), "Conversation history ready");

        Ok(Self { db_path })
    }

    /// Database file path.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn row_to_turn(id: i64, role: String, content: String) -> anyhow::Result<StoredTurn> {
        Ok(StoredTurn {
            id,
            role: role.parse::<Role>()?,
            content,
        })
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, role: Role, content: &str) -> anyhow::Result<i64> {
        let db_path = self.db_path.clone();
        let content = content.to_string();

        tokio::task::spawn_blocking(move || -> anyhow::Result<i64> {
            let conn = Connection::open(&db_path)?;
            conn.execute(
                "INSERT INTO history (role, content) VALUES (?1, ?2)",
                params![role.as_str(), content],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await?
    }

    async fn append_exchange(&self, query: &str, answer: &str) -> anyhow::Result<(i64, i64)> {
        let db_path = self.db_path.clone();
        let query = query.to_string();
        let answer = answer.to_string();

        tokio::task::spawn_blocking(move || -> anyhow::Result<(i64, i64)> {
            let mut conn = Connection::open(&db_path)?;
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO history (role, content) VALUES (?1, ?2)",
                params![Role::User.as_str(), query],
            )?;
            let user_id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO history (role, content) VALUES (?1, ?2)",
                params![Role::Assistant.as_str(), answer],
            )?;
            let assistant_id = tx.last_insert_rowid();
            tx.commit().context("Failed to commit exchange")?;
            Ok((user_id, assistant_id))
        })
        .await?
    }

    async fn list_all(&self) -> anyhow::Result<Vec<StoredTurn>> {
        let db_path = self.db_path.clone();

        tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<StoredTurn>> {
            let conn = Connection::open(&db_path)?;
            let mut stmt = conn.prepare("SELECT id, role, content FROM history ORDER BY id ASC")?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;

            let mut turns = Vec::new();
            for row in rows {
                let (id, role, content) = row?;
                turns.push(Self::row_to_turn(id, role, content)?);
            }
            Ok(turns)
        })
        .await?
    }

    async fn get(&self, id: i64) -> anyhow::Result<Option<StoredTurn>> {
        let db_path = self.db_path.clone();

        tokio::task::spawn_blocking(move || -> anyhow::Result<Option<StoredTurn>> {
            let conn = Connection::open(&db_path)?;
            let row = conn
                .query_row(
                    "SELECT id, role, content FROM history WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()?;

            row.map(|(id, role, content)| Self::row_to_turn(id, role, content))
                .transpose()
        })
        .await?
    }

    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<ConversationTurn>> {
        let db_path = self.db_path.clone();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<ConversationTurn>> {
            let conn = Connection::open(&db_path)?;
            let mut stmt = conn.prepare(
                "SELECT id, role, content FROM (
                    SELECT id, role, content FROM history ORDER BY id DESC LIMIT ?1
                 ) ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;

            let mut turns = Vec::new();
            for row in rows {
                let (id, role, content) = row?;
                turns.push(Self::row_to_turn(id, role, content)?.turn());
            }
            Ok(turns)
        })
        .await?
    }

    async fn count(&self) -> anyhow::Result<usize> {
        let db_path = self.db_path.clone();

        tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
            let conn = Connection::open(&db_path)?;
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await?
    }

    async fn health_check(&self) -> bool {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            Connection::open(&db_path)
                .and_then(|conn| conn.execute_batch("SELECT 1"))
                .is_ok()
        })
        .await
        .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, SqliteConversationStore) {
        let tmp = TempDir::new().unwrap();
        let store = SqliteConversationStore::new(tmp.path().join("conversation_history.db")).unwrap();
        (tmp, store)
    }

    #[tokio::test]
    async fn append_and_list_preserves_order() {
        let (_tmp, store) = temp_store();
        let first = store.append(Role::User, "quantum error correction").await.unwrap();
        let second = store.append(Role::Assistant, "Summary...").await.unwrap();
        assert!(second > first);

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].role, Role::User);
        assert_eq!(all[0].content, "quantum error correction");
        assert_eq!(all[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn append_exchange_stores_both_turns() {
        let (_tmp, store) = temp_store();
        store.append(Role::User, "earlier").await.unwrap();

        let (user_id, assistant_id) = store.append_exchange("q", "a").await.unwrap();
        assert_eq!(assistant_id, user_id + 1);

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!((all[1].role, all[1].content.as_str()), (Role::User, "q"));
        assert_eq!((all[2].role, all[2].content.as_str()), (Role::Assistant, "a"));
    }

    #[tokio::test]
    async fn failed_answer_insert_rolls_back_the_query() {
        let (_tmp, store) = temp_store();
        Connection::open(store.path())
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_answers BEFORE INSERT ON history
                 WHEN NEW.role = 'assistant'
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let err = store.append_exchange("q", "a").await.unwrap_err();
        assert!(format!("{err:#}").contains("disk full"));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recent_returns_tail_oldest_first() {
        let (_tmp, store) = temp_store();
        for i in 0..5 {
            store.append(Role::User, &format!("q{i}")).await.unwrap();
            store.append(Role::Assistant, &format!("a{i}")).await.unwrap();
        }

        let recent = store.recent(3).await.unwrap();
        assert_eq!(
            recent,
            vec![
                ConversationTurn::assistant("a3"),
                ConversationTurn::user("q4"),
                ConversationTurn::assistant("a4"),
            ]
        );
    }

    #[tokio::test]
    async fn get_by_id() {
        let (_tmp, store) = temp_store();
        let id = store.append(Role::Assistant, "## Report").await.unwrap();

        let turn = store.get(id).await.unwrap().unwrap();
        assert_eq!(turn.content, "## Report");
        assert!(store.get(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn count_and_health() {
        let (_tmp, store) = temp_store();
        assert_eq!(store.count().await.unwrap(), 0);
        store.append(Role::User, "hi").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.health_check().await);
        assert_eq!(store.name(), "sqlite");
    }

    #[tokio::test]
    async fn reopening_keeps_history() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("history.db");
        {
            let store = SqliteConversationStore::new(&path).unwrap();
            store.append(Role::User, "persisted").await.unwrap();
        }
        let store = SqliteConversationStore::new(&path).unwrap();
        assert_eq!(store.list_all().await.unwrap()[0].content, "persisted");
    }

    #[tokio::test]
    async fn unknown_role_is_an_error() {
        let (_tmp, store) = temp_store();
        let conn = Connection::open(store.path()).unwrap();
        conn.execute(
            "INSERT INTO history (role, content) VALUES ('system', 'x')",
            [],
        )
        .unwrap();
        assert!(store.list_all().await.is_err());
    }
}
