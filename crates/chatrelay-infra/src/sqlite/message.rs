//! SQLite message store implementation.
//!
//! Implements `MessageStore` from `chatrelay-core` using sqlx with split
//! read/write pools: raw queries, a private Row struct, rfc3339 datetime
//! round-trip through TEXT columns.

use chatrelay_core::store::MessageStore;
use chatrelay_types::error::StoreError;
use chatrelay_types::message::{Message, Sender};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `MessageStore`.
pub struct SqliteMessageStore {
    pool: DatabasePool,
}

impl SqliteMessageStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Message.
struct MessageRow {
    id: String,
    session_id: String,
    sender: String,
    text: String,
    timestamp: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            sender: row.try_get("sender")?,
            text: row.try_get("text")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    fn into_message(self) -> Result<Message, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Query(format!("invalid message id: {e}")))?;
        let sender: Sender = self
            .sender
            .parse()
            .map_err(|e: String| StoreError::Query(e))?;
        let timestamp = parse_datetime(&self.timestamp)?;

        Ok(Message {
            id,
            session_id: self.session_id,
            sender,
            text: self.text,
            timestamp,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl MessageStore for SqliteMessageStore {
    async fn persist(&self, message: &Message) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO messages (id, session_id, sender, text, timestamp)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(&message.session_id)
        .bind(message.sender.to_string())
        .bind(&message.text)
        .bind(format_datetime(&message.timestamp))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    async fn load_history(&self, session_id: &str) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, session_id, sender, text, timestamp FROM messages
             WHERE session_id = ? ORDER BY timestamp ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row =
                MessageRow::from_row(row).map_err(|e| StoreError::Query(e.to_string()))?;
            messages.push(msg_row.into_message()?);
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn make_message(session_id: &str, sender: Sender, text: &str) -> Message {
        Message::new(session_id.to_string(), sender, text.to_string())
    }

    #[tokio::test]
    async fn test_persist_and_load_roundtrip() {
        let store = SqliteMessageStore::new(test_pool().await);

        let human = make_message("s1", Sender::Human, "hello");
        let reply = make_message("s1", Sender::Assistant, "Hi there");

        store.persist(&human).await.unwrap();
        store.persist(&reply).await.unwrap();

        let history = store.load_history("s1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, human.id);
        assert_eq!(history[0].sender, Sender::Human);
        assert_eq!(history[1].id, reply.id);
        assert_eq!(history[1].text, "Hi there");
    }

    #[tokio::test]
    async fn test_load_history_orders_by_timestamp() {
        let store = SqliteMessageStore::new(test_pool().await);

        let mut early = make_message("s1", Sender::Human, "first");
        early.timestamp = Utc::now() - chrono::Duration::seconds(60);
        let late = make_message("s1", Sender::Human, "second");

        // Insert newest first; replay must still come back ascending.
        store.persist(&late).await.unwrap();
        store.persist(&early).await.unwrap();

        let history = store.load_history("s1").await.unwrap();
        assert_eq!(history[0].text, "first");
        assert_eq!(history[1].text, "second");
    }

    #[tokio::test]
    async fn test_load_history_scoped_to_session() {
        let store = SqliteMessageStore::new(test_pool().await);

        store
            .persist(&make_message("s1", Sender::Human, "one"))
            .await
            .unwrap();
        store
            .persist(&make_message("s2", Sender::Human, "two"))
            .await
            .unwrap();

        let history = store.load_history("s1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text, "one");
    }

    #[tokio::test]
    async fn test_load_history_empty_session() {
        let store = SqliteMessageStore::new(test_pool().await);
        let history = store.load_history("missing").await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = SqliteMessageStore::new(test_pool().await);

        let msg = make_message("s1", Sender::Human, "hello");
        store.persist(&msg).await.unwrap();

        let result = store.persist(&msg).await;
        assert!(matches!(result, Err(StoreError::Query(_))));
    }
}
