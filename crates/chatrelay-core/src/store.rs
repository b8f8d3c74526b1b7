//! MessageStore trait definition.
//!
//! The durable store port consumed by the pipeline. Implementations live
//! in chatrelay-infra (e.g., `SqliteMessageStore`). Uses native async fn
//! in traits (RPITIT, Rust 2024 edition).

use chatrelay_types::error::StoreError;
use chatrelay_types::message::Message;

/// Append-only persistence of messages per session; source of truth on
/// cold start.
///
/// Each call is atomic from the core's point of view: the store provides
/// its own internal serialization and no transaction ever spans calls.
pub trait MessageStore: Send + Sync {
    /// Durably append one message. Returns only after the write is
    /// confirmed; the pipeline caches a message strictly after this
    /// succeeds.
    fn persist(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Replay the full history for a session, ordered by timestamp
    /// ascending. The core never queries partial ranges.
    fn load_history(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, StoreError>> + Send;
}
