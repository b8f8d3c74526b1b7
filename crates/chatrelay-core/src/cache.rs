//! In-memory session history cache.
//!
//! One map from session id to its ordered message sequence, read-through
//! over the durable store (the pipeline owns the store fallback; the
//! cache itself never does IO). A single `RwLock` guards the map: reads
//! take the shared mode, appends and seeds take the exclusive mode.
//! The lock is only ever held for the bounded duration of a read or a
//! push, never across an await point.
//!
//! Consistency contract: every message visible here has already been
//! durably persisted. Callers append only after a successful persist and
//! seed only with rows read back from the store.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chatrelay_types::message::Message;

/// Session id -> ordered message history, for the process lifetime.
///
/// No eviction: entries live until the process exits. Explicitly owned
/// by the pipeline; constructed once at startup, no global state.
#[derive(Default)]
pub struct HistoryCache {
    histories: RwLock<HashMap<String, Vec<Message>>>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Message>>> {
        // A poisoned lock only means a reader/writer panicked mid-access;
        // appends are single pushes so the map is never logically torn.
        self.histories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Message>>> {
        self.histories
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot the cached history for a session, if one is loaded.
    ///
    /// Shared-mode read; never consults the store. `None` means "not yet
    /// loaded", which the pipeline treats as a store fallback trigger.
    pub fn get(&self, session_id: &str) -> Option<Vec<Message>> {
        self.read().get(session_id).cloned()
    }

    /// Append messages to a session's history, creating it if absent.
    ///
    /// Arrival order among concurrent appenders to the same session is
    /// preserved by the exclusive lock; no cross-session ordering is
    /// guaranteed or needed.
    pub fn append(&self, session_id: &str, messages: &[Message]) {
        let mut map = self.write();
        map.entry(session_id.to_string())
            .or_default()
            .extend_from_slice(messages);
    }

    /// Seed a session's history from a store reload.
    ///
    /// Only fills absent entries: if another request already loaded (or
    /// appended to) this session, the existing entry wins. Concurrent
    /// first-loads read identical store state, so the race is benign.
    pub fn seed(&self, session_id: &str, messages: Vec<Message>) {
        let mut map = self.write();
        map.entry(session_id.to_string()).or_insert(messages);
    }

    /// Number of sessions currently cached.
    pub fn session_count(&self) -> usize {
        self.read().len()
    }
}
