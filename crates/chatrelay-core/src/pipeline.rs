//! Session pipeline orchestrating persistence, caching, and streaming.
//!
//! Composes the history cache, the durable store, and the completion
//! relay. The one invariant everything here serves: a message becomes
//! visible in the cache only after its persist call has returned
//! successfully (write-then-cache, never cache-then-write).
//!
//! Generic over `MessageStore` and `CompletionBackend` so the core never
//! depends on chatrelay-infra.

use chatrelay_types::error::ChatError;
use chatrelay_types::message::{Message, Sender};
use uuid::Uuid;

use crate::backend::{CompletionBackend, FragmentSink};
use crate::cache::HistoryCache;
use crate::relay::CompletionRelay;
use crate::store::MessageStore;

/// Orchestrates the chat session pipeline.
///
/// Owns the cache outright; the store and backend are the two external
/// collaborators behind ports.
pub struct ChatPipeline<S: MessageStore, B: CompletionBackend> {
    cache: HistoryCache,
    store: S,
    backend: B,
}

impl<S: MessageStore, B: CompletionBackend> ChatPipeline<S, B> {
    pub fn new(store: S, backend: B) -> Self {
        Self {
            cache: HistoryCache::new(),
            store,
            backend,
        }
    }

    /// Access the cache (read-only introspection, e.g. for stats).
    pub fn cache(&self) -> &HistoryCache {
        &self.cache
    }

    /// Persist a message, then make it visible in the cache.
    ///
    /// On persist failure the cache is untouched and the error is
    /// terminal for the request.
    async fn commit(&self, message: Message) -> Result<Message, ChatError> {
        self.store.persist(&message).await?;
        self.cache
            .append(&message.session_id, std::slice::from_ref(&message));
        Ok(message)
    }

    /// Resolve a session's full history: cache hit, or store reload
    /// seeding the cache.
    ///
    /// The cache lock is never held across the store await; a concurrent
    /// first-load for the same session is benign (identical values, seed
    /// fills absent entries only).
    async fn session_history(&self, session_id: &str) -> Result<Vec<Message>, ChatError> {
        if let Some(history) = self.cache.get(session_id) {
            return Ok(history);
        }

        let loaded = self.store.load_history(session_id).await?;
        self.cache.seed(session_id, loaded);

        // Re-read so a racing append between load and seed is reflected.
        Ok(self.cache.get(session_id).unwrap_or_default())
    }

    /// Accept an inbound human message: validate, stamp, persist, cache.
    ///
    /// A missing or empty session id gets a freshly generated one; the
    /// returned message carries it for the client to continue the
    /// session.
    pub async fn append_human_message(
        &self,
        session_id: Option<String>,
        text: &str,
    ) -> Result<Message, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::Validation("message text is empty".to_string()));
        }

        let session_id = match session_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => Uuid::now_v7().to_string(),
        };

        let message = Message::new(session_id, Sender::Human, text.to_string());
        self.commit(message).await
    }

    /// Stream the assistant reply for a just-appended human message.
    ///
    /// Reads the session's full history (which already contains the
    /// human turn: persistence strictly precedes this call), relays the
    /// completion to `sink` fragment by fragment, then commits the
    /// assembled reply with the same persist-before-cache ordering.
    pub async fn stream_reply<F: FragmentSink>(
        &self,
        human: &Message,
        sink: &mut F,
    ) -> Result<Message, ChatError> {
        let mut history = self.session_history(&human.session_id).await?;
        // The relay appends the human turn itself; drop it from the prior
        // context so the prompt carries it exactly once.
        history.retain(|m| m.id != human.id);

        let relay = CompletionRelay::new(&self.backend);
        let reply = relay.stream_reply(&history, human, sink).await?;

        tracing::debug!(
            session_id = %human.session_id,
            reply_bytes = reply.text.len(),
            "completion stream finished, committing reply"
        );

        self.commit(reply).await
    }

    /// Read-only retrieval: cached history, or store reload on miss.
    pub async fn get_history(&self, session_id: &str) -> Result<Vec<Message>, ChatError> {
        self.session_history(session_id).await
    }
}
