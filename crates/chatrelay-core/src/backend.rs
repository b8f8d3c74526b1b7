//! CompletionBackend and FragmentSink trait definitions.
//!
//! `CompletionBackend` is the opaque streaming token source the relay
//! drives; implementations live in chatrelay-infra (e.g., `OllamaBackend`).
//! The `stream` method returns a boxed stream so backends stay
//! object-safe behind generics without leaking concrete stream types.
//!
//! `FragmentSink` is the narrow capability the relay needs from the
//! transport: something that accepts ordered text fragments and can
//! report that the downstream client has gone away.

use std::pin::Pin;

use futures_util::Stream;

use chatrelay_types::error::SinkClosed;
use chatrelay_types::llm::{BackendError, PromptMessage, StreamEvent};
use chatrelay_types::message::ChatEvent;

/// Streaming completion backend port.
pub trait CompletionBackend: Send + Sync {
    /// Human-readable backend name (e.g., "ollama").
    fn name(&self) -> &str;

    /// Start one streaming completion over the given prompt context.
    ///
    /// Dropping the returned stream cancels the underlying call and
    /// releases its resources; the relay relies on this when the client
    /// disconnects mid-stream.
    fn stream(
        &self,
        prompt: Vec<PromptMessage>,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, BackendError>> + Send + 'static>>;
}

/// Consumer of ordered fragments for one live client.
///
/// `send` resolves once the fragment is handed to the transport, giving
/// the relay at most one in-flight fragment of buffering. An `Err`
/// means the client disconnected; the relay must stop streaming.
pub trait FragmentSink: Send {
    fn send(
        &mut self,
        event: &ChatEvent,
    ) -> impl std::future::Future<Output = Result<(), SinkClosed>> + Send;
}
