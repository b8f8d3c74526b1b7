//! SSE streaming send endpoint.
//!
//! POST /api/send
//!
//! Appends the human message (rejecting invalid input before any stream
//! is opened), then streams the assistant reply as Server-Sent Events:
//! one `message` event per fragment, one terminal `message` event with
//! the completed reply, or an `error` event if the turn fails after
//! streaming began.
//!
//! The pipeline runs on its own task and hands events over a bounded
//! channel; when the client disconnects, axum drops the SSE stream, the
//! receiver closes, the sink reports closure, and the relay cancels the
//! backend call.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::Stream;

use chatrelay_core::backend::FragmentSink;
use chatrelay_types::error::{ChatError, SinkClosed};
use chatrelay_types::message::ChatEvent;

use crate::http::error::AppError;
use crate::state::AppState;

/// Request body for the send endpoint.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Existing session to continue; a fresh one is created if absent.
    pub session_id: Option<String>,
    /// The human message text.
    pub text: String,
}

/// Events crossing from the pipeline task to the SSE response stream.
enum SsePayload {
    /// A fragment or the completed reply (same wire shape).
    Event(ChatEvent),
    /// The turn failed after streaming began.
    Error(String),
}

/// Fragment sink bridging the relay to the SSE response channel.
struct ChannelSink {
    tx: mpsc::Sender<SsePayload>,
}

impl FragmentSink for ChannelSink {
    async fn send(&mut self, event: &ChatEvent) -> Result<(), SinkClosed> {
        self.tx
            .send(SsePayload::Event(event.clone()))
            .await
            .map_err(|_| SinkClosed)
    }
}

/// POST /api/send - append the human turn, then stream the reply.
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    // Validation and persistence failures surface as a plain error
    // response; no stream is opened for a failed append.
    let human = state
        .pipeline
        .append_human_message(body.session_id, &body.text)
        .await?;

    // Capacity 1: the relay buffers at most one in-flight fragment
    // beyond its accumulation buffer.
    let (tx, mut rx) = mpsc::channel::<SsePayload>(1);
    let pipeline = state.pipeline.clone();

    tokio::spawn(async move {
        let mut sink = ChannelSink { tx: tx.clone() };
        match pipeline.stream_reply(&human, &mut sink).await {
            Ok(reply) => {
                let _ = tx.send(SsePayload::Event(ChatEvent::from(&reply))).await;
            }
            Err(ChatError::Canceled) => {
                tracing::debug!(session_id = %human.session_id, "client disconnected mid-stream");
            }
            Err(err) => {
                tracing::warn!(session_id = %human.session_id, error = %err, "streaming turn failed");
                let _ = tx.send(SsePayload::Error(err.to_string())).await;
            }
        }
    });

    let sse_stream = async_stream::stream! {
        while let Some(payload) = rx.recv().await {
            let event = match payload {
                SsePayload::Event(chat_event) => Event::default()
                    .event("message")
                    .data(serde_json::to_string(&chat_event).unwrap_or_default()),
                SsePayload::Error(message) => Event::default()
                    .event("error")
                    .data(json!({ "message": message }).to_string()),
            };
            yield Ok::<_, Infallible>(event);
        }
    };

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
