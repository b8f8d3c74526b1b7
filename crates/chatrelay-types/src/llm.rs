//! Completion backend types for chatrelay.
//!
//! These model the data shapes crossing the backend port: the prompt
//! context handed to a provider and the events it streams back.

use serde::{Deserialize, Serialize};

use crate::message::Sender;

/// One line of prompt context sent to the completion backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Sender,
    pub content: String,
}

/// Events emitted during a streaming completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// An incremental fragment of generated text.
    TextDelta { text: String },

    /// The stream has completed.
    Done,
}

/// Errors from completion backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend error: {message}")]
    Provider { message: String },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_event_serde_tag() {
        let event = StreamEvent::TextDelta {
            text: "Hi".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"text_delta\""));

        let done = StreamEvent::Done;
        let json = serde_json::to_string(&done).unwrap();
        assert!(json.contains("\"type\":\"done\""));
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Provider {
            message: "HTTP 529: overloaded".to_string(),
        };
        assert!(err.to_string().contains("529"));
    }

    #[test]
    fn test_prompt_message_roles() {
        let prompt = PromptMessage {
            role: Sender::Human,
            content: "hello".to_string(),
        };
        let json = serde_json::to_string(&prompt).unwrap();
        assert!(json.contains("\"role\":\"human\""));
    }
}
