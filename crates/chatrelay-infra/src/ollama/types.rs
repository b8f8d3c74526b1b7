//! Request/response wire types for the Ollama chat API.

use serde::{Deserialize, Serialize};

use chatrelay_types::llm::{BackendError, PromptMessage};
use chatrelay_types::message::Sender;

/// Request body for POST /api/chat.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaChatMessage>,
    pub stream: bool,
}

impl OllamaChatRequest {
    pub fn new(model: &str, prompt: Vec<PromptMessage>) -> Self {
        Self {
            model: model.to_string(),
            messages: prompt.into_iter().map(OllamaChatMessage::from).collect(),
            stream: true,
        }
    }
}

/// One message line in the Ollama chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChatMessage {
    pub role: String,
    pub content: String,
}

impl From<PromptMessage> for OllamaChatMessage {
    fn from(prompt: PromptMessage) -> Self {
        // Ollama speaks OpenAI-style roles; the human turn maps to "user".
        let role = match prompt.role {
            Sender::Human => "user",
            Sender::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: prompt.content,
        }
    }
}

/// One NDJSON line of a streaming chat response.
///
/// Content chunks carry `message.content` with `done: false`; the final
/// line has `done: true`. Error lines carry only an `error` field.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaChatChunk {
    #[serde(default)]
    pub message: Option<OllamaResponseMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaResponseMessage {
    #[serde(default)]
    pub content: String,
}

impl OllamaChatChunk {
    pub fn content(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.content.as_str())
    }
}

/// Parse one NDJSON line into a chunk, surfacing in-band errors.
pub fn parse_chunk_line(line: &str) -> Result<OllamaChatChunk, BackendError> {
    let chunk: OllamaChatChunk = serde_json::from_str(line)
        .map_err(|e| BackendError::Deserialization(format!("bad chat chunk: {e}")))?;

    if let Some(error) = chunk.error {
        return Err(BackendError::Provider { message: error });
    }

    Ok(chunk)
}
