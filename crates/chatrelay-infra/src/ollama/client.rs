//! OllamaBackend -- concrete [`CompletionBackend`] implementation.
//!
//! Sends streaming chat requests to an Ollama server's `/api/chat`
//! endpoint. The response is newline-delimited JSON: one object per
//! generated chunk, a final object with `done: true`, and in-band
//! `{"error": ...}` objects on failure.
//!
//! Dropping the returned stream aborts the in-flight HTTP request, which
//! is how client-disconnect cancellation propagates to the backend.

use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};

use chatrelay_core::backend::CompletionBackend;
use chatrelay_types::llm::{BackendError, PromptMessage, StreamEvent};

use super::types::{parse_chunk_line, OllamaChatRequest};

/// Ollama completion backend.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new backend against the given Ollama server.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Server root (e.g., "http://localhost:11434")
    /// * `model` - Model identifier (e.g., "llama3")
    pub fn new(base_url: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // 5 min timeout for long generations
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl CompletionBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn stream(
        &self,
        prompt: Vec<PromptMessage>,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, BackendError>> + Send + 'static>> {
        let client = self.client.clone();
        let url = self.url("/api/chat");
        let body = OllamaChatRequest::new(&self.model, prompt);

        Box::pin(async_stream::try_stream! {
            let response = client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| BackendError::Provider {
                    message: format!("HTTP request failed: {e}"),
                })?;

            let status = response.status();
            if !status.is_success() {
                let error_body = response.text().await.unwrap_or_default();
                Err(BackendError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                })?;
                return;
            }

            let mut bytes = response.bytes_stream();
            let mut line_buf = String::new();

            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| BackendError::Stream(e.to_string()))?;
                line_buf.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = line_buf.find('\n') {
                    let line: String = line_buf.drain(..=pos).collect();
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let parsed = parse_chunk_line(line)?;
                    if let Some(content) = parsed.content() {
                        if !content.is_empty() {
                            yield StreamEvent::TextDelta {
                                text: content.to_string(),
                            };
                        }
                    }
                    if parsed.done {
                        break 'read;
                    }
                }
            }

            yield StreamEvent::Done;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_name() {
        let backend = OllamaBackend::new("http://localhost:11434".to_string(), "llama3".to_string());
        assert_eq!(backend.name(), "ollama");
        assert_eq!(backend.model(), "llama3");
    }

    #[test]
    fn test_url_building_strips_trailing_slash() {
        let backend = OllamaBackend::new("http://localhost:11434/".to_string(), "llama3".to_string());
        assert_eq!(backend.url("/api/chat"), "http://localhost:11434/api/chat");
    }
}
