//! Ollama completion backend.
//!
//! Drives the Ollama `/api/chat` endpoint in streaming mode and adapts
//! its newline-delimited JSON chunks to the provider-agnostic
//! `StreamEvent` enum.

mod client;
mod types;

pub use client::OllamaBackend;
