//! Infrastructure layer for chatrelay.
//!
//! Contains implementations of the ports defined in `chatrelay-core`:
//! SQLite message storage and the Ollama completion backend, plus the
//! config loader.

pub mod config;
pub mod ollama;
pub mod sqlite;
