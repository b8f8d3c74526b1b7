//! Shared domain types for chatrelay.
//!
//! Messages, the wire event shape, completion backend types, and the
//! error taxonomy. This crate has no IO dependencies.

pub mod error;
pub mod llm;
pub mod message;
