//! HTTP boundary for chatrelay.
//!
//! Axum router with CORS and request tracing; the chat endpoints invoke
//! the pipeline's three operations and translate its errors to HTTP.

pub mod error;
pub mod handlers;
pub mod router;
