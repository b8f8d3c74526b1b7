use thiserror::Error;

use crate::llm::BackendError;

/// Errors from the durable message store (implemented in chatrelay-infra).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),
}

/// Terminal per-request error from the session pipeline.
///
/// Every failure surfaces to the caller exactly once; nothing is
/// logged-and-swallowed inside the core. A cache miss is not an error,
/// it is the trigger for a store fallback load.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("stream canceled by client")]
    Canceled,
}

/// The downstream fragment consumer has gone away.
///
/// Returned by a fragment sink when the client disconnects; the relay
/// reacts by dropping the backend stream and reporting `ChatError::Canceled`.
#[derive(Debug, Error)]
#[error("fragment sink closed")]
pub struct SinkClosed;
