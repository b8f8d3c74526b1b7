//! SQLite-backed implementation of the durable message store.

pub mod message;
pub mod pool;
