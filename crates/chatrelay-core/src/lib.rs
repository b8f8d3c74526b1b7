//! Session pipeline core for chatrelay.
//!
//! This crate defines the "ports" (store and backend traits) that the
//! infrastructure layer implements, plus the three pieces with real
//! invariants: the session history cache, the completion relay, and the
//! pipeline that composes them. It depends only on `chatrelay-types`,
//! never on `chatrelay-infra` or any database/HTTP crate.

pub mod backend;
pub mod cache;
pub mod pipeline;
pub mod relay;
pub mod store;
