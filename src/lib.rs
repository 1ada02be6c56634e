//! evq - a streaming client for event-store ad-hoc search
//!
//! Connects to an event store's HTTP search endpoint, consumes the
//! Server-Sent Events result stream (`metadata`, `row`, `done`, `error`
//! tags), and manages the session lifecycle: at most one live query per
//! session, append-only row aggregation, and a single idempotent teardown
//! path shared by completion, failure, and caller close.

pub mod adapters;
pub mod demux;
pub mod error;
pub mod nodes;
pub mod prelude;
pub mod query;
pub mod session;
pub mod source;
pub mod sse;
pub mod traits;
