//! Prelude module for convenient imports.
//!
//! Re-exports the types most callers need to submit a search and consume
//! its results.
//!
//! # Usage
//!
//! ```ignore
//! use evq::prelude::*;
//! ```

// Session lifecycle
pub use crate::session::{SearchSession, SessionNotice, SessionState};

// Query construction
pub use crate::query::{QueryDescriptor, QueryDescriptorBuilder, TimeWindow};

// Stream transport
pub use crate::source::{EventStreamSource, SourceError, SseStreamSource, StreamHandle};

// Event decoding
pub use crate::demux::{Demultiplexer, ProtocolError, SearchEvent};
pub use crate::sse::{EventTag, WireEvent};

// HTTP plumbing
pub use crate::adapters::ReqwestHttpClient;
pub use crate::error::SearchError;
pub use crate::nodes::{fetch_nodes, NodeInfo};
pub use crate::traits::http::{HttpClient, HttpError};
