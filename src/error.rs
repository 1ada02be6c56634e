//! Crate-level error type for the non-streaming API surface.
//!
//! Streaming failures stay inside [`SearchSession`](crate::session::SearchSession)
//! as state transitions and notices; this type covers the request/response
//! operations that do return errors to the caller.

use crate::source::SourceError;
use crate::traits::http::HttpError;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(#[from] HttpError),

    /// Stream transport failed.
    #[error("stream error: {0}")]
    Source(#[from] SourceError),

    /// Response body did not decode as the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
