//! Event stream sources and connection handles.
//!
//! An [`EventStreamSource`] opens one streaming search connection per call
//! and hands back a [`StreamHandle`]: exclusive ownership of the live
//! transport plus an idempotent `close`. The production source speaks SSE
//! over a streaming HTTP GET through the [`HttpClient`] trait.

use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use futures_util::StreamExt;
use std::pin::Pin;

use crate::query::QueryDescriptor;
use crate::sse::{SseParser, WireEvent};
use crate::traits::{Headers, HttpClient, HttpError};

/// Default base URL of the query engine's HTTP API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8024";

/// Path of the streaming search endpoint.
pub const SEARCH_PATH: &str = "/v1/search";

/// Error type for stream source operations.
///
/// Sources fail only at the transport layer; query semantics are validated
/// server-side and reported through the stream's `error` tag instead.
#[derive(Debug)]
pub enum SourceError {
    /// HTTP-level failure (connect, DNS, status, mid-stream IO)
    Http(HttpError),
    /// Non-HTTP transport failure (used by non-HTTP sources and tests)
    Transport { message: String },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Http(e) => write!(f, "HTTP error: {}", e),
            SourceError::Transport { message } => write!(f, "Transport error: {}", message),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Http(e) => Some(e),
            SourceError::Transport { .. } => None,
        }
    }
}

impl From<HttpError> for SourceError {
    fn from(e: HttpError) -> Self {
        SourceError::Http(e)
    }
}

/// A lazy, unbounded stream of framed wire events.
pub type WireEventStream = Pin<Box<dyn Stream<Item = Result<WireEvent, SourceError>> + Send>>;

/// Exclusively owned handle to one live streaming connection.
///
/// At most one live handle exists per session. `close` drops the underlying
/// transport and runs the close hook; both happen at most once no matter how
/// many times `close` is called (and dropping the handle closes it too).
pub struct StreamHandle {
    events: Option<WireEventStream>,
    on_close: Option<Box<dyn FnOnce() + Send>>,
}

impl StreamHandle {
    /// Wrap an event stream in a handle.
    pub fn new(events: WireEventStream) -> Self {
        Self {
            events: Some(events),
            on_close: None,
        }
    }

    /// Wrap an event stream and register a hook that runs exactly once when
    /// the handle is first closed.
    pub fn with_close_hook(events: WireEventStream, hook: impl FnOnce() + Send + 'static) -> Self {
        Self {
            events: Some(events),
            on_close: Some(Box::new(hook)),
        }
    }

    /// True once the handle has been closed.
    pub fn is_closed(&self) -> bool {
        self.events.is_none()
    }

    /// Await the next wire event. Returns `None` once the transport has
    /// ended or the handle was closed.
    pub async fn next_event(&mut self) -> Option<Result<WireEvent, SourceError>> {
        match self.events.as_mut() {
            Some(stream) => stream.next().await,
            None => None,
        }
    }

    /// Close the transport. Idempotent: closing an already-closed handle is
    /// a no-op, and the close hook runs at most once.
    pub fn close(&mut self) {
        if let Some(stream) = self.events.take() {
            drop(stream);
        }
        if let Some(hook) = self.on_close.take() {
            hook();
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("closed", &self.is_closed())
            .field("has_close_hook", &self.on_close.is_some())
            .finish()
    }
}

/// Trait for opening streaming search connections.
///
/// Each `open` yields a distinct handle and, server-side, a fresh query
/// evaluation; live-update continuation across re-queries is correlated via
/// the descriptor's `client_token`, not by reusing handles.
#[async_trait]
pub trait EventStreamSource: Send + Sync {
    async fn open(&self, descriptor: &QueryDescriptor) -> Result<StreamHandle, SourceError>;
}

/// Production stream source: SSE over a streaming HTTP GET.
#[derive(Debug, Clone)]
pub struct SseStreamSource<C> {
    http: C,
    base_url: String,
}

impl<C: HttpClient> SseStreamSource<C> {
    /// Create a source against [`DEFAULT_BASE_URL`].
    pub fn new(http: C) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a source against a custom base URL.
    pub fn with_base_url(http: C, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Base URL this source connects to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full search URL for a descriptor.
    pub fn search_url(&self, descriptor: &QueryDescriptor) -> String {
        format!(
            "{}{}?{}",
            self.base_url,
            SEARCH_PATH,
            descriptor.to_query_string()
        )
    }
}

#[async_trait]
impl<C: HttpClient> EventStreamSource for SseStreamSource<C> {
    async fn open(&self, descriptor: &QueryDescriptor) -> Result<StreamHandle, SourceError> {
        let url = self.search_url(descriptor);

        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());

        tracing::debug!(
            context = %descriptor.context,
            live_updates = descriptor.live_updates,
            "opening search stream"
        );

        let bytes_stream = self.http.get_stream(&url, &headers).await?;

        // Split the byte stream into lines, feed them through the stateful
        // SSE parser, and surface each completed wire event. The buffer is
        // raw bytes: chunk boundaries can fall inside a multi-byte UTF-8
        // character, so decoding happens per complete line, never per chunk.
        let event_stream = stream::unfold(
            (bytes_stream, SseParser::new(), Vec::<u8>::new()),
            |(mut bytes_stream, mut parser, mut buffer)| async move {
                loop {
                    // First, try to process any complete lines in the buffer
                    if let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                        let mut line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();
                        line_bytes.pop();
                        if line_bytes.last() == Some(&b'\r') {
                            line_bytes.pop();
                        }

                        let line = String::from_utf8_lossy(&line_bytes);
                        if let Some(event) = parser.feed_line(&line) {
                            return Some((Ok(event), (bytes_stream, parser, buffer)));
                        }
                        continue;
                    }

                    // Need more data from the stream
                    match bytes_stream.next().await {
                        Some(Ok(chunk)) => {
                            buffer.extend_from_slice(&chunk);
                            // Loop back to process the buffer
                        }
                        Some(Err(e)) => {
                            return Some((
                                Err(SourceError::Http(e)),
                                (bytes_stream, parser, buffer),
                            ));
                        }
                        None => {
                            // Transport ended - flush any trailing line and
                            // force the final event boundary
                            if !buffer.is_empty() {
                                let mut line_bytes = std::mem::take(&mut buffer);
                                if line_bytes.last() == Some(&b'\r') {
                                    line_bytes.pop();
                                }
                                let line = String::from_utf8_lossy(&line_bytes).into_owned();
                                if let Some(event) = parser.feed_line(&line) {
                                    return Some((Ok(event), (bytes_stream, parser, buffer)));
                                }
                            }
                            if let Some(event) = parser.feed_line("") {
                                return Some((Ok(event), (bytes_stream, parser, buffer)));
                            }
                            return None;
                        }
                    }
                }
            },
        );

        Ok(StreamHandle::new(Box::pin(event_stream)))
    }
}
