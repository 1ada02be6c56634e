//! Tagged-event demultiplexing and payload decoding.
//!
//! Sits between the SSE framing layer and the session: each [`WireEvent`]'s
//! textual JSON payload is decoded per tag and handed to the handler
//! registered for that tag. At most one handler per tag; detached tags drop
//! their events without error, which is what makes late `error` events after
//! teardown harmless.

use serde_json::Value;

use crate::sse::{EventTag, WireEvent};

/// Sentinel payload carried by the `done` event.
pub const DONE_SENTINEL: &str = "Done";

/// A wire event with its payload decoded per tag.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// Replacement column-name list.
    Metadata(Vec<String>),
    /// One decoded result row; shape is opaque to the session.
    Row(Value),
    /// Normal terminal signal.
    Done,
    /// Server-signaled error; `None` when the payload was absent or empty.
    Error(Option<String>),
}

/// A `metadata` or `row` payload that failed to decode as JSON.
///
/// Not session-ending: the demultiplexer reports it and the malformed event
/// is skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolError {
    /// Tag of the offending event.
    pub tag: EventTag,
    /// Decoder message.
    pub message: String,
    /// The raw payload, for diagnostics.
    pub payload: String,
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid '{}' payload: {} (payload: {})",
            self.tag, self.message, self.payload
        )
    }
}

impl std::error::Error for ProtocolError {}

/// Decode a wire event's payload into a typed [`SearchEvent`].
pub fn decode_event(wire: &WireEvent) -> Result<SearchEvent, ProtocolError> {
    match wire.tag {
        EventTag::Metadata => serde_json::from_str::<Vec<String>>(&wire.data)
            .map(SearchEvent::Metadata)
            .map_err(|e| ProtocolError {
                tag: EventTag::Metadata,
                message: e.to_string(),
                payload: wire.data.clone(),
            }),
        EventTag::Row => serde_json::from_str::<Value>(&wire.data)
            .map(SearchEvent::Row)
            .map_err(|e| ProtocolError {
                tag: EventTag::Row,
                message: e.to_string(),
                payload: wire.data.clone(),
            }),
        // The sentinel is informational; receipt of the tag alone terminates
        EventTag::Done => Ok(SearchEvent::Done),
        EventTag::Error => {
            let payload = wire.data.trim();
            if payload.is_empty() {
                Ok(SearchEvent::Error(None))
            } else {
                Ok(SearchEvent::Error(Some(payload.to_string())))
            }
        }
    }
}

/// Handler invoked with the decoded `metadata` column list.
pub type MetadataHandler = Box<dyn FnMut(Vec<String>) + Send>;
/// Handler invoked with one decoded row.
pub type RowHandler = Box<dyn FnMut(Value) + Send>;
/// Handler invoked on the normal terminal signal.
pub type DoneHandler = Box<dyn FnMut() + Send>;
/// Handler invoked with the server error payload, if any.
pub type ErrorHandler = Box<dyn FnMut(Option<String>) + Send>;

/// Per-tag handler registry for one stream handle.
///
/// Registration replaces any previous handler for the same tag, preserving
/// the one-handler-per-tag contract. [`unsubscribe_all`] is safe to call
/// repeatedly and after the transport is closed.
///
/// [`unsubscribe_all`]: Demultiplexer::unsubscribe_all
#[derive(Default)]
pub struct Demultiplexer {
    on_metadata: Option<MetadataHandler>,
    on_row: Option<RowHandler>,
    on_done: Option<DoneHandler>,
    on_error: Option<ErrorHandler>,
}

impl Demultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_metadata(&mut self, handler: impl FnMut(Vec<String>) + Send + 'static) {
        self.on_metadata = Some(Box::new(handler));
    }

    pub fn on_row(&mut self, handler: impl FnMut(Value) + Send + 'static) {
        self.on_row = Some(Box::new(handler));
    }

    pub fn on_done(&mut self, handler: impl FnMut() + Send + 'static) {
        self.on_done = Some(Box::new(handler));
    }

    pub fn on_error(&mut self, handler: impl FnMut(Option<String>) + Send + 'static) {
        self.on_error = Some(Box::new(handler));
    }

    /// Decode a wire event and invoke the handler registered for its tag.
    ///
    /// Returns `Ok(true)` if a handler consumed the event, `Ok(false)` if no
    /// handler is registered for the tag (the event is dropped), and
    /// `Err(ProtocolError)` if the payload failed to decode. Decode failures
    /// do not reach handlers.
    pub fn dispatch(&mut self, wire: &WireEvent) -> Result<bool, ProtocolError> {
        let event = decode_event(wire)?;
        let handled = match event {
            SearchEvent::Metadata(columns) => match self.on_metadata.as_mut() {
                Some(handler) => {
                    handler(columns);
                    true
                }
                None => false,
            },
            SearchEvent::Row(row) => match self.on_row.as_mut() {
                Some(handler) => {
                    handler(row);
                    true
                }
                None => false,
            },
            SearchEvent::Done => match self.on_done.as_mut() {
                Some(handler) => {
                    handler();
                    true
                }
                None => false,
            },
            SearchEvent::Error(payload) => match self.on_error.as_mut() {
                Some(handler) => {
                    handler(payload);
                    true
                }
                None => false,
            },
        };
        Ok(handled)
    }

    /// Detach every handler. Safe to call multiple times and after the
    /// underlying transport is already closed.
    pub fn unsubscribe_all(&mut self) {
        self.on_metadata = None;
        self.on_row = None;
        self.on_done = None;
        self.on_error = None;
    }
}

impl std::fmt::Debug for Demultiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Demultiplexer")
            .field("metadata", &self.on_metadata.is_some())
            .field("row", &self.on_row.is_some())
            .field("done", &self.on_done.is_some())
            .field("error", &self.on_error.is_some())
            .finish()
    }
}
