//! SSE wire-level event types for the search stream.
//!
//! The search endpoint emits four tagged event kinds. At this layer the
//! payload is still the raw `data:` text; per-tag JSON decoding happens in
//! the demultiplexer.

/// Tags the search endpoint is allowed to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTag {
    /// Column-name list for the current result shape.
    Metadata,
    /// One result row.
    Row,
    /// Normal end of the stream (sentinel payload `"Done"`).
    Done,
    /// Server-signaled error, payload may be empty.
    Error,
}

impl EventTag {
    /// Parse a wire tag name. Unknown tags return `None` and are skipped
    /// upstream rather than treated as errors.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "metadata" => Some(EventTag::Metadata),
            "row" => Some(EventTag::Row),
            "done" => Some(EventTag::Done),
            "error" => Some(EventTag::Error),
            _ => None,
        }
    }

    /// The tag name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventTag::Metadata => "metadata",
            EventTag::Row => "row",
            EventTag::Done => "done",
            EventTag::Error => "error",
        }
    }
}

impl std::fmt::Display for EventTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete tagged event as framed by the SSE parser, payload undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireEvent {
    pub tag: EventTag,
    /// Raw `data:` payload text. Empty when the event carried no data lines.
    pub data: String,
}

impl WireEvent {
    pub fn new(tag: EventTag, data: impl Into<String>) -> Self {
        Self {
            tag,
            data: data.into(),
        }
    }
}

/// One classified line of an SSE stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event type declaration (`event: row`)
    Event(String),
    /// Data payload (`data: {"x":1}`)
    Data(String),
    /// Empty line - signals end of event
    Empty,
    /// Comment / keepalive line (starts with ':')
    Comment(String),
}
