//! SSE stream framing.
//!
//! Contains the stateful [`SseParser`] that accumulates `event:`/`data:`
//! lines and emits a complete [`WireEvent`] at each blank-line boundary.
//! Payloads are not decoded here; the demultiplexer owns per-tag decoding.

use crate::sse::events::{EventTag, SseLine, WireEvent};

/// Classify a single SSE line.
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return SseLine::Comment(stripped.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(rest.trim().to_string());
    }

    // Unknown line format - treat as comment
    SseLine::Comment(line.to_string())
}

/// Stateful SSE parser that accumulates lines and emits complete events.
///
/// Events with a tag outside the search protocol (`metadata`, `row`, `done`,
/// `error`) are dropped at this layer, as are untagged data-only events
/// (the browser would deliver those under the default `message` tag, which
/// the search view never subscribes to).
#[derive(Debug, Default)]
pub struct SseParser {
    /// Tag name of the event being accumulated
    current_tag: Option<String>,
    /// Accumulated data lines (SSE allows multiple data: lines)
    data_buffer: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a line to the parser, potentially returning a complete event.
    ///
    /// Returns `Some(event)` when the blank-line boundary completes an event
    /// with a recognized tag, `None` otherwise.
    pub fn feed_line(&mut self, line: &str) -> Option<WireEvent> {
        match parse_sse_line(line) {
            SseLine::Event(tag) => {
                self.current_tag = Some(tag);
                None
            }
            SseLine::Data(data) => {
                self.data_buffer.push(data);
                None
            }
            SseLine::Empty => self.emit_event(),
            SseLine::Comment(_) => None,
        }
    }

    /// Emit the accumulated event, if any, at an event boundary.
    fn emit_event(&mut self) -> Option<WireEvent> {
        let tag_name = self.current_tag.take();
        let data = self.data_buffer.join("\n");
        self.data_buffer.clear();

        let tag_name = match tag_name {
            Some(name) => name,
            None => {
                if !data.is_empty() {
                    tracing::debug!(payload = %data, "dropping untagged SSE data");
                }
                return None;
            }
        };

        match EventTag::parse(&tag_name) {
            Some(tag) => Some(WireEvent::new(tag, data)),
            None => {
                tracing::debug!(tag = %tag_name, "ignoring unknown SSE event tag");
                None
            }
        }
    }

}
