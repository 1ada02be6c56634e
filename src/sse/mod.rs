//! SSE framing for the search event stream.
//!
//! Split into event type definitions and the stateful line parser, mirroring
//! the tag set the query engine emits: `metadata`, `row`, `done`, `error`.

pub mod events;
pub mod parser;

pub use events::{EventTag, SseLine, WireEvent};
pub use parser::{parse_sse_line, SseParser};
