//! Mock implementations for testing.

pub mod http;
pub mod source;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use source::{MockStreamSource, ScriptedOutcome};
