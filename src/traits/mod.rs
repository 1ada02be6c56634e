//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (GET, streaming GET)
//! - [`crate::source::EventStreamSource`] - opening search event streams

pub mod http;

pub use http::{ByteStream, Headers, HttpClient, HttpError, Response};
