//! Concrete implementations of trait abstractions.
//!
//! Production adapters wrap third-party clients behind the traits defined in
//! `crate::traits` and `crate::source`, enabling dependency injection and
//! testability.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//!
//! # Mock implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - configurable HTTP responses and SSE streams
//! - [`mock::MockStreamSource`] - scripted wire-event streams with open/close
//!   accounting

pub mod mock;
pub mod reqwest_http;

pub use mock::{MockHttpClient, MockStreamSource};
pub use reqwest_http::ReqwestHttpClient;
