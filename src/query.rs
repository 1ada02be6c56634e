//! Outbound query descriptor construction.
//!
//! A [`QueryDescriptor`] carries everything the stream-open request needs.
//! Descriptors are immutable values: re-querying always builds a new one.
//! The [`QueryDescriptorBuilder`] holds the caller's current selections and
//! a client token generated once per builder, so successive live-update
//! re-queries from the same view correlate server-side.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default query context when the caller has not picked one.
pub const DEFAULT_CONTEXT: &str = "default";

/// Time window constraining the query, from the server-advertised set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeWindow {
    #[default]
    #[serde(rename = "Last hour")]
    LastHour,
    #[serde(rename = "Last 2 hours")]
    LastTwoHours,
    #[serde(rename = "Last day")]
    LastDay,
    #[serde(rename = "Last week")]
    LastWeek,
    #[serde(rename = "Custom")]
    Custom,
}

impl TimeWindow {
    /// The label as the query engine expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::LastHour => "Last hour",
            TimeWindow::LastTwoHours => "Last 2 hours",
            TimeWindow::LastDay => "Last day",
            TimeWindow::LastWeek => "Last week",
            TimeWindow::Custom => "Custom",
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for one streaming search request.
///
/// Immutable once constructed; a new submission always produces a new
/// descriptor value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Free-text filter/projection query, evaluated server-side.
    pub query: String,
    /// Context to search in; one of the server-advertised set, non-empty.
    pub context: String,
    /// Time window label.
    pub time_window: TimeWindow,
    /// Client correlation token, stable across re-queries from one builder.
    pub client_token: String,
    /// Keep the stream open for rows matching after the initial pass.
    pub live_updates: bool,
    /// Ask the server to evaluate against the cluster leader.
    pub force_read_from_leader: bool,
}

impl QueryDescriptor {
    /// Encode the descriptor as the search endpoint's URL query string.
    pub fn to_query_string(&self) -> String {
        format!(
            "query={}&context={}&timewindow={}&clienttoken={}&liveupdates={}&forcereadfromleader={}",
            urlencoding::encode(&self.query),
            urlencoding::encode(&self.context),
            urlencoding::encode(self.time_window.as_str()),
            urlencoding::encode(&self.client_token),
            self.live_updates,
            self.force_read_from_leader,
        )
    }
}

/// Generate a client correlation token: a random component plus a millisecond
/// timestamp component. Collision is treated as vanishingly unlikely, not a
/// correctness requirement.
pub fn generate_client_token() -> String {
    format!(
        "{}{:x}",
        Uuid::new_v4().simple(),
        chrono::Utc::now().timestamp_millis()
    )
}

/// Builder holding the caller's current selections.
///
/// The client token is generated once at construction and reused by every
/// [`build`](QueryDescriptorBuilder::build), never regenerated per query.
#[derive(Debug, Clone)]
pub struct QueryDescriptorBuilder {
    query: String,
    context: String,
    time_window: TimeWindow,
    client_token: String,
    live_updates: bool,
    force_read_from_leader: bool,
}

impl QueryDescriptorBuilder {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            context: DEFAULT_CONTEXT.to_string(),
            time_window: TimeWindow::default(),
            client_token: generate_client_token(),
            live_updates: true,
            force_read_from_leader: false,
        }
    }

    /// Set the query text (builder pattern).
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Set the active context (builder pattern).
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Set the time window (builder pattern).
    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = window;
        self
    }

    /// Enable or disable live updates (builder pattern).
    pub fn with_live_updates(mut self, live: bool) -> Self {
        self.live_updates = live;
        self
    }

    /// Force reads from the cluster leader (builder pattern).
    pub fn with_read_from_leader(mut self, force: bool) -> Self {
        self.force_read_from_leader = force;
        self
    }

    /// The token this builder stamps on every descriptor.
    pub fn client_token(&self) -> &str {
        &self.client_token
    }

    /// Produce an immutable descriptor from the current selections.
    pub fn build(&self) -> QueryDescriptor {
        QueryDescriptor {
            query: self.query.clone(),
            context: self.context.clone(),
            time_window: self.time_window,
            client_token: self.client_token.clone(),
            live_updates: self.live_updates,
            force_read_from_leader: self.force_read_from_leader,
        }
    }
}

impl Default for QueryDescriptorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window_labels() {
        assert_eq!(TimeWindow::LastHour.as_str(), "Last hour");
        assert_eq!(TimeWindow::LastTwoHours.as_str(), "Last 2 hours");
        assert_eq!(TimeWindow::LastDay.as_str(), "Last day");
        assert_eq!(TimeWindow::LastWeek.as_str(), "Last week");
        assert_eq!(TimeWindow::Custom.as_str(), "Custom");
    }

    #[test]
    fn test_time_window_default() {
        assert_eq!(TimeWindow::default(), TimeWindow::LastHour);
    }

    #[test]
    fn test_builder_defaults() {
        let descriptor = QueryDescriptorBuilder::new().build();
        assert_eq!(descriptor.query, "");
        assert_eq!(descriptor.context, DEFAULT_CONTEXT);
        assert_eq!(descriptor.time_window, TimeWindow::LastHour);
        assert!(descriptor.live_updates);
        assert!(!descriptor.force_read_from_leader);
        assert!(!descriptor.client_token.is_empty());
    }

    #[test]
    fn test_builder_chained_setters() {
        let descriptor = QueryDescriptorBuilder::new()
            .with_query(r#"payloadData contains "ACME""#)
            .with_context("billing")
            .with_time_window(TimeWindow::LastWeek)
            .with_live_updates(false)
            .with_read_from_leader(true)
            .build();

        assert_eq!(descriptor.query, r#"payloadData contains "ACME""#);
        assert_eq!(descriptor.context, "billing");
        assert_eq!(descriptor.time_window, TimeWindow::LastWeek);
        assert!(!descriptor.live_updates);
        assert!(descriptor.force_read_from_leader);
    }

    #[test]
    fn test_client_token_stable_across_builds() {
        let builder = QueryDescriptorBuilder::new().with_query("a");
        let first = builder.build();
        let builder = builder.with_query("b");
        let second = builder.build();

        assert!(!first.client_token.is_empty());
        assert_eq!(first.client_token, second.client_token);
        // New query text, same token: the descriptors are distinct values
        assert_ne!(first, second);
    }

    #[test]
    fn test_client_tokens_differ_between_builders() {
        let a = QueryDescriptorBuilder::new();
        let b = QueryDescriptorBuilder::new();
        assert_ne!(a.client_token(), b.client_token());
    }

    #[test]
    fn test_query_string_encoding() {
        let mut descriptor = QueryDescriptorBuilder::new()
            .with_query("aggregateSequenceNumber > 50")
            .with_context("default")
            .build();
        descriptor.client_token = "tok1".to_string();

        let qs = descriptor.to_query_string();
        assert!(qs.contains("query=aggregateSequenceNumber%20%3E%2050"));
        assert!(qs.contains("context=default"));
        assert!(qs.contains("timewindow=Last%20hour"));
        assert!(qs.contains("clienttoken=tok1"));
        assert!(qs.contains("liveupdates=true"));
        assert!(qs.contains("forcereadfromleader=false"));
    }

    #[test]
    fn test_descriptor_serde_roundtrip() {
        let descriptor = QueryDescriptorBuilder::new()
            .with_time_window(TimeWindow::LastTwoHours)
            .build();
        let json = serde_json::to_string(&descriptor).unwrap();
        assert!(json.contains("Last 2 hours"));
        let back: QueryDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, descriptor);
    }
}
