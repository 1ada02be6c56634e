//! The streaming search session manager.
//!
//! [`SearchSession`] owns at most one live search transport at a time and
//! runs the protocol state machine: `Idle → Connecting → Streaming →
//! {Closed | Failed}`. Submitting a query while another is live tears the
//! old transport down synchronously before the new one is requested, so no
//! two transports ever overlap and no trailing event of an old query can
//! bleed into a new one's results.
//!
//! Decoded events reach session state through an unbounded mpsc channel fed
//! by the demultiplexer's handlers; the session drains and applies them one
//! at a time, in arrival order, with no internal concurrency.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::demux::{Demultiplexer, SearchEvent};
use crate::query::{QueryDescriptor, QueryDescriptorBuilder, TimeWindow};
use crate::source::{EventStreamSource, StreamHandle};

/// Lifecycle states of a search session.
///
/// `Closed` and `Failed` are terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No query submitted yet.
    #[default]
    Idle,
    /// Transport opened, no event received yet.
    Connecting,
    /// At least one event received.
    Streaming,
    /// Terminal: stream completed normally (`done`) or caller closed.
    Closed,
    /// Terminal: transport or server error.
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }
}

/// Out-of-band notifications the caller may surface to the user.
///
/// Notices never carry control flow; the session has already transitioned
/// by the time one is observable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// Explicit `error` event received while the transport was open.
    /// `None` when the payload was absent or empty.
    ServerError(Option<String>),
    /// The transport failed (or ended) before a terminal tag arrived.
    TransportError(String),
    /// A `metadata` or `row` payload failed to decode; the event was
    /// skipped and the session continued.
    ProtocolError(String),
}

/// Owns one streaming query session at a time and aggregates its results.
pub struct SearchSession<S> {
    source: S,
    builder: QueryDescriptorBuilder,
    demux: Demultiplexer,
    handle: Option<StreamHandle>,
    state: SessionState,
    metadata: Vec<String>,
    rows: Vec<Value>,
    events_tx: mpsc::UnboundedSender<SearchEvent>,
    events_rx: mpsc::UnboundedReceiver<SearchEvent>,
    notice_tx: mpsc::UnboundedSender<SessionNotice>,
    notice_rx: Option<mpsc::UnboundedReceiver<SessionNotice>>,
}

impl<S: EventStreamSource> SearchSession<S> {
    /// Create a session manager. The client correlation token is generated
    /// here, once, and reused by every submission from this instance.
    pub fn new(source: S) -> Self {
        Self::with_builder(source, QueryDescriptorBuilder::new())
    }

    /// Create a session manager with pre-set query selections.
    pub fn with_builder(source: S, builder: QueryDescriptorBuilder) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        Self {
            source,
            builder,
            demux: Demultiplexer::new(),
            handle: None,
            state: SessionState::Idle,
            metadata: Vec::new(),
            rows: Vec::new(),
            events_tx,
            events_rx,
            notice_tx,
            notice_rx: Some(notice_rx),
        }
    }

    /// Take the notice receiver. Yields `Some` on the first call only.
    pub fn take_notices(&mut self) -> Option<mpsc::UnboundedReceiver<SessionNotice>> {
        self.notice_rx.take()
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Column headers from the most recent `metadata` event.
    pub fn metadata(&self) -> &[String] {
        &self.metadata
    }

    /// Rows received so far, in arrival order.
    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    /// The correlation token stamped on every descriptor this session
    /// submits.
    pub fn client_token(&self) -> &str {
        self.builder.client_token()
    }

    /// Query selections used by [`submit`](Self::submit).
    pub fn builder(&self) -> &QueryDescriptorBuilder {
        &self.builder
    }

    /// Change the context for subsequent submissions.
    pub fn set_context(&mut self, context: impl Into<String>) {
        self.builder = self.builder.clone().with_context(context);
    }

    /// Change the time window for subsequent submissions.
    pub fn set_time_window(&mut self, window: TimeWindow) {
        self.builder = self.builder.clone().with_time_window(window);
    }

    /// Enable or disable live updates for subsequent submissions.
    pub fn set_live_updates(&mut self, live: bool) {
        self.builder = self.builder.clone().with_live_updates(live);
    }

    pub fn is_streaming(&self) -> bool {
        self.state == SessionState::Streaming
    }

    /// Submit the given query text with the current selections.
    pub async fn submit(&mut self, query: impl Into<String>) {
        self.builder = self.builder.clone().with_query(query);
        let descriptor = self.builder.build();
        self.submit_descriptor(descriptor).await;
    }

    /// Submit a fully built descriptor.
    ///
    /// Any live session is torn down synchronously before the new transport
    /// is requested, and its aggregated metadata/rows are discarded. On a
    /// transport-level open failure the session transitions to `Failed` and
    /// a [`SessionNotice::TransportError`] is emitted; nothing is returned
    /// to the caller.
    pub async fn submit_descriptor(&mut self, descriptor: QueryDescriptor) {
        // Replace-before-open: release the old transport first so at most
        // one is ever live.
        self.teardown();

        // Fresh sequences for the new session; the old session's storage is
        // dropped, never reused.
        self.metadata = Vec::new();
        self.rows = Vec::new();

        // Discard any trailing events the old session left queued.
        while self.events_rx.try_recv().is_ok() {}

        match self.source.open(&descriptor).await {
            Ok(handle) => {
                self.handle = Some(handle);
                self.subscribe_handlers();
                self.state = SessionState::Connecting;
                tracing::debug!(token = %descriptor.client_token, "search session connecting");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to open search stream");
                self.notify(SessionNotice::TransportError(e.to_string()));
                self.state = SessionState::Failed;
            }
        }
    }

    /// Caller-invoked teardown, identical to the `done` path. Usable when
    /// the hosting view goes away independent of stream completion.
    pub fn close(&mut self) {
        self.teardown();
        if !self.state.is_terminal() {
            self.state = SessionState::Closed;
        }
    }

    /// Await the next wire event and apply it.
    ///
    /// Returns `true` while the session can still make progress, `false`
    /// once it is idle or terminal. Errors never escape: transport and
    /// protocol failures become state transitions and notices.
    pub async fn pump(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        let Some(handle) = self.handle.as_mut() else {
            return false;
        };

        match handle.next_event().await {
            Some(Ok(wire)) => {
                // First event of any tag marks the stream as live
                if self.state == SessionState::Connecting {
                    self.state = SessionState::Streaming;
                }
                if let Err(protocol) = self.demux.dispatch(&wire) {
                    tracing::warn!(error = %protocol, "skipping malformed search event");
                    self.notify(SessionNotice::ProtocolError(protocol.to_string()));
                }
                self.drain_events();
                !self.state.is_terminal()
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "search stream transport error");
                self.notify(SessionNotice::TransportError(e.to_string()));
                self.teardown();
                self.state = SessionState::Failed;
                false
            }
            None => {
                // Transport ended without a done event
                self.notify(SessionNotice::TransportError(
                    "stream ended before completion".to_string(),
                ));
                self.teardown();
                self.state = SessionState::Failed;
                false
            }
        }
    }

    /// Pump until the session reaches a terminal state (or has no
    /// transport). A live-updates query only terminates server- or
    /// caller-side, so this may run indefinitely for such streams.
    pub async fn run(&mut self) {
        while self.pump().await {}
    }

    /// Register the four tag handlers for the freshly opened transport.
    fn subscribe_handlers(&mut self) {
        let tx = self.events_tx.clone();
        self.demux.on_metadata(move |columns| {
            let _ = tx.send(SearchEvent::Metadata(columns));
        });
        let tx = self.events_tx.clone();
        self.demux.on_row(move |row| {
            let _ = tx.send(SearchEvent::Row(row));
        });
        let tx = self.events_tx.clone();
        self.demux.on_done(move || {
            let _ = tx.send(SearchEvent::Done);
        });
        let tx = self.events_tx.clone();
        self.demux.on_error(move |payload| {
            let _ = tx.send(SearchEvent::Error(payload));
        });
    }

    /// Apply queued decoded events in arrival order.
    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: SearchEvent) {
        // Terminal states accept nothing; anything still queued is a
        // late/duplicate notification.
        if self.state.is_terminal() {
            return;
        }
        match event {
            SearchEvent::Metadata(columns) => {
                // Wholesale replacement, never a merge
                self.metadata = columns;
            }
            SearchEvent::Row(row) => {
                if self.state == SessionState::Streaming {
                    self.rows.push(row);
                }
            }
            SearchEvent::Done => {
                self.teardown();
                self.state = SessionState::Closed;
                tracing::debug!(rows = self.rows.len(), "search stream completed");
            }
            SearchEvent::Error(payload) => {
                // An error on an already-closed transport is a late
                // duplicate of the done path; never re-enter teardown or
                // alert for it.
                if self.handle.as_ref().map_or(true, |h| h.is_closed()) {
                    tracing::debug!("ignoring error event on closed transport");
                    return;
                }
                tracing::error!(payload = ?payload, "search stream reported an error");
                self.notify(SessionNotice::ServerError(payload));
                self.teardown();
                self.state = SessionState::Failed;
            }
        }
    }

    /// The single teardown path shared by `done`, `error`, caller close,
    /// and session replacement. Handlers are detached first, then the
    /// transport is closed; both effects happen at most once per session.
    fn teardown(&mut self) {
        self.demux.unsubscribe_all();
        if let Some(mut handle) = self.handle.take() {
            handle.close();
        }
    }

    fn notify(&self, notice: SessionNotice) {
        // Receiver may be gone; notices are best-effort
        let _ = self.notice_tx.send(notice);
    }
}

impl<S> std::fmt::Debug for SearchSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("state", &self.state)
            .field("columns", &self.metadata.len())
            .field("rows", &self.rows.len())
            .finish()
    }
}
