//! Mock event stream source for testing.
//!
//! Produces scripted wire-event streams and tracks open/close accounting so
//! tests can assert the at-most-one-live-transport and close-exactly-once
//! guarantees.

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::query::QueryDescriptor;
use crate::source::{EventStreamSource, SourceError, StreamHandle};
use crate::sse::WireEvent;

/// What one `open` call should produce.
pub enum ScriptedOutcome {
    /// Deliver the events, then end the transport.
    Finite(Vec<Result<WireEvent, SourceError>>),
    /// Deliver the events, then stay open indefinitely (live updates).
    Open(Vec<Result<WireEvent, SourceError>>),
    /// Fail the open call itself.
    FailOpen(SourceError),
}

/// Mock source: each `open` consumes the next scripted outcome.
///
/// When the script queue is empty, `open` yields a transport that stays open
/// and never delivers anything.
#[derive(Clone, Default)]
pub struct MockStreamSource {
    scripts: Arc<Mutex<VecDeque<ScriptedOutcome>>>,
    descriptors: Arc<Mutex<Vec<QueryDescriptor>>>,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    max_live: Arc<AtomicUsize>,
}

impl MockStreamSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome for the next `open` call.
    pub fn script(&self, outcome: ScriptedOutcome) {
        self.scripts.lock().unwrap().push_back(outcome);
    }

    /// Descriptors passed to `open`, in call order.
    pub fn opened_descriptors(&self) -> Vec<QueryDescriptor> {
        self.descriptors.lock().unwrap().clone()
    }

    /// Number of successful `open` calls.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of handle closes (each handle closes at most once).
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Handles currently open.
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// High-water mark of simultaneously open handles.
    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventStreamSource for MockStreamSource {
    async fn open(&self, descriptor: &QueryDescriptor) -> Result<StreamHandle, SourceError> {
        self.descriptors.lock().unwrap().push(descriptor.clone());

        let outcome = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScriptedOutcome::Open(Vec::new()));

        let events: crate::source::WireEventStream = match outcome {
            ScriptedOutcome::Finite(events) => Box::pin(stream::iter(events)),
            ScriptedOutcome::Open(events) => {
                Box::pin(stream::iter(events).chain(stream::pending()))
            }
            ScriptedOutcome::FailOpen(err) => return Err(err),
        };

        self.opens.fetch_add(1, Ordering::SeqCst);
        let now_live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(now_live, Ordering::SeqCst);

        let closes = Arc::clone(&self.closes);
        let live = Arc::clone(&self.live);
        Ok(StreamHandle::with_close_hook(events, move || {
            closes.fetch_add(1, Ordering::SeqCst);
            live.fetch_sub(1, Ordering::SeqCst);
        }))
    }
}

impl std::fmt::Debug for MockStreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStreamSource")
            .field("opens", &self.open_count())
            .field("closes", &self.close_count())
            .field("live", &self.live_count())
            .finish()
    }
}
