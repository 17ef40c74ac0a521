//! Progress events and the sinks that receive them.
//!
//! Phases report through a [`ProgressEmitter`], which stamps each event with
//! the run ID and timestamp and hands it to an optional [`ProgressSink`].
//! A failing or panicking sink is logged and ignored; it can never abort
//! a phase.
//!
//! [`progress_channel`] creates a per-run channel pair, so a stream consumer
//! only ever sees events of its own run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::Phase;

// ============================================================================
// Events
// ============================================================================

/// Kind of a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventKind {
    Start,
    PhaseStart,
    Step,
    Success,
    Warning,
    Error,
    PhaseComplete,
    Complete,
}

/// One structured progress notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: ProgressEventKind,
    /// Phase wire name, e.g. `simple_evolution`.
    pub phase: String,
    pub message: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl ProgressEvent {
    /// Build an event stamped with the current time.
    pub fn now(kind: ProgressEventKind, phase: Phase, message: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            kind,
            phase: phase.as_str().to_string(),
            message: message.into(),
            timestamp: now.timestamp_micros() as f64 / 1_000_000.0,
            details: Map::new(),
        }
    }

    /// Merge a JSON object into `details`. Non-object values are ignored.
    pub fn with_details(mut self, details: Value) -> Self {
        if let Value::Object(map) = details {
            self.details.extend(map);
        }
        self
    }

    /// Look up one detail.
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Failure reported by a sink.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The receiving side is gone.
    #[error("progress receiver closed")]
    Closed,

    #[error("progress sink failed: {0}")]
    Failed(String),
}

/// Receiver of progress events.
pub trait ProgressSink: Send + Sync {
    /// Deliver one event. Must not block.
    fn emit(&self, event: ProgressEvent) -> Result<(), SinkError>;
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) -> Result<(), SinkError> {
        (self.0)(&event);
        Ok(())
    }
}

/// Sending half of a per-run progress channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) -> Result<(), SinkError> {
        self.tx.send(event).map_err(|_| SinkError::Closed)
    }
}

/// Receiving half of a per-run progress channel.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressReceiver {
    /// Next event, or `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// Drain whatever is already buffered.
    pub fn drain(&mut self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Consume the receiver as a stream of events.
    pub fn into_stream(self) -> impl Stream<Item = ProgressEvent> + Send + 'static {
        stream::unfold(self, |mut rx| async move {
            let event = rx.recv().await?;
            Some((event, rx))
        })
    }
}

/// Create a channel pair for one run.
///
/// Unbounded, so emitting never waits on a slow reader.
pub fn progress_channel() -> (ChannelSink, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx }, ProgressReceiver { rx })
}

// ============================================================================
// Emitter
// ============================================================================

/// Per-run event stamper wrapping an optional sink.
pub struct ProgressEmitter {
    sink: Option<Arc<dyn ProgressSink>>,
    run_id: Uuid,
    sink_failed: AtomicBool,
}

impl ProgressEmitter {
    /// Emitter for a new run.
    pub fn new(sink: Option<Arc<dyn ProgressSink>>) -> Self {
        Self {
            sink,
            run_id: Uuid::new_v4(),
            sink_failed: AtomicBool::new(false),
        }
    }

    /// Emitter that drops every event.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// ID stamped into every event's details as `run_id`.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Emit an event. Never fails.
    pub fn emit(&self, kind: ProgressEventKind, phase: Phase, message: impl Into<String>, details: Value) {
        let Some(sink) = &self.sink else {
            return;
        };

        let mut event = ProgressEvent::now(kind, phase, message).with_details(details);
        event
            .details
            .insert("run_id".to_string(), Value::String(self.run_id.to_string()));

        match catch_unwind(AssertUnwindSafe(|| sink.emit(event))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.report_failure(&err.to_string()),
            Err(_) => self.report_failure("sink panicked"),
        }
    }

    // First failure is a warning, repeats are debug noise.
    fn report_failure(&self, reason: &str) {
        if self.sink_failed.swap(true, Ordering::Relaxed) {
            debug!(run_id = %self.run_id, "Progress sink failed again: {}", reason);
        } else {
            warn!(run_id = %self.run_id, "Progress sink failed: {}", reason);
        }
    }

    pub fn start(&self, message: impl Into<String>, details: Value) {
        self.emit(ProgressEventKind::Start, Phase::Initialized, message, details);
    }

    pub fn phase_start(&self, phase: Phase, message: impl Into<String>, details: Value) {
        self.emit(ProgressEventKind::PhaseStart, phase, message, details);
    }

    pub fn step(&self, phase: Phase, message: impl Into<String>, details: Value) {
        self.emit(ProgressEventKind::Step, phase, message, details);
    }

    pub fn success(&self, phase: Phase, message: impl Into<String>, details: Value) {
        self.emit(ProgressEventKind::Success, phase, message, details);
    }

    pub fn warning(&self, phase: Phase, message: impl Into<String>, details: Value) {
        self.emit(ProgressEventKind::Warning, phase, message, details);
    }

    pub fn error(&self, phase: Phase, message: impl Into<String>, details: Value) {
        self.emit(ProgressEventKind::Error, phase, message, details);
    }

    pub fn phase_complete(&self, phase: Phase, message: impl Into<String>, details: Value) {
        self.emit(ProgressEventKind::PhaseComplete, phase, message, details);
    }

    pub fn complete(&self, message: impl Into<String>, details: Value) {
        self.emit(ProgressEventKind::Complete, Phase::Completed, message, details);
    }
}

impl std::fmt::Debug for ProgressEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressEmitter")
            .field("run_id", &self.run_id)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
