//! Stream events from concurrent generation producers, and the pump that applies them.
//!
//! Producers never touch a [Session] directly. They send [StreamEvent]s over a tokio channel;
//! [pump] applies them one at a time through a [SessionHandle], which is the single
//! serialization point for the graph.

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
    sync::Arc,
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    error::StreamError,
    ids::{NodeId, StreamId},
    session::Session,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamDelta {
    Text(String),
    /// The producer has delivered its last delta.
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub node_id: NodeId,
    pub stream_id: StreamId,
    pub delta: StreamDelta,
}

impl StreamEvent {
    pub fn text(node_id: NodeId, stream_id: StreamId, text: impl Into<String>) -> Self {
        StreamEvent {
            node_id,
            stream_id,
            delta: StreamDelta::Text(text.into()),
        }
    }

    pub fn done(node_id: NodeId, stream_id: StreamId) -> Self {
        StreamEvent {
            node_id,
            stream_id,
            delta: StreamDelta::Done,
        }
    }
}

impl Display for StreamEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match &self.delta {
            StreamDelta::Text(text) => write!(
                f,
                "Text({} chars) {} @ {}",
                text.chars().count(),
                self.node_id,
                self.stream_id
            ),
            StreamDelta::Done => write!(f, "Done {} @ {}", self.node_id, self.stream_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Applied,
    Finished,
    /// The producer should stop: its stream was superseded or canceled.
    Rejected(StreamError),
}

impl Session {
    pub fn apply_event(&mut self, event: &StreamEvent) -> StreamOutcome {
        match &event.delta {
            StreamDelta::Text(text) => {
                match self.apply_delta(&event.node_id, &event.stream_id, text) {
                    Ok(()) => StreamOutcome::Applied,
                    Err(err) => StreamOutcome::Rejected(err),
                }
            }
            StreamDelta::Done => {
                self.finish_stream(&event.node_id, &event.stream_id);
                StreamOutcome::Finished
            }
        }
    }
}

/// Shared, lockable access to one [Session].
#[derive(Debug, Clone)]
pub struct SessionHandle(Arc<Mutex<Session>>);

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        SessionHandle(Arc::new(Mutex::new(session)))
    }

    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.0.lock()
    }

    pub fn apply(&self, event: &StreamEvent) -> StreamOutcome {
        self.0.lock().apply_event(event)
    }
}

impl From<Session> for SessionHandle {
    fn from(session: Session) -> Self {
        SessionHandle::new(session)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PumpSummary {
    pub applied: usize,
    pub finished: usize,
    pub rejected: usize,
    /// Events skipped because their stream had already been rejected.
    pub dropped: usize,
}

/// Stream ids the pump has rejected and whose producer has not yet sent its `Done`.
#[derive(Debug, Default)]
struct RejectedStreams(BTreeSet<StreamId>);

impl RejectedStreams {
    fn reject(&mut self, stream_id: StreamId) {
        self.0.insert(stream_id);
    }

    /// Whether `event` belongs to a rejected stream. A `Done` closes the stream, so its id is
    /// forgotten.
    fn drops(&mut self, event: &StreamEvent) -> bool {
        match event.delta {
            StreamDelta::Done => self.0.remove(&event.stream_id),
            StreamDelta::Text(_) => self.0.contains(&event.stream_id),
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Apply events until every sender is dropped.
///
/// Once a stream is rejected, later events carrying the same stream id are dropped without
/// taking the lock. The rejected ids are held only until that stream's `Done` arrives.
pub async fn pump(handle: SessionHandle, mut rx: UnboundedReceiver<StreamEvent>) -> PumpSummary {
    let mut summary = PumpSummary::default();
    let mut rejected = RejectedStreams::default();

    while let Some(event) = rx.recv().await {
        if rejected.drops(&event) {
            summary.dropped += 1;
            continue;
        }
        match handle.apply(&event) {
            StreamOutcome::Applied => summary.applied += 1,
            StreamOutcome::Finished => summary.finished += 1,
            StreamOutcome::Rejected(err) => {
                tracing::debug!("[pump] stopping {}: {err}", event.stream_id);
                summary.rejected += 1;
                rejected.reject(event.stream_id);
            }
        }
    }

    tracing::debug!(
        "[pump] channel closed: {summary:?}, {} streams never sent Done",
        rejected.len()
    );
    summary
}
