//! Structured events emitted by workers.
//!
//! Workers never print. Everything they do ends up as an [`Event`] on an unbounded
//! tokio channel; the driver decides how (and whether) to render it.

use crate::model::Item;
use crate::ring::DinerState;
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use tracing::trace;

/// Which contract a worker follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Reader,
    Writer,
    Diner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Reader => f.write_str("reader"),
            Role::Writer => f.write_str("writer"),
            Role::Diner => f.write_str("diner"),
        }
    }
}

/// Why a worker loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// The collection ran empty.
    Exhausted,
    /// Shutdown was triggered.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Read {
        worker: usize,
        index: usize,
        item: Item,
    },
    Purchased {
        worker: usize,
        index: usize,
        item: Item,
        removed: bool,
    },
    Restocked {
        worker: usize,
        index: usize,
        item: Item,
        at_capacity: bool,
    },
    /// A recoverable oddity, e.g. an index that went stale between check and access.
    Anomaly {
        role: Role,
        worker: usize,
        reason: String,
    },
    DinerTransition {
        diner: usize,
        state: DinerState,
    },
    WorkerFinished {
        role: Role,
        worker: usize,
        operations: u64,
        exit: ExitReason,
    },
}

pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Sending half handed to workers. Sending never blocks, so it is safe to call from
/// a blocking worker thread while holding admission.
#[derive(Debug, Clone)]
pub struct EventSender {
    inner: mpsc::UnboundedSender<Event>,
}

impl EventSender {
    pub fn emit(&self, event: Event) {
        // the driver may have stopped listening; workers keep going regardless
        if let Err(e) = self.inner.send(event) {
            trace!(event = ?e.0, "Event dropped, receiver closed");
        }
    }
}

pub fn channel() -> (EventSender, EventReceiver) {
    let (inner, receiver) = mpsc::unbounded_channel();
    (EventSender { inner }, receiver)
}
