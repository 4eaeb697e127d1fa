//! Worker roles and the contracts they follow.
//!
//! - [`Reader`] (visitor): looks at random items under read admission.
//! - [`Writer`] (buyer): buys, and in restocking mode also restocks, under write admission.
//! - [`Diner`] (philosopher): eats with two utensils from a [`ResourceRing`](crate::ring::ResourceRing).
//!
//! Each worker is a plain blocking loop meant to run on its own thread. It reports
//! through [`Event`](crate::framework::Event)s while running and returns a
//! [`WorkerReport`] when it ends.

mod diner;
pub mod error;
mod reader;
mod writer;

pub use diner::Diner;
pub use error::*;
pub use reader::Reader;
pub use writer::{Writer, WriterMode};

use crate::coordinator::{Coordinator, CoordinatorError};
use crate::framework::{EventSender, ExitReason, Interrupted, Role, Shutdown};
use crate::inventory::ItemCollection;
use rand::Rng;
use serde::Serialize;
use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Duration;

/// Everything a reader or writer shares with the rest of the run.
#[derive(Clone)]
pub struct WorkerContext {
    pub inventory: Arc<ItemCollection>,
    pub coordinator: Arc<dyn Coordinator>,
    pub shutdown: Arc<Shutdown>,
    pub events: EventSender,
    /// Upper bound of the random pause between two operations. Zero disables it.
    pub pause: Duration,
}

impl WorkerContext {
    /// Sleeps for a random time up to `self.pause`, unless shutdown interrupts.
    fn pause(&self, rng: &mut impl Rng) -> Result<(), Interrupted> {
        if self.pause.is_zero() {
            return Ok(());
        }
        let millis = rng.gen_range(0..=self.pause.as_millis() as u64);
        self.shutdown.pause(Duration::from_millis(millis))
    }
}

/// Per-worker operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub reads: u64,
    pub decrements: u64,
    pub removals: u64,
    pub increments: u64,
    pub at_capacity: u64,
    pub anomalies: u64,
    pub meals: u64,
}

impl WorkerStats {
    /// Completed operations, whatever their kind.
    pub fn operations(&self) -> u64 {
        self.reads + self.decrements + self.increments + self.at_capacity + self.meals
    }
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, other: Self) {
        self.reads += other.reads;
        self.decrements += other.decrements;
        self.removals += other.removals;
        self.increments += other.increments;
        self.at_capacity += other.at_capacity;
        self.anomalies += other.anomalies;
        self.meals += other.meals;
    }
}

/// What a worker hands back when its loop ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub role: Role,
    pub worker: usize,
    pub stats: WorkerStats,
    pub exit: ExitReason,
}

/// Turns a failed `acquire_*` into the loop's exit reason, or a fatal error.
fn admission_exit(
    role: Role,
    worker: usize,
    error: CoordinatorError,
) -> Result<ExitReason, WorkerError> {
    match error {
        CoordinatorError::Cancelled => Ok(ExitReason::Cancelled),
        CoordinatorError::InvariantViolation(detail) => Err(WorkerError::InvariantViolation {
            role,
            worker,
            detail,
        }),
    }
}
