use super::{admission_exit, WorkerContext, WorkerError, WorkerReport, WorkerStats};
use crate::coordinator::WriteAdmission;
use crate::framework::{Event, ExitReason, Role};
use crate::inventory::{InventoryError, Restock};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// What a writer does with the item it picks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriterMode {
    /// Always take one unit.
    #[default]
    Buy,
    /// Flip a coin between taking one unit and adding one.
    Restock,
}

/// The buyer: mutates random items until the collection is empty.
pub struct Writer {
    id: usize,
    mode: WriterMode,
    context: WorkerContext,
}

impl Writer {
    pub fn new(id: usize, mode: WriterMode, context: WorkerContext) -> Self {
        Self { id, mode, context }
    }

    /// Runs the writer loop on the current thread. Same re-validation rule as
    /// [`Reader::run`](super::Reader::run), under write admission.
    #[instrument(name = "writer", skip(self), fields(worker = self.id, mode = ?self.mode))]
    pub fn run(self) -> Result<WorkerReport, WorkerError> {
        let ctx = &self.context;
        let mut rng = rand::thread_rng();
        let mut stats = WorkerStats::default();
        debug!("Started");

        let exit = loop {
            if ctx.shutdown.is_triggered() {
                break ExitReason::Cancelled;
            }
            if ctx.inventory.is_empty() {
                break ExitReason::Exhausted;
            }

            let admission = match WriteAdmission::acquire(ctx.coordinator.as_ref()) {
                Ok(admission) => admission,
                Err(e) => break admission_exit(Role::Writer, self.id, e)?,
            };

            let size = ctx.inventory.size();
            if size == 0 {
                break ExitReason::Exhausted;
            }
            let index = rng.gen_range(0..size);
            let restock = self.mode == WriterMode::Restock && rng.gen_bool(0.5);
            let outcome = if restock {
                self.restock(index, &mut stats)
            } else {
                self.buy(index, &mut stats)
            };
            if let Err(e) = outcome {
                stats.anomalies += 1;
                ctx.events.emit(Event::Anomaly {
                    role: Role::Writer,
                    worker: self.id,
                    reason: e.to_string(),
                });
            }
            drop(admission);

            if ctx.pause(&mut rng).is_err() {
                break ExitReason::Cancelled;
            }
        };

        debug!(
            ?exit,
            decrements = stats.decrements,
            increments = stats.increments,
            "Finished"
        );
        ctx.events.emit(Event::WorkerFinished {
            role: Role::Writer,
            worker: self.id,
            operations: stats.operations(),
            exit,
        });
        Ok(WorkerReport {
            role: Role::Writer,
            worker: self.id,
            stats,
            exit,
        })
    }

    fn buy(&self, index: usize, stats: &mut WorkerStats) -> Result<(), InventoryError> {
        let purchase = self.context.inventory.decrement_or_remove(index)?;
        stats.decrements += 1;
        if purchase.removed {
            stats.removals += 1;
        }
        self.context.events.emit(Event::Purchased {
            worker: self.id,
            index,
            item: purchase.item,
            removed: purchase.removed,
        });
        Ok(())
    }

    fn restock(&self, index: usize, stats: &mut WorkerStats) -> Result<(), InventoryError> {
        let (item, at_capacity) = match self.context.inventory.increment(index)? {
            Restock::Incremented(item) => {
                stats.increments += 1;
                (item, false)
            }
            Restock::AtCapacity(item) => {
                stats.at_capacity += 1;
                (item, true)
            }
        };
        self.context.events.emit(Event::Restocked {
            worker: self.id,
            index,
            item,
            at_capacity,
        });
        Ok(())
    }
}
