use super::{admission_exit, WorkerContext, WorkerError, WorkerReport, WorkerStats};
use crate::coordinator::ReadAdmission;
use crate::framework::{Event, ExitReason, Role};
use rand::Rng;
use tracing::{debug, instrument};

/// The visitor: browses random items until the collection is empty.
pub struct Reader {
    id: usize,
    context: WorkerContext,
}

impl Reader {
    pub fn new(id: usize, context: WorkerContext) -> Self {
        Self { id, context }
    }

    /// Runs the reader loop on the current thread.
    ///
    /// The size is checked once without admission to decide whether to keep going,
    /// and again under admission before choosing an index; only the second check
    /// is trusted.
    #[instrument(name = "reader", skip(self), fields(worker = self.id))]
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

            let admission = match ReadAdmission::acquire(ctx.coordinator.as_ref()) {
                Ok(admission) => admission,
                Err(e) => break admission_exit(Role::Reader, self.id, e)?,
            };

            let size = ctx.inventory.size();
            if size == 0 {
                break ExitReason::Exhausted;
            }
            let index = rng.gen_range(0..size);
            match ctx.inventory.get(index) {
                Ok(item) => {
                    stats.reads += 1;
                    ctx.events.emit(Event::Read {
                        worker: self.id,
                        index,
                        item,
                    });
                }
                Err(e) => {
                    stats.anomalies += 1;
                    ctx.events.emit(Event::Anomaly {
                        role: Role::Reader,
                        worker: self.id,
                        reason: e.to_string(),
                    });
                }
            }
            drop(admission);

            if ctx.pause(&mut rng).is_err() {
                break ExitReason::Cancelled;
            }
        };

        debug!(?exit, reads = stats.reads, "Finished");
        ctx.events.emit(Event::WorkerFinished {
            role: Role::Reader,
            worker: self.id,
            operations: stats.operations(),
            exit,
        });
        Ok(WorkerReport {
            role: Role::Reader,
            worker: self.id,
            stats,
            exit,
        })
    }
}
