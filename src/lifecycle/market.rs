use super::{MarketConfig, SimulationError};
use crate::coordinator::{Coordinator, Instrumented, Policy};
use crate::framework::{self, EventReceiver, ExitReason, Role, Shutdown};
use crate::inventory::ItemCollection;
use crate::model::IdSequence;
use crate::worker::{Reader, WorkerContext, WorkerError, WorkerReport, WorkerStats, Writer};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

/// Orchestrator for one readers-writers run.
///
/// `MarketSimulation` is responsible for:
/// - **Wiring**: one [`ItemCollection`], one instrumented coordinator of the configured
///   policy, one [`Shutdown`] latch and the event channel, shared by every worker
/// - **Spawning**: each reader and writer runs on its own blocking thread
/// - **Shutdown**: [`join`](Self::join) waits for the collection to run dry,
///   [`shutdown`](Self::shutdown) cancels first and then waits
///
/// # Example
///
/// ```ignore
/// let (sim, mut events) = MarketSimulation::start(&MarketConfig::default())?;
/// tokio::spawn(async move { while let Some(event) = events.recv().await { /* render */ } });
/// let summary = sim.join().await?;
/// assert_eq!(summary.items_left, 0);
/// ```
pub struct MarketSimulation {
    inventory: Arc<ItemCollection>,
    coordinator: Arc<Instrumented>,
    shutdown: Arc<Shutdown>,
    initial_total: u64,
    handles: Vec<JoinHandle<Result<WorkerReport, WorkerError>>>,
}

/// Outcome of a finished market run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSummary {
    pub policy: Policy,
    pub items_left: usize,
    pub initial_total: u64,
    pub remaining_total: u64,
    pub totals: WorkerStats,
    pub peak_readers: usize,
    pub cancelled_workers: usize,
    pub reports: Vec<WorkerReport>,
}

impl MarketSummary {
    /// `initial + restocked == remaining + bought`.
    pub fn conserved(&self) -> bool {
        self.initial_total + self.totals.increments == self.remaining_total + self.totals.decrements
    }

    /// Reports of one role only.
    pub fn reports_for(&self, role: Role) -> impl Iterator<Item = &WorkerReport> {
        self.reports.iter().filter(move |r| r.role == role)
    }
}

impl MarketSimulation {
    /// Builds the shared state and spawns every worker. Must be called from within a
    /// tokio runtime.
    #[instrument(skip_all, fields(policy = %config.policy))]
    pub fn start(config: &MarketConfig) -> Result<(Self, EventReceiver), SimulationError> {
        config.validate()?;

        let ids = IdSequence::new();
        let inventory = ItemCollection::generate(&ids, config.items, config.quantity)?;
        let inventory = Arc::new(inventory);
        let initial_total = inventory.total_quantity();

        let coordinator = Arc::new(Instrumented::new(config.policy.build()));
        let shutdown = Arc::new(Shutdown::new());
        shutdown.register(coordinator.clone());

        let (events, receiver) = framework::channel();
        let context = WorkerContext {
            inventory: inventory.clone(),
            coordinator: coordinator.clone(),
            shutdown: shutdown.clone(),
            events,
            pause: config.pause(),
        };

        let mut handles = Vec::with_capacity(config.readers + config.writers);
        for id in 0..config.readers {
            let reader = Reader::new(id, context.clone());
            let shutdown = shutdown.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                abort_on_error(&shutdown, reader.run())
            }));
        }
        for id in 0..config.writers {
            let writer = Writer::new(id, config.mode, context.clone());
            let shutdown = shutdown.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                abort_on_error(&shutdown, writer.run())
            }));
        }

        info!(
            items = config.items,
            readers = config.readers,
            writers = config.writers,
            mode = ?config.mode,
            "Market started"
        );

        Ok((
            Self {
                inventory,
                coordinator,
                shutdown,
                initial_total,
                handles,
            },
            receiver,
        ))
    }

    pub fn inventory(&self) -> &Arc<ItemCollection> {
        &self.inventory
    }

    /// Latch that cancels this run when triggered, e.g. from a signal handler or timer.
    pub fn shutdown_handle(&self) -> Arc<Shutdown> {
        self.shutdown.clone()
    }

    /// Cancels every worker and waits for all of them.
    pub async fn shutdown(self) -> Result<MarketSummary, SimulationError> {
        info!("Shutting down market...");
        self.shutdown.trigger();
        self.join().await
    }

    /// Waits for every worker to end on its own (empty collection) or through the
    /// shutdown latch.
    ///
    /// A worker reporting an invariant violation cancels the rest of the run and the
    /// first such error is returned once everybody has stopped.
    pub async fn join(self) -> Result<MarketSummary, SimulationError> {
        let mut reports = Vec::with_capacity(self.handles.len());
        let mut failure: Option<SimulationError> = None;

        for handle in self.handles {
            match handle.await {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(e)) => {
                    error!(error = %e, "Worker aborted the run");
                    self.shutdown.trigger();
                    failure.get_or_insert(SimulationError::Worker(e));
                }
                Err(e) => {
                    error!("Worker task failed: {:?}", e);
                    self.shutdown.trigger();
                    failure.get_or_insert(SimulationError::WorkerPanicked(e.to_string()));
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let mut totals = WorkerStats::default();
        for report in &reports {
            totals += report.stats;
        }
        let summary = MarketSummary {
            policy: self.coordinator.policy(),
            items_left: self.inventory.size(),
            initial_total: self.initial_total,
            remaining_total: self.inventory.total_quantity(),
            totals,
            peak_readers: self.coordinator.peak_readers(),
            cancelled_workers: reports
                .iter()
                .filter(|r| r.exit == ExitReason::Cancelled)
                .count(),
            reports,
        };

        info!(
            items_left = summary.items_left,
            reads = summary.totals.reads,
            decrements = summary.totals.decrements,
            anomalies = summary.totals.anomalies,
            "Market finished"
        );
        Ok(summary)
    }
}

/// A fatal worker error stops everybody else right away, not when `join` gets to it.
fn abort_on_error(
    shutdown: &Shutdown,
    result: Result<WorkerReport, WorkerError>,
) -> Result<WorkerReport, WorkerError> {
    if result.is_err() {
        shutdown.trigger();
    }
    result
}
