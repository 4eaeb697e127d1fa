use super::{DiningConfig, SimulationError};
use crate::framework::{self, Cancel, EventReceiver, Shutdown};
use crate::ring::ResourceRing;
use crate::worker::{Diner, WorkerReport};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

/// Orchestrator for one dining-philosophers run.
///
/// Diners never finish on their own; a run ends through [`shutdown`](Self::shutdown)
/// or [`run_for`](Self::run_for).
pub struct DiningSimulation {
    ring: Arc<ResourceRing>,
    shutdown: Arc<Shutdown>,
    handles: Vec<JoinHandle<WorkerReport>>,
}

/// Outcome of a finished dining run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiningSummary {
    /// Meals eaten, indexed by diner.
    pub meals: Vec<u64>,
    /// `true` when every utensil was back on the table after shutdown.
    pub all_free: bool,
}

impl DiningSummary {
    /// Diners that never got to eat.
    pub fn starved(&self) -> Vec<usize> {
        self.meals
            .iter()
            .enumerate()
            .filter(|(_, meals)| **meals == 0)
            .map(|(diner, _)| diner)
            .collect()
    }
}

impl DiningSimulation {
    /// Lays the table and seats every diner on its own blocking thread. Must be called
    /// from within a tokio runtime.
    #[instrument(skip_all, fields(diners = config.diners, ponder = config.ponder))]
    pub fn start(config: &DiningConfig) -> Result<(Self, EventReceiver), SimulationError> {
        config.validate()?;

        let ring = Arc::new(ResourceRing::new(config.diners));
        let shutdown = Arc::new(Shutdown::new());
        for utensil in ring.utensils() {
            shutdown.register(utensil.clone() as Arc<dyn Cancel>);
        }

        let (events, receiver) = framework::channel();
        let handles = (0..config.diners)
            .map(|id| {
                let diner = Diner::new(
                    id,
                    ring.clone(),
                    shutdown.clone(),
                    events.clone(),
                    config.ponder,
                );
                tokio::task::spawn_blocking(move || diner.run())
            })
            .collect();

        info!("Table set");
        Ok((
            Self {
                ring,
                shutdown,
                handles,
            },
            receiver,
        ))
    }

    pub fn ring(&self) -> &Arc<ResourceRing> {
        &self.ring
    }

    pub fn shutdown_handle(&self) -> Arc<Shutdown> {
        self.shutdown.clone()
    }

    /// Lets the diners go on for `duration`, then shuts the run down.
    pub async fn run_for(self, duration: Duration) -> Result<DiningSummary, SimulationError> {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.shutdown.triggered() => {}
        }
        self.shutdown().await
    }

    /// Interrupts every diner and waits until all of them have left the table.
    pub async fn shutdown(self) -> Result<DiningSummary, SimulationError> {
        info!("Clearing the table...");
        self.shutdown.trigger();

        let mut meals = vec![0; self.handles.len()];
        let mut failure = None;
        for handle in self.handles {
            match handle.await {
                Ok(report) => {
                    if let Some(slot) = meals.get_mut(report.worker) {
                        *slot = report.stats.meals;
                    }
                }
                Err(e) => {
                    error!("Diner task failed: {:?}", e);
                    failure.get_or_insert(SimulationError::WorkerPanicked(e.to_string()));
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let summary = DiningSummary {
            all_free: self.ring.all_free(),
            meals,
        };
        info!(
            total_meals = summary.meals.iter().sum::<u64>(),
            starved = summary.starved().len(),
            "Table cleared"
        );
        Ok(summary)
    }
}
