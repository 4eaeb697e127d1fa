//! Error types for the simulation lifecycle.

use crate::inventory::InventoryError;
use crate::worker::WorkerError;
use thiserror::Error;

/// Rejected configurations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Items start with zero units, which would leave zero-quantity items in the collection.
    #[error("Initial quantity must be at least 1")]
    ZeroQuantity,

    /// A dining table needs at least one seat.
    #[error("At least one diner is required")]
    NoDiners,
}

/// Errors that abort a run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid stock: {0}")]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// A worker thread panicked or was aborted.
    #[error("Worker task failed: {0}")]
    WorkerPanicked(String),
}
