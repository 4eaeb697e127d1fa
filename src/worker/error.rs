//! Error types for the workers.

use crate::framework::Role;
use thiserror::Error;

/// Errors that end a worker and abort the whole run.
///
/// Everything recoverable (stale indices, cancellation, restocking at capacity) is
/// handled inside the worker loop and never shows up here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkerError {
    /// The coordinator admitted overlapping accesses.
    #[error("{role} {worker} observed an admission invariant violation: {detail}")]
    InvariantViolation {
        role: Role,
        worker: usize,
        detail: String,
    },
}
