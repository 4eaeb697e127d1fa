//! Error types for the coordinators.

use thiserror::Error;

/// Errors that can come out of an `acquire_*` call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    /// The coordinator was cancelled while (or before) the caller waited.
    /// No admission is held when this is returned.
    #[error("Admission cancelled")]
    Cancelled,

    /// Two admissions overlapped in a way the policy forbids. Fatal for the run.
    #[error("Admission invariant violated: {0}")]
    InvariantViolation(String),
}

/// Returned when parsing a [`Policy`](super::Policy) name fails.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown policy '{0}', expected one of: exclusive, reader-preferring, writer-preferring, polling")]
pub struct ParsePolicyError(pub String);
