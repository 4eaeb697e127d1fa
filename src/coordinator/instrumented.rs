use super::{AdmissionState, Coordinator, CoordinatorError, Policy};
use crate::framework::Cancel;
use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
use std::sync::Arc;
use tracing::error;

/// Wraps a coordinator and checks, on every admission, that no write admission
/// overlaps another admission.
///
/// The counters live outside the wrapped monitor. Entering increments its own counter
/// before reading the other one; leaving decrements before the wrapped release. With
/// `SeqCst` on both sides two overlapping admissions cannot both miss each other.
///
/// A detected overlap undoes the admission and returns
/// [`CoordinatorError::InvariantViolation`].
pub struct Instrumented {
    inner: Arc<dyn Coordinator>,
    readers: AtomicUsize,
    writers: AtomicUsize,
    peak_readers: AtomicUsize,
    violations: AtomicUsize,
}

impl Instrumented {
    pub fn new(inner: Arc<dyn Coordinator>) -> Self {
        Self {
            inner,
            readers: AtomicUsize::new(0),
            writers: AtomicUsize::new(0),
            peak_readers: AtomicUsize::new(0),
            violations: AtomicUsize::new(0),
        }
    }

    /// Number of overlaps detected so far.
    pub fn violations(&self) -> usize {
        self.violations.load(SeqCst)
    }

    /// Highest number of simultaneously admitted readers seen.
    pub fn peak_readers(&self) -> usize {
        self.peak_readers.load(SeqCst)
    }

    fn violation(&self, detail: String) -> CoordinatorError {
        self.violations.fetch_add(1, SeqCst);
        error!(
            policy = %self.inner.policy(),
            detail = detail.as_str(),
            "Admission invariant violated"
        );
        CoordinatorError::InvariantViolation(detail)
    }
}

impl Coordinator for Instrumented {
    fn policy(&self) -> Policy {
        self.inner.policy()
    }

    fn acquire_read(&self) -> Result<(), CoordinatorError> {
        self.inner.acquire_read()?;
        let readers = self.readers.fetch_add(1, SeqCst) + 1;
        let writers = self.writers.load(SeqCst);
        if writers > 0 {
            self.readers.fetch_sub(1, SeqCst);
            self.inner.release_read();
            return Err(self.violation(format!(
                "read admitted while {writers} writer(s) held admission"
            )));
        }
        self.peak_readers.fetch_max(readers, SeqCst);
        Ok(())
    }

    fn release_read(&self) {
        self.readers.fetch_sub(1, SeqCst);
        self.inner.release_read();
    }

    fn acquire_write(&self) -> Result<(), CoordinatorError> {
        self.inner.acquire_write()?;
        let others = self.writers.fetch_add(1, SeqCst);
        let readers = self.readers.load(SeqCst);
        if others > 0 || readers > 0 {
            self.writers.fetch_sub(1, SeqCst);
            self.inner.release_write();
            return Err(self.violation(format!(
                "write admitted alongside {others} writer(s) and {readers} reader(s)"
            )));
        }
        Ok(())
    }

    fn release_write(&self) {
        self.writers.fetch_sub(1, SeqCst);
        self.inner.release_write();
    }

    fn state(&self) -> AdmissionState {
        self.inner.state()
    }
}

impl Cancel for Instrumented {
    fn cancel(&self) {
        self.inner.cancel();
    }
}

impl std::fmt::Debug for Instrumented {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumented")
            .field("policy", &self.inner.policy())
            .field("readers", &self.readers.load(SeqCst))
            .field("writers", &self.writers.load(SeqCst))
            .field("violations", &self.violations.load(SeqCst))
            .finish()
    }
}
