use super::{AdmissionState, Coordinator, CoordinatorError, Policy};
use crate::framework::Cancel;
use parking_lot::{Condvar, Mutex};
use std::time::Duration;

/// How long a rejected worker loafs before trying again.
pub const DEFAULT_LOAF: Duration = Duration::from_millis(1);

/// The naive "try, loaf, retry" coordinator.
///
/// Nobody is queued. A rejected worker suspends for at most the loaf interval, and every
/// release wakes all loafers, who then race to re-check the predicate:
/// - a reader gets in whenever no writer is admitted;
/// - a writer gets in only when nobody at all is admitted.
///
/// This is best-effort. There is no fairness and no forward-progress guarantee; a
/// sustained stream of readers can keep a writer loafing forever.
#[derive(Debug)]
pub struct PollingCoordinator {
    state: Mutex<AdmissionState>,
    released: Condvar,
    loaf: Duration,
}

impl PollingCoordinator {
    pub fn new() -> Self {
        Self::with_loaf(DEFAULT_LOAF)
    }

    pub fn with_loaf(loaf: Duration) -> Self {
        Self {
            state: Mutex::new(AdmissionState::default()),
            released: Condvar::new(),
            loaf,
        }
    }

    /// One admission attempt for a reader, without waiting.
    pub fn try_acquire_read(&self) -> Result<bool, CoordinatorError> {
        let mut state = self.state.lock();
        Self::try_read(&mut state)
    }

    /// One admission attempt for a writer, without waiting.
    pub fn try_acquire_write(&self) -> Result<bool, CoordinatorError> {
        let mut state = self.state.lock();
        Self::try_write(&mut state)
    }

    fn try_read(state: &mut AdmissionState) -> Result<bool, CoordinatorError> {
        if state.cancelled {
            return Err(CoordinatorError::Cancelled);
        }
        if state.writers > 0 {
            return Ok(false);
        }
        state.readers += 1;
        Ok(true)
    }

    fn try_write(state: &mut AdmissionState) -> Result<bool, CoordinatorError> {
        if state.cancelled {
            return Err(CoordinatorError::Cancelled);
        }
        if state.writers > 0 || state.readers > 0 {
            return Ok(false);
        }
        state.writers += 1;
        Ok(true)
    }
}

impl Default for PollingCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator for PollingCoordinator {
    fn policy(&self) -> Policy {
        Policy::Polling
    }

    fn acquire_read(&self) -> Result<(), CoordinatorError> {
        let mut state = self.state.lock();
        state.pending_readers += 1;
        let admitted = loop {
            match Self::try_read(&mut state) {
                Ok(false) => {
                    self.released.wait_for(&mut state, self.loaf);
                }
                other => break other,
            }
        };
        state.pending_readers -= 1;
        admitted.map(|_| ())
    }

    fn release_read(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.readers > 0, "release_read without admission");
        state.readers = state.readers.saturating_sub(1);
        self.released.notify_all();
    }

    fn acquire_write(&self) -> Result<(), CoordinatorError> {
        let mut state = self.state.lock();
        state.pending_writers += 1;
        let admitted = loop {
            match Self::try_write(&mut state) {
                Ok(false) => {
                    self.released.wait_for(&mut state, self.loaf);
                }
                other => break other,
            }
        };
        state.pending_writers -= 1;
        admitted.map(|_| ())
    }

    fn release_write(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.writers > 0, "release_write without admission");
        state.writers = state.writers.saturating_sub(1);
        self.released.notify_all();
    }

    fn state(&self) -> AdmissionState {
        *self.state.lock()
    }
}

impl Cancel for PollingCoordinator {
    fn cancel(&self) {
        self.state.lock().cancelled = true;
        self.released.notify_all();
    }
}
