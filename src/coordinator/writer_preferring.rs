use super::{AdmissionState, Coordinator, CoordinatorError, Policy};
use crate::framework::Cancel;
use parking_lot::{Condvar, Mutex};

/// A writer request closes the door on new readers: readers already inside drain,
/// the writer goes next, and only then are queued readers let in again.
///
/// Under a heavy write load readers can starve.
#[derive(Debug, Default)]
pub struct WriterPreferringCoordinator {
    state: Mutex<AdmissionState>,
    changed: Condvar,
}

impl WriterPreferringCoordinator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Coordinator for WriterPreferringCoordinator {
    fn policy(&self) -> Policy {
        Policy::WriterPreferring
    }

    fn acquire_read(&self) -> Result<(), CoordinatorError> {
        let mut state = self.state.lock();
        state.pending_readers += 1;
        while !state.cancelled && (state.writers > 0 || state.pending_writers > 0) {
            self.changed.wait(&mut state);
        }
        state.pending_readers -= 1;
        if state.cancelled {
            return Err(CoordinatorError::Cancelled);
        }
        state.readers += 1;
        Ok(())
    }

    fn release_read(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.readers > 0, "release_read without admission");
        state.readers = state.readers.saturating_sub(1);
        if state.readers == 0 {
            self.changed.notify_all();
        }
    }

    fn acquire_write(&self) -> Result<(), CoordinatorError> {
        let mut state = self.state.lock();
        state.pending_writers += 1;
        while !state.cancelled && (state.writers > 0 || state.readers > 0) {
            self.changed.wait(&mut state);
        }
        state.pending_writers -= 1;
        if state.cancelled {
            return Err(CoordinatorError::Cancelled);
        }
        state.writers += 1;
        Ok(())
    }

    fn release_write(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.writers > 0, "release_write without admission");
        state.writers = state.writers.saturating_sub(1);
        self.changed.notify_all();
    }

    fn state(&self) -> AdmissionState {
        *self.state.lock()
    }
}

impl Cancel for WriterPreferringCoordinator {
    fn cancel(&self) {
        self.state.lock().cancelled = true;
        self.changed.notify_all();
    }
}
