use super::{AdmissionState, Coordinator, CoordinatorError, Policy};
use crate::framework::Cancel;
use parking_lot::{Condvar, Mutex};

/// Readers only ever wait for an active writer. A writer additionally waits for every
/// pending reader, so a steady stream of readers keeps writers out indefinitely.
#[derive(Debug, Default)]
pub struct ReaderPreferringCoordinator {
    state: Mutex<AdmissionState>,
    changed: Condvar,
}

impl ReaderPreferringCoordinator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Coordinator for ReaderPreferringCoordinator {
    fn policy(&self) -> Policy {
        Policy::ReaderPreferring
    }

    fn acquire_read(&self) -> Result<(), CoordinatorError> {
        let mut state = self.state.lock();
        state.pending_readers += 1;
        while !state.cancelled && state.writers > 0 {
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
        while !state.cancelled
            && (state.writers > 0 || state.readers > 0 || state.pending_readers > 0)
        {
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
        // pending readers and writers all re-check; readers win the tie
        self.changed.notify_all();
    }

    fn state(&self) -> AdmissionState {
        *self.state.lock()
    }
}

impl Cancel for ReaderPreferringCoordinator {
    fn cancel(&self) {
        self.state.lock().cancelled = true;
        self.changed.notify_all();
    }
}
