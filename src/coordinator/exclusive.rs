use super::{AdmissionState, Coordinator, CoordinatorError, Policy};
use crate::framework::Cancel;
use parking_lot::{Condvar, Mutex};

/// One exclusive section for everybody: readers are serialized just like writers.
#[derive(Debug, Default)]
pub struct ExclusiveCoordinator {
    state: Mutex<AdmissionState>,
    released: Condvar,
}

impl ExclusiveCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn occupied(state: &AdmissionState) -> bool {
        state.readers > 0 || state.writers > 0
    }
}

impl Coordinator for ExclusiveCoordinator {
    fn policy(&self) -> Policy {
        Policy::Exclusive
    }

    fn acquire_read(&self) -> Result<(), CoordinatorError> {
        let mut state = self.state.lock();
        state.pending_readers += 1;
        while !state.cancelled && Self::occupied(&state) {
            self.released.wait(&mut state);
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
        self.released.notify_one();
    }

    fn acquire_write(&self) -> Result<(), CoordinatorError> {
        let mut state = self.state.lock();
        state.pending_writers += 1;
        while !state.cancelled && Self::occupied(&state) {
            self.released.wait(&mut state);
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
        self.released.notify_one();
    }

    fn state(&self) -> AdmissionState {
        *self.state.lock()
    }
}

impl Cancel for ExclusiveCoordinator {
    fn cancel(&self) {
        self.state.lock().cancelled = true;
        self.released.notify_all();
    }
}
