//! # Reader-writer coordinators
//!
//! Hand-rolled admission control for the [`ItemCollection`](crate::inventory::ItemCollection).
//! Every variant is a small monitor: a `parking_lot::Mutex` around an [`AdmissionState`]
//! plus a `Condvar`, with each waiter looping on its own predicate so that spurious and
//! broadcast wake-ups are harmless.
//!
//! ## Policies
//!
//! | Policy | Readers wait while | Writers wait while | Who may starve |
//! |---|---|---|---|
//! | [`ExclusiveCoordinator`] | anyone is admitted | anyone is admitted | nobody, no read parallelism |
//! | [`ReaderPreferringCoordinator`] | a writer is admitted | anyone is admitted or a reader is pending | writers |
//! | [`WriterPreferringCoordinator`] | a writer is admitted or pending | anyone is admitted | readers |
//! | [`PollingCoordinator`] | a writer is admitted (retry loop) | anyone is admitted (retry loop) | anyone, best-effort |
//!
//! All of them guarantee that a write admission never overlaps another admission.
//! Wrap any of them in [`Instrumented`] to have that checked at runtime.
//!
//! ## Pairing
//!
//! `acquire_*` and `release_*` are public so the contract is visible, but workers go
//! through [`ReadAdmission`] / [`WriteAdmission`], whose `Drop` releases exactly once,
//! including on early returns and errors.

pub mod error;
mod exclusive;
mod instrumented;
mod polling;
mod reader_preferring;
mod writer_preferring;

pub use error::*;
pub use exclusive::ExclusiveCoordinator;
pub use instrumented::Instrumented;
pub use polling::{PollingCoordinator, DEFAULT_LOAF};
pub use reader_preferring::ReaderPreferringCoordinator;
pub use writer_preferring::WriterPreferringCoordinator;

use crate::framework::Cancel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Counters behind every coordinator, also handed out as a snapshot by
/// [`Coordinator::state`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdmissionState {
    pub readers: usize,
    pub writers: usize,
    pub pending_readers: usize,
    pub pending_writers: usize,
    pub cancelled: bool,
}

/// Admission control contract shared by all policies.
///
/// `acquire_*` may block and fails only when the coordinator is cancelled, in which
/// case nothing is held. Cancellation comes through the [`Cancel`] supertrait.
pub trait Coordinator: Cancel {
    fn policy(&self) -> Policy;

    fn acquire_read(&self) -> Result<(), CoordinatorError>;

    fn release_read(&self);

    fn acquire_write(&self) -> Result<(), CoordinatorError>;

    fn release_write(&self);

    fn state(&self) -> AdmissionState;
}

/// Held read admission; released on drop.
#[must_use = "admission is released as soon as the guard is dropped"]
pub struct ReadAdmission<'a> {
    coordinator: &'a dyn Coordinator,
}

impl<'a> ReadAdmission<'a> {
    pub fn acquire(coordinator: &'a dyn Coordinator) -> Result<Self, CoordinatorError> {
        coordinator.acquire_read()?;
        Ok(Self { coordinator })
    }
}

impl Drop for ReadAdmission<'_> {
    fn drop(&mut self) {
        self.coordinator.release_read();
    }
}

/// Held write admission; released on drop.
#[must_use = "admission is released as soon as the guard is dropped"]
pub struct WriteAdmission<'a> {
    coordinator: &'a dyn Coordinator,
}

impl<'a> WriteAdmission<'a> {
    pub fn acquire(coordinator: &'a dyn Coordinator) -> Result<Self, CoordinatorError> {
        coordinator.acquire_write()?;
        Ok(Self { coordinator })
    }
}

impl Drop for WriteAdmission<'_> {
    fn drop(&mut self) {
        self.coordinator.release_write();
    }
}

/// Selects one of the four coordinator variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    Exclusive,
    ReaderPreferring,
    #[default]
    WriterPreferring,
    Polling,
}

impl Policy {
    pub const ALL: [Policy; 4] = [
        Policy::Exclusive,
        Policy::ReaderPreferring,
        Policy::WriterPreferring,
        Policy::Polling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::Exclusive => "exclusive",
            Policy::ReaderPreferring => "reader-preferring",
            Policy::WriterPreferring => "writer-preferring",
            Policy::Polling => "polling",
        }
    }

    /// Creates a fresh, uncancelled coordinator for this policy.
    pub fn build(self) -> Arc<dyn Coordinator> {
        match self {
            Policy::Exclusive => Arc::new(ExclusiveCoordinator::new()),
            Policy::ReaderPreferring => Arc::new(ReaderPreferringCoordinator::new()),
            Policy::WriterPreferring => Arc::new(WriterPreferringCoordinator::new()),
            Policy::Polling => Arc::new(PollingCoordinator::new()),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::ALL
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParsePolicyError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    fn wait_for(coordinator: &dyn Coordinator, check: impl Fn(&AdmissionState) -> bool) {
        for _ in 0..2000 {
            if check(&coordinator.state()) {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("state never reached: {:?}", coordinator.state());
    }

    #[test]
    fn policy_names_round_trip() {
        for policy in Policy::ALL {
            assert_eq!(policy.as_str().parse::<Policy>(), Ok(policy));
            assert_eq!(policy.build().policy(), policy);
        }
        assert_eq!(
            "fifo".parse::<Policy>(),
            Err(ParsePolicyError("fifo".into()))
        );
    }

    #[test]
    fn guards_release_on_drop() {
        for policy in Policy::ALL {
            let coordinator = policy.build();
            {
                let _first = ReadAdmission::acquire(coordinator.as_ref()).unwrap();
                assert_eq!(coordinator.state().readers, 1);
            }
            assert_eq!(coordinator.state().readers, 0);
            {
                let _write = WriteAdmission::acquire(coordinator.as_ref()).unwrap();
                assert_eq!(coordinator.state().writers, 1);
            }
            assert_eq!(coordinator.state(), AdmissionState::default());
        }
    }

    #[test]
    fn writes_never_overlap_any_admission() {
        for policy in Policy::ALL {
            let coordinator = Instrumented::new(policy.build());
            let start = Barrier::new(8);

            thread::scope(|s| {
                for worker in 0..8 {
                    let coordinator = &coordinator;
                    let start = &start;
                    s.spawn(move || {
                        start.wait();
                        for round in 0..300 {
                            if (worker + round) % 3 == 0 {
                                let _w = WriteAdmission::acquire(coordinator).unwrap();
                                std::hint::spin_loop();
                            } else {
                                let _r = ReadAdmission::acquire(coordinator).unwrap();
                                std::hint::spin_loop();
                            }
                        }
                    });
                }
            });

            assert_eq!(coordinator.violations(), 0, "policy {policy}");
            assert_eq!(coordinator.state().readers, 0, "policy {policy}");
            assert_eq!(coordinator.state().writers, 0, "policy {policy}");
        }
    }

    #[test]
    fn exclusive_never_admits_two_readers() {
        let coordinator = Instrumented::new(Policy::Exclusive.build());
        thread::scope(|s| {
            for _ in 0..6 {
                s.spawn(|| {
                    for _ in 0..200 {
                        let _r = ReadAdmission::acquire(&coordinator).unwrap();
                        std::hint::spin_loop();
                    }
                });
            }
        });
        assert_eq!(coordinator.peak_readers(), 1);
    }

    #[test]
    fn shared_policies_admit_parallel_readers() {
        for policy in [
            Policy::ReaderPreferring,
            Policy::WriterPreferring,
            Policy::Polling,
        ] {
            let coordinator = policy.build();
            let _first = ReadAdmission::acquire(coordinator.as_ref()).unwrap();
            let _second = ReadAdmission::acquire(coordinator.as_ref()).unwrap();
            assert_eq!(coordinator.state().readers, 2, "policy {policy}");
        }
    }

    #[test]
    fn reader_preferring_readers_pass_a_waiting_writer() {
        let coordinator = Policy::ReaderPreferring.build();
        let writer_done = AtomicBool::new(false);

        thread::scope(|s| {
            let first = ReadAdmission::acquire(coordinator.as_ref()).unwrap();

            s.spawn(|| {
                let _w = WriteAdmission::acquire(coordinator.as_ref()).unwrap();
                writer_done.store(true, Ordering::SeqCst);
            });
            wait_for(coordinator.as_ref(), |st| st.pending_writers == 1);

            // a new reader gets in immediately even though a writer is queued
            let second = ReadAdmission::acquire(coordinator.as_ref()).unwrap();
            assert_eq!(coordinator.state().readers, 2);
            assert!(!writer_done.load(Ordering::SeqCst));

            drop(first);
            drop(second);
        });
        assert!(writer_done.load(Ordering::SeqCst));
    }

    #[test]
    fn writer_preferring_blocks_new_readers_behind_pending_writer() {
        let coordinator = Policy::WriterPreferring.build();
        let order = AtomicUsize::new(0);
        let writer_turn = AtomicUsize::new(usize::MAX);
        let late_reader_turn = AtomicUsize::new(usize::MAX);

        thread::scope(|s| {
            let first = ReadAdmission::acquire(coordinator.as_ref()).unwrap();

            s.spawn(|| {
                let _w = WriteAdmission::acquire(coordinator.as_ref()).unwrap();
                writer_turn.store(order.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
            });
            wait_for(coordinator.as_ref(), |st| st.pending_writers == 1);

            s.spawn(|| {
                let _r = ReadAdmission::acquire(coordinator.as_ref()).unwrap();
                late_reader_turn.store(order.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
            });
            wait_for(coordinator.as_ref(), |st| st.pending_readers == 1);

            thread::sleep(Duration::from_millis(30));
            assert_eq!(coordinator.state().readers, 1);
            drop(first);
        });

        assert_eq!(writer_turn.load(Ordering::SeqCst), 0);
        assert_eq!(late_reader_turn.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_wakes_blocked_acquirers() {
        for policy in Policy::ALL {
            let coordinator = policy.build();
            let held = WriteAdmission::acquire(coordinator.as_ref()).unwrap();

            thread::scope(|s| {
                let reader = s.spawn(|| coordinator.acquire_read());
                let writer = s.spawn(|| coordinator.acquire_write());
                wait_for(coordinator.as_ref(), |st| {
                    st.pending_readers == 1 && st.pending_writers == 1
                });

                coordinator.cancel();
                assert_eq!(reader.join().unwrap(), Err(CoordinatorError::Cancelled));
                assert_eq!(writer.join().unwrap(), Err(CoordinatorError::Cancelled));
            });

            drop(held);
            let state = coordinator.state();
            assert!(state.cancelled);
            assert_eq!((state.readers, state.writers), (0, 0), "policy {policy}");
            assert_eq!(
                coordinator.acquire_read(),
                Err(CoordinatorError::Cancelled),
                "policy {policy}"
            );
        }
    }
}
