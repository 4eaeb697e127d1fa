//! Cooperative cancellation shared by every worker of a run.
//!
//! A [`Shutdown`] is a one-way latch. Triggering it wakes anybody sleeping in
//! [`Shutdown::pause`] and forwards the cancellation to every registered [`Cancel`]
//! target (coordinators, ring resources), so that threads blocked on their condition
//! variables wake up too.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Notify;
use tracing::debug;

/// Returned from a suspend point that was cut short by shutdown.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Interrupted by shutdown")]
pub struct Interrupted;

/// Something holding blocked threads that must be released on shutdown.
pub trait Cancel: Send + Sync {
    /// Marks the target cancelled and wakes all of its waiters. Must be idempotent.
    fn cancel(&self);
}

#[derive(Default)]
pub struct Shutdown {
    triggered: Mutex<bool>,
    signal: Condvar,
    notify: Notify,
    targets: Mutex<Vec<Arc<dyn Cancel>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a target to cancel on trigger. Registering after the trigger cancels
    /// the target right away.
    pub fn register(&self, target: Arc<dyn Cancel>) {
        if self.is_triggered() {
            target.cancel();
            return;
        }
        self.targets.lock().push(target.clone());
        // lost the race with trigger(), which may have drained the list already
        if self.is_triggered() {
            target.cancel();
        }
    }

    pub fn trigger(&self) {
        {
            let mut triggered = self.triggered.lock();
            if *triggered {
                return;
            }
            *triggered = true;
            self.signal.notify_all();
        }
        self.notify.notify_waiters();
        let targets: Vec<_> = self.targets.lock().drain(..).collect();
        debug!(targets = targets.len(), "Shutdown triggered");
        for target in targets {
            target.cancel();
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.triggered.lock()
    }

    /// Resolves once the latch is triggered, right away if it already is.
    pub async fn triggered(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_triggered() {
            return;
        }
        notified.await;
    }

    /// Sleeps for `duration` unless shutdown comes first.
    pub fn pause(&self, duration: Duration) -> Result<(), Interrupted> {
        let deadline = Instant::now() + duration;
        let mut triggered = self.triggered.lock();
        while !*triggered {
            if self.signal.wait_until(&mut triggered, deadline).timed_out() {
                break;
            }
        }
        if *triggered {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shutdown")
            .field("triggered", &self.is_triggered())
            .field("targets", &self.targets.lock().len())
            .finish()
    }
}
