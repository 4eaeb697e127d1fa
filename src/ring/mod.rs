//! # Dining-philosophers resource ring
//!
//! N exclusive [`Utensil`]s in a cycle. Diner `k` needs utensils `k` and `(k + 1) % N`.
//! [`ResourceRing::seats`] hands out the pair in acquisition order: lower index first.
//! For every diner but the last that is "left, then right"; the last diner sits between
//! `N - 1` and `0` and so takes `0` first, which breaks the circular wait.

use crate::framework::Cancel;
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Where a diner is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DinerState {
    Thinking,
    /// Waiting for the first utensil.
    Hungry,
    /// Holding the first utensil, waiting for the second.
    HoldingFirst,
    Eating,
}

/// Returned when a utensil wait is cut short by cancellation.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Utensil {0} wait cancelled")]
pub struct Cancelled(pub usize);

#[derive(Debug, Default)]
struct UtensilState {
    taken: bool,
    cancelled: bool,
}

/// A binary resource: free or held by exactly one diner.
#[derive(Debug, Default)]
pub struct Utensil {
    index: usize,
    state: Mutex<UtensilState>,
    dropped: Condvar,
}

impl Utensil {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Blocks until the utensil is free, then holds it until the guard is dropped.
    pub fn take(&self) -> Result<UtensilGuard<'_>, Cancelled> {
        let mut state = self.state.lock();
        while state.taken && !state.cancelled {
            self.dropped.wait(&mut state);
        }
        if state.cancelled {
            return Err(Cancelled(self.index));
        }
        state.taken = true;
        Ok(UtensilGuard { utensil: self })
    }

    pub fn is_taken(&self) -> bool {
        self.state.lock().taken
    }

    fn put_down(&self) {
        self.state.lock().taken = false;
        self.dropped.notify_all();
    }
}

impl Cancel for Utensil {
    fn cancel(&self) {
        self.state.lock().cancelled = true;
        self.dropped.notify_all();
    }
}

/// Proof of holding a utensil. Dropping it puts the utensil back.
#[must_use = "the utensil is put down as soon as the guard is dropped"]
#[derive(Debug)]
pub struct UtensilGuard<'a> {
    utensil: &'a Utensil,
}

impl UtensilGuard<'_> {
    pub fn index(&self) -> usize {
        self.utensil.index
    }
}

impl Drop for UtensilGuard<'_> {
    fn drop(&mut self) {
        self.utensil.put_down();
    }
}

/// The table: one utensil between each pair of neighbours.
#[derive(Debug)]
pub struct ResourceRing {
    utensils: Vec<Arc<Utensil>>,
}

impl ResourceRing {
    pub fn new(size: usize) -> Self {
        Self {
            utensils: (0..size).map(|i| Arc::new(Utensil::new(i))).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.utensils.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utensils.is_empty()
    }

    pub fn utensil(&self, index: usize) -> Option<&Arc<Utensil>> {
        self.utensils.get(index)
    }

    pub fn utensils(&self) -> &[Arc<Utensil>] {
        &self.utensils
    }

    /// The two utensils diner `diner` uses, in the order they must be taken.
    /// With a single seat both entries are utensil 0.
    pub fn seats(&self, diner: usize) -> (usize, usize) {
        let n = self.utensils.len();
        let left = diner % n;
        let right = (diner + 1) % n;
        (left.min(right), left.max(right))
    }

    /// `true` when no utensil is held.
    pub fn all_free(&self) -> bool {
        self.utensils.iter().all(|u| !u.is_taken())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn last_seat_takes_utensil_zero_first() {
        let ring = ResourceRing::new(5);
        assert_eq!(ring.seats(0), (0, 1));
        assert_eq!(ring.seats(3), (3, 4));
        assert_eq!(ring.seats(4), (0, 4));
    }

    #[test]
    fn single_seat_uses_one_utensil() {
        let ring = ResourceRing::new(1);
        assert_eq!(ring.seats(0), (0, 0));
    }

    #[test]
    fn guard_drop_frees_the_utensil() {
        let utensil = Utensil::new(3);
        {
            let guard = utensil.take().unwrap();
            assert_eq!(guard.index(), 3);
            assert!(utensil.is_taken());
        }
        assert!(!utensil.is_taken());
    }

    #[test]
    fn second_taker_waits_for_put_down() {
        let utensil = Utensil::new(0);
        let got_it = AtomicBool::new(false);

        thread::scope(|s| {
            let held = utensil.take().unwrap();
            s.spawn(|| {
                let _g = utensil.take().unwrap();
                got_it.store(true, Ordering::SeqCst);
            });
            thread::sleep(Duration::from_millis(30));
            assert!(!got_it.load(Ordering::SeqCst));
            drop(held);
        });
        assert!(got_it.load(Ordering::SeqCst));
        assert!(!utensil.is_taken());
    }

    #[test]
    fn cancel_releases_waiting_taker() {
        let utensil = Utensil::new(2);
        thread::scope(|s| {
            let held = utensil.take().unwrap();
            let waiter = s.spawn(|| utensil.take().map(|g| g.index()));
            thread::sleep(Duration::from_millis(20));
            utensil.cancel();
            assert_eq!(waiter.join().unwrap(), Err(Cancelled(2)));
            drop(held);
        });
        assert!(!utensil.is_taken());
    }
}
