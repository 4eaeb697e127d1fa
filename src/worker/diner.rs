use super::{WorkerReport, WorkerStats};
use crate::framework::{Event, EventSender, ExitReason, Interrupted, Role, Shutdown};
use crate::ring::{DinerState, ResourceRing};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Length of one ponder unit; a pause lasts up to `ponder` units.
const PONDER_UNIT_MS: u64 = 250;

/// The philosopher: thinks, gets hungry, takes two utensils, eats, puts them back.
///
/// Every wait (thinking, eating, a busy utensil) ends early on shutdown. Utensils are
/// held through guards, so whichever point the diner is interrupted at, it has put
/// everything down by the time [`Diner::run`] returns.
pub struct Diner {
    id: usize,
    ring: Arc<ResourceRing>,
    shutdown: Arc<Shutdown>,
    events: EventSender,
    ponder: u32,
}

impl Diner {
    pub fn new(
        id: usize,
        ring: Arc<ResourceRing>,
        shutdown: Arc<Shutdown>,
        events: EventSender,
        ponder: u32,
    ) -> Self {
        Self {
            id,
            ring,
            shutdown,
            events,
            ponder,
        }
    }

    #[instrument(name = "diner", skip(self), fields(diner = self.id))]
    pub fn run(self) -> WorkerReport {
        let mut rng = rand::thread_rng();
        let mut stats = WorkerStats::default();
        let (first, second) = self.ring.seats(self.id);
        debug!(first, second, "Seated");

        loop {
            if self.shutdown.is_triggered() {
                break;
            }

            self.transition(DinerState::Thinking);
            if self.pause(&mut rng).is_err() {
                break;
            }

            self.transition(DinerState::Hungry);
            let Ok(first_guard) = self.ring.utensils()[first].take() else {
                break;
            };
            self.transition(DinerState::HoldingFirst);
            let second_guard = if second == first {
                None
            } else {
                match self.ring.utensils()[second].take() {
                    Ok(guard) => Some(guard),
                    Err(_) => break,
                }
            };

            self.transition(DinerState::Eating);
            stats.meals += 1;
            let interrupted = self.pause(&mut rng).is_err();
            drop(second_guard);
            drop(first_guard);
            if interrupted {
                break;
            }
        }

        debug!(meals = stats.meals, "Left the table");
        self.events.emit(Event::WorkerFinished {
            role: Role::Diner,
            worker: self.id,
            operations: stats.operations(),
            exit: ExitReason::Cancelled,
        });
        WorkerReport {
            role: Role::Diner,
            worker: self.id,
            stats,
            exit: ExitReason::Cancelled,
        }
    }

    fn transition(&self, state: DinerState) {
        self.events.emit(Event::DinerTransition {
            diner: self.id,
            state,
        });
    }

    fn pause(&self, rng: &mut impl Rng) -> Result<(), Interrupted> {
        if self.ponder == 0 {
            return Ok(());
        }
        let millis = rng.gen_range(0..u64::from(self.ponder) * PONDER_UNIT_MS);
        self.shutdown.pause(Duration::from_millis(millis))
    }
}
