use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Placeholder description given to generated items.
pub const DEFAULT_DESCRIPTION: &str = "testValue";

/// Quantity every generated item starts with unless configured otherwise.
pub const DEFAULT_QUANTITY: u32 = 10;

/// A single inventory record.
///
/// Values handed out by [`ItemCollection`](crate::inventory::ItemCollection) are
/// snapshots: clones taken under admission, safe to keep after the admission is released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub quantity: u32,
    pub description: String,
}

impl Item {
    /// Creates a new Item instance.
    ///
    /// # Arguments
    /// * `id` - Unique identifier (typically drawn from an [`IdSequence`])
    /// * `quantity` - Available stock quantity
    /// * `description` - Free-form properties of the item
    pub fn new(id: u64, quantity: u32, description: impl Into<String>) -> Self {
        Self {
            id,
            quantity,
            description: description.into(),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Quantity: {}, properties: '{}'",
            self.id, self.quantity, self.description
        )
    }
}

/// Monotonic id source scoped to one simulation run.
///
/// Ids start at 1. The sequence is shared by reference, so two runs with two
/// sequences never see each other's ids.
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicU64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Hands out the next id.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// Builds `count` fresh items with `quantity` units each.
    pub fn generate(&self, count: usize, quantity: u32) -> Vec<Item> {
        (0..count)
            .map(|_| Item::new(self.next_id(), quantity, DEFAULT_DESCRIPTION))
            .collect()
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn generated_items_get_consecutive_ids() {
        let seq = IdSequence::new();
        let items = seq.generate(3, 7);
        let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(items.iter().all(|i| i.quantity == 7));
        assert!(items.iter().all(|i| i.description == DEFAULT_DESCRIPTION));
    }

    #[test]
    fn sequences_are_independent_per_run() {
        let first = IdSequence::new();
        let second = IdSequence::new();
        first.generate(5, 1);
        assert_eq!(second.next_id(), 1);
    }

    #[test]
    fn ids_stay_unique_across_threads() {
        let seq = Arc::new(IdSequence::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let seq = seq.clone();
                thread::spawn(move || (0..250).map(|_| seq.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 1000);
        assert_eq!(ids.first(), Some(&1));
        assert_eq!(ids.last(), Some(&1000));
    }

    #[test]
    fn display_matches_report_format() {
        let item = Item::new(4, 2, "blue");
        assert_eq!(item.to_string(), "ID: 4, Quantity: 2, properties: 'blue'");
    }
}
