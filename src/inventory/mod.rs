//! The protected resource: an ordered, index-addressable collection of [`Item`]s.
//!
//! The collection keeps each single read or single write atomic and nothing more.
//! Admission across calls (a size check followed by an access) is the job of a
//! [`Coordinator`](crate::coordinator::Coordinator) held by the caller.

pub mod error;

pub use error::*;

use crate::model::{IdSequence, Item};
use parking_lot::Mutex;
use serde::Serialize;

/// Result of [`ItemCollection::decrement_or_remove`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Purchase {
    /// The item after the decrement.
    pub item: Item,
    /// `true` when the quantity reached zero and the item left the collection.
    pub removed: bool,
}

/// Result of [`ItemCollection::increment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "item", rename_all = "snake_case")]
pub enum Restock {
    /// The quantity went up by one.
    Incremented(Item),
    /// The quantity was already at `u32::MAX`; nothing changed.
    AtCapacity(Item),
}

impl Restock {
    pub fn item(&self) -> &Item {
        match self {
            Restock::Incremented(item) | Restock::AtCapacity(item) => item,
        }
    }

    pub fn at_capacity(&self) -> bool {
        matches!(self, Restock::AtCapacity(_))
    }
}

/// Ordered sequence of items. Indices shift down when an item is removed, so callers
/// must not assume an index stays valid across calls.
#[derive(Debug, Default)]
pub struct ItemCollection {
    items: Mutex<Vec<Item>>,
}

impl ItemCollection {
    /// Builds a collection from `items`. Fails on the first item that has no units.
    pub fn new(items: Vec<Item>) -> Result<Self, InventoryError> {
        if let Some(item) = items.iter().find(|item| item.quantity == 0) {
            return Err(InventoryError::SoldOut { id: item.id });
        }
        Ok(Self {
            items: Mutex::new(items),
        })
    }

    /// Creates `count` items with ids drawn from `ids`, each holding `quantity` units.
    pub fn generate(ids: &IdSequence, count: usize, quantity: u32) -> Result<Self, InventoryError> {
        Self::new(ids.generate(count, quantity))
    }

    pub fn size(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Returns a snapshot of the item at `index`.
    pub fn get(&self, index: usize) -> Result<Item, InventoryError> {
        let items = self.items.lock();
        let size = items.len();
        items
            .get(index)
            .cloned()
            .ok_or(InventoryError::OutOfRange { index, size })
    }

    /// Takes one unit of the item at `index`, removing the item once it runs out.
    pub fn decrement_or_remove(&self, index: usize) -> Result<Purchase, InventoryError> {
        let mut items = self.items.lock();
        let size = items.len();
        let item = items
            .get_mut(index)
            .ok_or(InventoryError::OutOfRange { index, size })?;

        item.quantity = item
            .quantity
            .checked_sub(1)
            .ok_or(InventoryError::SoldOut { id: item.id })?;
        if item.quantity == 0 {
            let item = items.remove(index);
            return Ok(Purchase {
                item,
                removed: true,
            });
        }
        Ok(Purchase {
            item: item.clone(),
            removed: false,
        })
    }

    /// Adds one unit to the item at `index`, unless it is already at capacity.
    pub fn increment(&self, index: usize) -> Result<Restock, InventoryError> {
        let mut items = self.items.lock();
        let size = items.len();
        let item = items
            .get_mut(index)
            .ok_or(InventoryError::OutOfRange { index, size })?;

        match item.quantity.checked_add(1) {
            Some(quantity) => {
                item.quantity = quantity;
                Ok(Restock::Incremented(item.clone()))
            }
            None => Ok(Restock::AtCapacity(item.clone())),
        }
    }

    /// Sum of all quantities still in the collection.
    pub fn total_quantity(&self) -> u64 {
        self.items
            .lock()
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    /// Copies out the whole collection.
    pub fn snapshot(&self) -> Vec<Item> {
        self.items.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(count: usize, quantity: u32) -> ItemCollection {
        ItemCollection::generate(&IdSequence::new(), count, quantity).unwrap()
    }

    #[test]
    fn get_rejects_index_at_size() {
        let items = collection(3, 1);
        assert_eq!(items.get(2).unwrap().id, 3);
        assert_eq!(
            items.get(3),
            Err(InventoryError::OutOfRange { index: 3, size: 3 })
        );
    }

    #[test]
    fn decrement_keeps_item_until_last_unit() {
        let items = collection(2, 2);

        let first = items.decrement_or_remove(0).unwrap();
        assert!(!first.removed);
        assert_eq!(first.item.quantity, 1);
        assert_eq!(items.size(), 2);

        let second = items.decrement_or_remove(0).unwrap();
        assert!(second.removed);
        assert_eq!(second.item.quantity, 0);
        assert_eq!(second.item.id, 1);
        assert_eq!(items.size(), 1);

        // the survivor shifted down into index 0
        assert_eq!(items.get(0).unwrap().id, 2);
    }

    #[test]
    fn no_zero_quantity_item_is_left_behind() {
        let items = collection(5, 3);
        for _ in 0..7 {
            items.decrement_or_remove(0).unwrap();
        }
        assert!(items.snapshot().iter().all(|item| item.quantity > 0));
        assert_eq!(items.total_quantity(), 8);
    }

    #[test]
    fn decrement_on_empty_collection_is_out_of_range() {
        let items = collection(0, 1);
        assert!(items.is_empty());
        assert_eq!(
            items.decrement_or_remove(0),
            Err(InventoryError::OutOfRange { index: 0, size: 0 })
        );
    }

    #[test]
    fn increment_is_tagged_at_capacity() {
        let full = vec![Item::new(1, u32::MAX - 1, "x")];
        let items = ItemCollection::new(full).unwrap();

        let restock = items.increment(0).unwrap();
        assert!(!restock.at_capacity());
        assert_eq!(restock.item().quantity, u32::MAX);

        let restock = items.increment(0).unwrap();
        assert!(restock.at_capacity());
        assert_eq!(restock.item().quantity, u32::MAX);
    }

    #[test]
    fn increment_out_of_range() {
        let items = collection(1, 1);
        assert_eq!(
            items.increment(1),
            Err(InventoryError::OutOfRange { index: 1, size: 1 })
        );
    }

    #[test]
    fn conservation_holds_over_mixed_operations() {
        let items = collection(4, 5);
        let initial = items.total_quantity();
        let (mut taken, mut added) = (0u64, 0u64);

        for step in 0..40usize {
            let size = items.size();
            if size == 0 {
                break;
            }
            let index = step % size;
            if step % 3 == 0 {
                if let Restock::Incremented(_) = items.increment(index).unwrap() {
                    added += 1;
                }
            } else {
                items.decrement_or_remove(index).unwrap();
                taken += 1;
            }
            assert_eq!(initial + added, items.total_quantity() + taken);
        }
    }

    #[test]
    fn items_without_units_are_refused() {
        let result = ItemCollection::new(vec![Item::new(1, 0, "x"), Item::new(2, 3, "y")]);
        assert_eq!(result.unwrap_err(), InventoryError::SoldOut { id: 1 });

        let result = ItemCollection::generate(&IdSequence::new(), 2, 0);
        assert_eq!(result.unwrap_err(), InventoryError::SoldOut { id: 1 });

        // nothing to refuse in an empty collection
        let empty = ItemCollection::generate(&IdSequence::new(), 0, 0).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn purchases_account_for_every_unit() {
        let stock = vec![Item::new(1, 1, "x"), Item::new(2, 3, "y")];
        let items = ItemCollection::new(stock).unwrap();
        let initial = items.total_quantity();

        let mut decrements = 0;
        while !items.is_empty() {
            let purchase = items.decrement_or_remove(0).unwrap();
            decrements += 1;
            assert_eq!(purchase.removed, purchase.item.quantity == 0);
        }
        assert_eq!(decrements, initial);
        assert_eq!(items.total_quantity(), 0);
    }
}
