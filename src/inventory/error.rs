//! Error types for the inventory.

use thiserror::Error;

/// Errors that can occur during collection operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// The index was not in `[0, size)` at the time of access.
    ///
    /// Usually a benign race between an uncovered size check and the access.
    #[error("Index out of range: index {index}, size {size}")]
    OutOfRange { index: usize, size: usize },

    /// An item with no units left; such items never belong in a collection.
    #[error("Item {id} has no units left")]
    SoldOut { id: u64 },
}
