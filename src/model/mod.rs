//! Pure data structures shared by the inventory and the workers.

pub mod item;

pub use item::*;
