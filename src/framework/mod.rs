//! Plumbing shared by every simulation: cancellation and the event channel.
//!
//! # Main Components
//!
//! - [`Shutdown`] - One-way latch that interrupts pauses and cancels registered primitives
//! - [`Cancel`] - Trait implemented by primitives that hold blocked threads
//! - [`Event`] / [`EventSender`] - Structured output of the workers

pub mod events;
pub mod shutdown;

pub use events::*;
pub use shutdown::*;
