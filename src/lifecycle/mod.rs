//! Runtime orchestration and lifecycle management.
//!
//! This module contains the infrastructure for running a simulation end to end:
//!
//! - **Configuration**: [`MarketConfig`] and [`DiningConfig`], with validation
//! - **Orchestration**: [`MarketSimulation`] and [`DiningSimulation`] wire the shared
//!   state, spawn workers on blocking threads and collect their reports
//! - **Observability setup**: [`setup_tracing`]

pub mod config;
pub mod dining;
pub mod error;
pub mod market;
pub mod tracing;

pub use config::*;
pub use dining::*;
pub use error::*;
pub use market::*;
pub use self::tracing::*;
