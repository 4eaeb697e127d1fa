//! # Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing` crate.
//!
//! Logs and events are separate streams. Logs (this module) describe the run itself:
//! start, shutdown, per-worker exit, invariant violations. What the workers *do* (every
//! read, purchase, restock, diner transition) travels as [`Event`](crate::framework::Event)s
//! and is rendered by the binary, not logged.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lifecycle only
//! RUST_LOG=info cargo run -- market
//!
//! # Worker start/finish, shutdown targets
//! RUST_LOG=debug cargo run -- dining 5 1
//!
//! # Filter to the coordinators
//! RUST_LOG=coordination_recipe::coordinator=debug cargo run -- market --policy polling
//! ```
//!
//! ## Spans
//!
//! Every worker loop runs inside a span named after its role with the worker index as a
//! field, so with `RUST_LOG=debug` a line reads like:
//!
//! ```text
//! DEBUG writer{worker=3 mode=Buy}: Finished exit=Exhausted decrements=31 increments=0
//! ```
//!
//! Logs go to stderr, leaving stdout to the event stream.

/// Initializes the tracing/logging infrastructure for the application.
///
/// - **Environment-based filtering**: controlled via `RUST_LOG`, `warn` when unset
/// - **Compact format**: spans inline, no module paths
pub fn setup_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
