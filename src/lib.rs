#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Coordination Recipe
//!
//! > **Hand-rolled reader-writer coordination, exercised by classic simulations.**
//!
//! This crate builds mutual-exclusion and read-write admission control directly on
//! condition variables, then puts it under load with two classic problems:
//! a market where visitors browse and buyers empty the shelves (readers-writers), and a
//! table of philosophers sharing utensils (dining philosophers).
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Admission is separate from the data
//! The protected [`ItemCollection`](inventory::ItemCollection) only keeps single
//! operations atomic. Whether a worker may read or write at all is decided by a
//! [`Coordinator`](coordinator::Coordinator) injected next to it. Swapping the policy
//! changes fairness without touching the collection or the workers.
//!
//! ### Every waiter re-checks its predicate
//! Each primitive is a `Mutex` + `Condvar` pair with an explicit predicate loop.
//! Broadcast wake-ups, spurious wake-ups and cancellation all go through the same loop.
//!
//! ### Release is structural
//! Admissions and utensils are held through guards. A worker that returns early,
//! fails or is cancelled releases what it holds on the way out.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Primitives ([`coordinator`], [`ring`])
//! - Four admission policies: [`ExclusiveCoordinator`](coordinator::ExclusiveCoordinator),
//!   [`ReaderPreferringCoordinator`](coordinator::ReaderPreferringCoordinator),
//!   [`WriterPreferringCoordinator`](coordinator::WriterPreferringCoordinator),
//!   [`PollingCoordinator`](coordinator::PollingCoordinator).
//! - [`Instrumented`](coordinator::Instrumented) checks at runtime that writes never overlap.
//! - [`ResourceRing`](ring::ResourceRing) of binary [`Utensil`](ring::Utensil)s.
//!
//! ### 2. The Resource ([`model`], [`inventory`])
//! - [`Item`](model::Item) records with per-run ids from an [`IdSequence`](model::IdSequence).
//! - [`ItemCollection`](inventory::ItemCollection): get, decrement-or-remove, increment.
//!
//! ### 3. The Workers ([`worker`])
//! - [`Reader`](worker::Reader), [`Writer`](worker::Writer), [`Diner`](worker::Diner):
//!   blocking loops that report through [`Event`](framework::Event)s.
//!
//! ### 4. The Orchestrator ([`lifecycle`], [`framework`])
//! - [`MarketSimulation`](lifecycle::MarketSimulation) and
//!   [`DiningSimulation`](lifecycle::DiningSimulation) spawn workers and collect reports.
//! - [`Shutdown`](framework::Shutdown) cancels pauses and blocked waits alike.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # 100 items, 2 visitors, 32 buyers, writer-preferring
//! cargo run -- market
//!
//! # Reader-preferring with a restocking buyer, events as JSON lines
//! cargo run -- --format json market 50 8 1 --policy reader-preferring --restock
//!
//! # Five philosophers for three seconds
//! cargo run -- dining 5 1 --duration-secs 3
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod coordinator;
pub mod framework;
pub mod inventory;
pub mod lifecycle;
pub mod model;
pub mod ring;
pub mod worker;
