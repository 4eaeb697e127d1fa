//! # Coordination Recipe
//!
//! Command-line driver for the two simulations.
//!
//! - `market` runs the readers-writers market until the shelves are empty (or a timer /
//!   Ctrl-C stops it) and prints a summary.
//! - `dining` seats the philosophers for a fixed time and prints how often each one ate.
//!
//! Worker events go to stdout, either as text lines or as one JSON object per line.
//! Logs go to stderr and are controlled by `RUST_LOG`.

use clap::{Parser, Subcommand, ValueEnum};
use coordination_recipe::coordinator::Policy;
use coordination_recipe::framework::{Event, EventReceiver, Shutdown};
use coordination_recipe::lifecycle::{
    setup_tracing, DiningConfig, DiningSimulation, DiningSummary, MarketConfig, MarketSimulation,
    MarketSummary,
};
use coordination_recipe::worker::WriterMode;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "coordination-recipe",
    version,
    about = "Readers-writers and dining philosophers on hand-rolled monitors"
)]
struct Cli {
    /// How worker events and the final summary are printed
    #[arg(long, value_enum, global = true, default_value_t = Format::Text)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Visitors browse, buyers empty the shelves
    Market {
        /// Items on the shelves at start
        #[arg(default_value_t = 100)]
        items: usize,
        /// Visitor (reader) threads
        #[arg(default_value_t = 2)]
        readers: usize,
        /// Buyer (writer) threads
        #[arg(default_value_t = 32)]
        writers: usize,
        /// exclusive, reader-preferring, writer-preferring or polling
        #[arg(long, default_value_t = Policy::default())]
        policy: Policy,
        /// Buyers flip a coin between buying and restocking
        #[arg(long)]
        restock: bool,
        /// Units per item at start
        #[arg(long, default_value_t = 10)]
        quantity: u32,
        /// Upper bound of the random pause between two operations
        #[arg(long, default_value_t = 0)]
        pause_ms: u64,
        /// Stop after this many seconds even if the shelves are not empty
        #[arg(long)]
        duration_secs: Option<u64>,
    },
    /// Philosophers share one utensil with each neighbour
    Dining {
        /// Seats at the table
        #[arg(default_value_t = 100)]
        diners: usize,
        /// Thinking and eating last up to PONDER * 250ms
        #[arg(default_value_t = 5)]
        ponder: u32,
        /// How long the table stays open
        #[arg(long, default_value_t = 10)]
        duration_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Market {
            items,
            readers,
            writers,
            policy,
            restock,
            quantity,
            pause_ms,
            duration_secs,
        } => {
            let config = MarketConfig {
                items,
                readers,
                writers,
                quantity,
                policy,
                mode: if restock {
                    WriterMode::Restock
                } else {
                    WriterMode::Buy
                },
                pause_ms,
            };
            run_market(config, duration_secs.map(Duration::from_secs), cli.format).await
        }
        Commands::Dining {
            diners,
            ponder,
            duration_secs,
        } => {
            let config = DiningConfig { diners, ponder };
            run_dining(config, Duration::from_secs(duration_secs), cli.format).await
        }
    }
}

async fn run_market(
    config: MarketConfig,
    limit: Option<Duration>,
    format: Format,
) -> Result<(), String> {
    let (simulation, events) = MarketSimulation::start(&config).map_err(|e| e.to_string())?;
    let printer = spawn_printer(events, format);

    let shutdown = simulation.shutdown_handle();
    watch_ctrl_c(shutdown.clone());
    if let Some(limit) = limit {
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            info!(?limit, "Time is up");
            shutdown.trigger();
        });
    }

    let summary = simulation.join().await.map_err(|e| e.to_string())?;
    drain(printer).await;
    print_summary(&summary, format, render_market_summary)
}

async fn run_dining(config: DiningConfig, limit: Duration, format: Format) -> Result<(), String> {
    let (simulation, events) = DiningSimulation::start(&config).map_err(|e| e.to_string())?;
    let printer = spawn_printer(events, format);
    watch_ctrl_c(simulation.shutdown_handle());

    let summary = simulation.run_for(limit).await.map_err(|e| e.to_string())?;
    drain(printer).await;
    print_summary(&summary, format, render_dining_summary)
}

/// Prints events until every sender is gone, i.e. until all workers have ended.
fn spawn_printer(mut events: EventReceiver, format: Format) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match format {
                Format::Text => println!("{}", render_event(&event)),
                Format::Json => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(error = %e, "Event not serializable"),
                },
            }
        }
    })
}

async fn drain(printer: JoinHandle<()>) {
    if let Err(e) = printer.await {
        warn!("Event printer failed: {:?}", e);
    }
}

fn watch_ctrl_c(shutdown: Arc<Shutdown>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping workers");
            shutdown.trigger();
        }
    });
}

fn render_event(event: &Event) -> String {
    match event {
        Event::Read {
            worker,
            index,
            item,
        } => format!("Visitor {worker} looks at [{index}] {item}"),
        Event::Purchased {
            worker,
            index,
            item,
            removed,
        } => {
            if *removed {
                format!("Buyer {worker} took the last unit of [{index}] {item}")
            } else {
                format!("Buyer {worker} bought one of [{index}] {item}")
            }
        }
        Event::Restocked {
            worker,
            index,
            item,
            at_capacity,
        } => {
            if *at_capacity {
                format!("Buyer {worker} cannot restock [{index}], full: {item}")
            } else {
                format!("Buyer {worker} restocked [{index}] {item}")
            }
        }
        Event::Anomaly {
            role,
            worker,
            reason,
        } => format!("!! {role} {worker}: {reason}"),
        Event::DinerTransition { diner, state } => format!("Philosopher {diner} is {state:?}"),
        Event::WorkerFinished {
            role,
            worker,
            operations,
            exit,
        } => format!("{role} {worker} done after {operations} operations ({exit:?})"),
    }
}

fn print_summary<T: Serialize>(
    summary: &T,
    format: Format,
    render: fn(&T) -> String,
) -> Result<(), String> {
    match format {
        Format::Text => println!("{}", render(summary)),
        Format::Json => {
            let line = serde_json::to_string(summary).map_err(|e| e.to_string())?;
            println!("{line}");
        }
    }
    Ok(())
}

fn render_market_summary(summary: &MarketSummary) -> String {
    let totals = &summary.totals;
    let mut out = format!(
        "== market ({}) ==\n\
         items left:   {}\n\
         units:        {} at start, {} left\n\
         reads:        {}\n\
         bought:       {} ({} items emptied)\n\
         restocked:    {} ({} at capacity)\n\
         anomalies:    {}\n\
         peak readers: {}\n\
         conserved:    {}",
        summary.policy,
        summary.items_left,
        summary.initial_total,
        summary.remaining_total,
        totals.reads,
        totals.decrements,
        totals.removals,
        totals.increments,
        totals.at_capacity,
        totals.anomalies,
        summary.peak_readers,
        summary.conserved(),
    );
    if summary.cancelled_workers > 0 {
        out.push_str(&format!(
            "\ncancelled:    {} workers",
            summary.cancelled_workers
        ));
    }
    out
}

fn render_dining_summary(summary: &DiningSummary) -> String {
    let total: u64 = summary.meals.iter().sum();
    let starved = summary.starved();
    let mut out = format!(
        "== dining ({} seats) ==\n\
         meals:      {}\n\
         utensils:   {}",
        summary.meals.len(),
        total,
        if summary.all_free {
            "all back on the table"
        } else {
            "some still held"
        },
    );
    if !starved.is_empty() {
        out.push_str(&format!("\nstarved:    {starved:?}"));
    }
    out
}
