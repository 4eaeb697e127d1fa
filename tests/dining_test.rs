use coordination_recipe::framework::Event;
use coordination_recipe::lifecycle::{ConfigError, DiningConfig, DiningSimulation, SimulationError};
use coordination_recipe::ring::DinerState;
use std::collections::HashSet;
use std::time::Duration;

/// Five philosophers with short pauses all get to eat, and every utensil is back on the
/// table once the run is over.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_five_diners_all_eat() {
    let config = DiningConfig {
        diners: 5,
        ponder: 1,
    };
    let (sim, mut events) = DiningSimulation::start(&config).expect("Failed to set the table");
    let ring = sim.ring().clone();

    let summary = tokio::time::timeout(
        Duration::from_secs(30),
        sim.run_for(Duration::from_secs(3)),
    )
    .await
    .expect("Dining did not stop")
    .expect("Dining failed");

    assert_eq!(summary.meals.len(), 5);
    assert!(summary.starved().is_empty(), "{summary:?}");
    assert!(summary.all_free);
    assert!(ring.all_free());

    let mut eaters = HashSet::new();
    while let Some(event) = events.recv().await {
        if let Event::DinerTransition {
            diner,
            state: DinerState::Eating,
        } = event
        {
            eaters.insert(diner);
        }
    }
    assert_eq!(eaters.len(), 5);
}

/// Shutdown reaches diners in every state, including those blocked on a utensil.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_frees_every_utensil() {
    let config = DiningConfig {
        diners: 20,
        ponder: 2,
    };
    let (sim, _) = DiningSimulation::start(&config).expect("Failed to set the table");

    tokio::time::sleep(Duration::from_millis(200)).await;
    let summary = tokio::time::timeout(Duration::from_secs(30), sim.shutdown())
        .await
        .expect("Dining did not stop")
        .expect("Dining failed");

    assert_eq!(summary.meals.len(), 20);
    assert!(summary.all_free);
}

/// External triggers (Ctrl-C in the binary) end `run_for` early.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_external_trigger_ends_the_run_early() {
    let config = DiningConfig {
        diners: 3,
        ponder: 1,
    };
    let (sim, _) = DiningSimulation::start(&config).expect("Failed to set the table");
    let shutdown = sim.shutdown_handle();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.trigger();
    });

    let summary = tokio::time::timeout(
        Duration::from_secs(10),
        sim.run_for(Duration::from_secs(3600)),
    )
    .await
    .expect("Trigger did not end the run")
    .expect("Dining failed");
    assert!(summary.all_free);
}

#[tokio::test]
async fn test_lone_diner_uses_its_single_utensil() {
    let config = DiningConfig {
        diners: 1,
        ponder: 0,
    };
    let (sim, _) = DiningSimulation::start(&config).expect("Failed to set the table");

    let summary = sim
        .run_for(Duration::from_millis(50))
        .await
        .expect("Dining failed");
    assert!(summary.meals[0] > 0);
    assert!(summary.all_free);
}

#[tokio::test]
async fn test_empty_table_is_rejected() {
    let result = DiningSimulation::start(&DiningConfig {
        diners: 0,
        ponder: 5,
    });

    assert!(matches!(
        result,
        Err(SimulationError::Config(ConfigError::NoDiners))
    ));
}
