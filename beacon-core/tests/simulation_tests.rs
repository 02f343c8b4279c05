use beacon_core::agent::Agent;
use beacon_core::config::SimConfig;
use beacon_core::environment::{Beacon, GridMap};
use beacon_core::network::StateImport;
use beacon_core::simulation::Simulation;
use beacon_core::world::{Pose, World};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

/// An agent that never acts, parked on a beacon in the corner of an open map.
fn parked_on_beacon() -> Simulation {
    let mut config = SimConfig::default();
    config.network.layer_sizes = vec![4, 3];
    config.policy.epsilon = 0.0;
    config.policy.epsilon_min = 0.0;
    config.policy.epsilon_max = 0.0;

    let mut agent = Agent::with_seed(&config, 2).unwrap();
    agent
        .import_network(StateImport {
            weights: Some(vec![vec![0.0; 12]]),
            biases: Some(vec![vec![-5.0, -5.0, -5.0]]),
        })
        .unwrap();

    let world = World::new(
        GridMap::empty(400, 400),
        Beacon::new(30.0, 350.0),
        Pose::new(20.0, 380.0, 0.0),
    );
    Simulation::from_parts(&config, agent, world, StdRng::seed_from_u64(8))
}

#[test]
fn test_simulation_new() {
    let sim = Simulation::with_seed(&SimConfig::default(), 1).unwrap();
    assert_eq!(sim.ticks, 0);
    assert_eq!(sim.clock_ms, 0);
    assert!(!sim.is_farming());
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = SimConfig::default();
    config.network.layer_sizes = vec![4];
    assert!(Simulation::new(&config).is_err());
}

#[test]
fn test_step_advances_clock() {
    let mut sim = Simulation::with_seed(&SimConfig::default(), 1).unwrap();
    sim.step();
    sim.step();
    assert_eq!(sim.ticks, 2);
    assert_eq!(sim.clock_ms, 32);
}

#[test]
fn test_farming_lifecycle() {
    let mut sim = parked_on_beacon();

    let report = sim.tick_at(0);
    assert!(sim.is_farming());
    assert_eq!(report.reward.farming, 1.0);
    assert_eq!(sim.agent().state().beacon_reached_counter, 1);

    sim.tick_at(2_999);
    assert!(sim.is_farming());
    assert_eq!(sim.agent().state().beacon_reached_counter, 1);

    let report = sim.tick_at(3_000);
    assert!(!sim.is_farming());
    assert!(!sim.agent().state().is_beacon_reached);
    assert_eq!(report.reward.farming, 0.0);
    assert!((sim.agent().state().cumulative_reward - report.reward.total()).abs() < 1e-12);
    assert!(sim.world().beacon.x >= 50.0);
}

#[test]
fn test_farming_duration_configurable() {
    let mut sim = parked_on_beacon();
    let mut config = SimConfig::default();
    config.world.farming_duration_ms = 500;
    config.network.layer_sizes = vec![4, 3];
    config.policy.epsilon_min = 0.0;
    config.policy.epsilon_max = 0.0;
    let agent = sim.agent().clone();
    let world = sim.world().clone();
    sim = Simulation::from_parts(&config, agent, world, StdRng::seed_from_u64(8));

    sim.tick_at(0);
    sim.tick_at(500);
    assert!(!sim.is_farming());
}

#[test]
fn test_monitor_runs_on_period() {
    let mut sim = Simulation::with_seed(&SimConfig::default(), 6).unwrap();
    for _ in 0..312 {
        sim.step();
    }
    assert_eq!(sim.last_monitor_ms(), 0);
    sim.step();
    assert_eq!(sim.last_monitor_ms(), 5_008);
    assert!((0.1..=0.5).contains(&sim.agent().state().epsilon));
}

#[test]
fn test_monitor_at_boosts_idle_agent() {
    let mut sim = parked_on_beacon();
    sim.agent_mut().state_mut().epsilon = 0.0;
    assert!(sim.monitor_at(5_000).is_stuck());
    assert_eq!(sim.last_monitor_ms(), 5_000);
}

#[test]
fn test_manual_monitor_ahead_of_clock() {
    let mut sim = Simulation::with_seed(&SimConfig::default(), 6).unwrap();
    sim.monitor_at(10_000);

    sim.step();
    assert_eq!(sim.clock_ms, 16);
    assert_eq!(sim.last_monitor_ms(), 10_000);

    for _ in 1..937 {
        sim.step();
    }
    assert_eq!(sim.last_monitor_ms(), 10_000);
    sim.step();
    assert_eq!(sim.clock_ms, 15_008);
    assert_eq!(sim.last_monitor_ms(), 15_008);
}

#[test]
fn test_run_logs_metrics_history() {
    let mut sim = Simulation::with_seed(&SimConfig::default(), 3).unwrap();
    let metrics = sim.run(100, 25);
    assert_eq!(sim.ticks, 100);
    assert_eq!(sim.clock_ms, 1_600);
    assert_eq!(sim.metrics_history.len(), 4);
    assert_eq!(metrics, sim.metrics());
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let config = SimConfig::default();
    let mut a = Simulation::with_seed(&config, 21).unwrap();
    let mut b = Simulation::with_seed(&config, 21).unwrap();
    assert_eq!(a.run(2_000, 0), b.run(2_000, 0));
}

#[test]
fn test_map_file_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let row = ".".repeat(200);
    let wall = "#".repeat(200);
    writeln!(file, "{}", wall).unwrap();
    for _ in 0..198 {
        writeln!(file, "{}", row).unwrap();
    }
    writeln!(file, "{}", wall).unwrap();

    let mut config = SimConfig::default();
    config.world.map_path = Some(file.path().to_string_lossy().into_owned());
    let mut sim = Simulation::with_seed(&config, 5).unwrap();

    assert_eq!(sim.world().map.width(), 200);
    assert_eq!(sim.world().map.height(), 200);
    sim.run(200, 0);
}
