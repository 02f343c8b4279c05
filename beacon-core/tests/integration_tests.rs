//! Long headless runs and the parameter sweep.

use beacon_core::config::SimConfig;
use beacon_core::simulation::Simulation;
use beacon_core::sweep::{evaluate, sweep, Candidate, SweepPlan};

#[test]
fn test_simulation_runs_10000_ticks_without_crash() {
    let mut sim = Simulation::with_seed(&SimConfig::default(), 1).unwrap();
    let metrics = sim.run(10_000, 0);
    assert_eq!(sim.ticks, 10_000);
    assert!(metrics.explored_areas > 0);
    assert!((0.1..=0.5).contains(&metrics.epsilon));
    assert!(sim.agent().state().action_history.len() <= 20);
}

#[test]
fn test_network_shape_survives_long_run() {
    let mut sim = Simulation::with_seed(&SimConfig::default(), 2).unwrap();
    sim.run(5_000, 0);
    let state = sim.agent().network().export_state();
    assert_eq!(state.weights.iter().map(Vec::len).collect::<Vec<_>>(), vec![32, 64, 24]);
    assert!(state.weights.iter().flatten().all(|w| w.is_finite()));
}

#[test]
fn test_candidate_apply() {
    let base = SimConfig::default();
    let c = Candidate {
        farming_duration_ms: 1_000,
        repetition_threshold: 0.6,
    };
    let config = c.apply(&base);
    assert_eq!(config.world.farming_duration_ms, 1_000);
    assert!((config.monitor.repetition_threshold - 0.6).abs() < 1e-12);
    assert_eq!(config.network, base.network);
}

#[test]
fn test_plan_grid() {
    let plan = SweepPlan::default();
    let candidates = plan.candidates();
    assert_eq!(candidates.len(), 9);
    assert_eq!(candidates[0].farming_duration_ms, 1_000);
    assert!((candidates[1].repetition_threshold - 0.8).abs() < 1e-12);
}

#[test]
fn test_evaluate_is_deterministic() {
    let plan = SweepPlan {
        ticks: 300,
        runs: 2,
        ..SweepPlan::default()
    };
    let c = Candidate {
        farming_duration_ms: 3_000,
        repetition_threshold: 0.8,
    };
    let a = evaluate(c, &SimConfig::default(), &plan).unwrap();
    let b = evaluate(c, &SimConfig::default(), &plan).unwrap();
    assert_eq!(a.worst, b.worst);
}

#[test]
fn test_sweep_sorted_best_first() {
    let plan = SweepPlan {
        farming_durations_ms: vec![1_000, 3_000],
        repetition_thresholds: vec![0.8],
        ticks: 500,
        runs: 2,
        base_seed: 4,
    };
    let results = sweep(&SimConfig::default(), &plan).unwrap();
    assert_eq!(results.len(), 2);
    let first = &results[0].worst;
    let second = &results[1].worst;
    assert!(
        first.beacons_reached > second.beacons_reached
            || (first.beacons_reached == second.beacons_reached
                && first.average_reward >= second.average_reward)
    );
}
