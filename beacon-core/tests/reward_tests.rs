use beacon_core::config::RewardWeights;
use beacon_core::history::ActionHistory;
use beacon_core::reward::*;
use beacon_core::sensor::{SensorKind, SensorPair, SensorReading};
use beacon_core::world::Action;

fn clear() -> SensorPair {
    SensorPair::empty(100)
}

fn ctx(sensors: &SensorPair) -> RewardContext<'_> {
    RewardContext {
        sensors,
        collided: false,
        explored_cells: 1,
        milestones_rewarded: 0,
        previous_beacon_distance: None,
        farming: false,
        stationary_ticks: 0,
        circling: false,
    }
}

fn beacon_at(distance: f64) -> SensorPair {
    SensorPair {
        left: SensorReading {
            distance,
            detected: true,
            kind: SensorKind::Beacon,
        },
        right: SensorReading::miss(100),
    }
}

#[test]
fn test_baseline_only() {
    let sensors = clear();
    let r = shape(&ctx(&sensors), &RewardWeights::default());
    assert!((r.total() - 0.05).abs() < 1e-9);
}

#[test]
fn test_collision_only() {
    let sensors = clear();
    let c = RewardContext {
        collided: true,
        ..ctx(&sensors)
    };
    let r = shape(&c, &RewardWeights::default());
    assert!((r.total() - -0.45).abs() < 1e-9);
    assert_eq!(r.collision, -0.5);
}

#[test]
fn test_beacon_sensed_and_closer() {
    let sensors = beacon_at(30.0);
    let c = RewardContext {
        previous_beacon_distance: Some(40.0),
        ..ctx(&sensors)
    };
    let r = shape(&c, &RewardWeights::default());
    assert!((r.total() - 0.85).abs() < 1e-9);
}

#[test]
fn test_beacon_sensed_not_closer() {
    let sensors = beacon_at(30.0);
    let c = RewardContext {
        previous_beacon_distance: Some(30.0),
        ..ctx(&sensors)
    };
    let r = shape(&c, &RewardWeights::default());
    assert_eq!(r.beacon_approach, 0.0);
    assert!((r.total() - 0.35).abs() < 1e-9);
}

#[test]
fn test_stationary_eleven_ticks() {
    let sensors = clear();
    let c = RewardContext {
        stationary_ticks: 11,
        ..ctx(&sensors)
    };
    let r = shape(&c, &RewardWeights::default());
    assert!((r.total() - -0.05).abs() < 1e-9);

    let c = RewardContext {
        stationary_ticks: 10,
        ..ctx(&sensors)
    };
    assert_eq!(shape(&c, &RewardWeights::default()).idle, 0.0);
}

#[test]
fn test_milestone_paid_once() {
    let sensors = clear();
    let weights = RewardWeights::default();

    let c = RewardContext {
        explored_cells: 10,
        milestones_rewarded: 0,
        ..ctx(&sensors)
    };
    let r = shape(&c, &weights);
    assert!(r.earned_milestone());
    assert!((r.exploration - 0.2).abs() < 1e-12);

    let c = RewardContext {
        explored_cells: 11,
        milestones_rewarded: 1,
        ..ctx(&sensors)
    };
    assert!(!shape(&c, &weights).earned_milestone());
}

#[test]
fn test_farming_and_wall_proximity() {
    let sensors = SensorPair {
        left: SensorReading {
            distance: 4.0,
            detected: true,
            kind: SensorKind::Wall,
        },
        right: SensorReading::miss(100),
    };
    let c = RewardContext {
        farming: true,
        ..ctx(&sensors)
    };
    let r = shape(&c, &RewardWeights::default());
    assert_eq!(r.farming, 1.0);
    assert_eq!(r.wall_proximity, -0.05);
    assert!((r.total() - 1.0).abs() < 1e-9);
}

#[test]
fn test_custom_weights_apply() {
    let sensors = clear();
    let weights = RewardWeights {
        baseline: 0.0,
        collision: -2.0,
        ..RewardWeights::default()
    };
    let c = RewardContext {
        collided: true,
        ..ctx(&sensors)
    };
    assert_eq!(shape(&c, &weights).total(), -2.0);
}

#[test]
fn test_circling_needs_full_window() {
    let weights = RewardWeights::default();
    let mut h = ActionHistory::default();
    for t in 0..19 {
        let a = if t % 2 == 0 { Action::TurnLeft } else { Action::TurnRight };
        h.push(a, t);
    }
    assert!(!is_circling(&h, &weights));
    h.push(Action::TurnRight, 19);
    assert!(is_circling(&h, &weights));
}

#[test]
fn test_one_sided_turning_is_not_circling() {
    let weights = RewardWeights::default();
    let mut h = ActionHistory::default();
    for t in 0..20 {
        h.push(Action::TurnLeft, t);
    }
    assert!(!is_circling(&h, &weights));
}
