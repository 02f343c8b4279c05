//! Reward shaping.
//!
//! ## Reward Formula
//! ```text
//! reward = baseline
//!        + exploration      × [explored cells reached a new milestone]
//!        + collision        × [move blocked by a wall]
//!        + beacon_sensed    × [either sensor sees the beacon]
//!        + beacon_approach  × [sensed beacon distance shrank]
//!        + farming          × [sitting on a reached beacon]
//!        + idle             × [stationary too long or circling]
//!        + wall_proximity   × [wall sensed closer than wall_distance]
//! ```
//! Penalty weights are negative in `RewardWeights`, so every term is added.

use serde::Serialize;

use crate::config::RewardWeights;
use crate::history::ActionHistory;
use crate::sensor::SensorPair;
use crate::world::Action;

/// Everything the shaping function looks at for one tick.
#[derive(Debug, Clone, Copy)]
pub struct RewardContext<'a> {
    pub sensors: &'a SensorPair,
    pub collided: bool,
    pub explored_cells: usize,
    /// Milestones already paid out (explored_cells / milestone at the last bonus).
    pub milestones_rewarded: usize,
    pub previous_beacon_distance: Option<f64>,
    pub farming: bool,
    pub stationary_ticks: u32,
    pub circling: bool,
}

/// Per-term contributions, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RewardBreakdown {
    pub baseline: f64,
    pub exploration: f64,
    pub collision: f64,
    pub beacon_sensed: f64,
    pub beacon_approach: f64,
    pub farming: f64,
    pub idle: f64,
    pub wall_proximity: f64,
}

impl RewardBreakdown {
    pub fn total(&self) -> f64 {
        self.baseline
            + self.exploration
            + self.collision
            + self.beacon_sensed
            + self.beacon_approach
            + self.farming
            + self.idle
            + self.wall_proximity
    }

    pub fn earned_milestone(&self) -> bool {
        self.exploration != 0.0
    }
}

/// Score one tick.
pub fn shape(ctx: &RewardContext<'_>, weights: &RewardWeights) -> RewardBreakdown {
    let mut r = RewardBreakdown {
        baseline: weights.baseline,
        ..RewardBreakdown::default()
    };

    let milestone = weights.exploration_milestone.max(1);
    if ctx.explored_cells / milestone > ctx.milestones_rewarded {
        r.exploration = weights.exploration;
    }

    if ctx.collided {
        r.collision = weights.collision;
    }

    if ctx.sensors.beacon_sensed() {
        r.beacon_sensed = weights.beacon_sensed;
    }

    if let (Some(prev), Some(now)) = (ctx.previous_beacon_distance, ctx.sensors.beacon_distance()) {
        if now < prev {
            r.beacon_approach = weights.beacon_approach;
        }
    }

    if ctx.farming {
        r.farming = weights.farming;
    }

    if ctx.stationary_ticks > weights.stationary_limit || ctx.circling {
        r.idle = weights.idle;
    }

    if ctx.sensors.wall_within(weights.wall_distance) {
        r.wall_proximity = weights.wall_proximity;
    }

    r
}

/// True if the last `circling_window` actions hold a near-even mix of left
/// and right turns. Needs a full window.
pub fn is_circling(history: &ActionHistory, weights: &RewardWeights) -> bool {
    let window = weights.circling_window;
    if history.len() < window {
        return false;
    }
    let left = history.count_recent(window, Action::TurnLeft);
    let right = history.count_recent(window, Action::TurnRight);
    left.abs_diff(right) < weights.circling_balance
}
