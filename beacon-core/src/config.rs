//! Simulation configuration.
//!
//! Every section falls back to the defaults in `constants`, so a config file
//! only needs the values it changes:
//!
//! ```toml
//! [network]
//! layer_sizes = [4, 6, 3]
//!
//! [monitor]
//! repetition_threshold = 0.6
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub network: NetworkConfig,
    pub sensor: SensorConfig,
    pub policy: PolicyConfig,
    pub reward: RewardWeights,
    pub monitor: MonitorConfig,
    pub world: WorldConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub layer_sizes: Vec<usize>,
    pub learning_rate: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            layer_sizes: DEFAULT_LAYER_SIZES.to_vec(),
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub range: u32,
    pub update_interval_ms: u64,
    pub samples: usize,
    pub cone_degrees: f64,
    pub lateral_offset: f64,
    pub standoff: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            range: DEFAULT_SENSOR_RANGE,
            update_interval_ms: DEFAULT_SENSOR_UPDATE_INTERVAL_MS,
            samples: DEFAULT_SENSOR_SAMPLES,
            cone_degrees: DEFAULT_SENSOR_CONE_DEGREES,
            lateral_offset: DEFAULT_SENSOR_LATERAL_OFFSET,
            standoff: DEFAULT_SENSOR_STANDOFF,
        }
    }
}

/// Exploration rate bounds and the adaptive action cooldown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub epsilon: f64,
    pub epsilon_min: f64,
    pub epsilon_max: f64,
    pub decision_threshold: f64,
    pub cooldown_baseline_ms: f64,
    pub cooldown_floor_ms: f64,
    pub cooldown_ceiling_ms: f64,
    pub cooldown_shrink: f64,
    pub cooldown_grow: f64,
    pub success_reward: f64,
    pub failure_reward: f64,
    pub success_streak_reset: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            epsilon_min: EPSILON_MIN,
            epsilon_max: EPSILON_MAX,
            decision_threshold: DECISION_THRESHOLD,
            cooldown_baseline_ms: COOLDOWN_BASELINE_MS,
            cooldown_floor_ms: COOLDOWN_FLOOR_MS,
            cooldown_ceiling_ms: COOLDOWN_CEILING_MS,
            cooldown_shrink: COOLDOWN_SHRINK,
            cooldown_grow: COOLDOWN_GROW,
            success_reward: SUCCESS_REWARD,
            failure_reward: FAILURE_REWARD,
            success_streak_reset: SUCCESS_STREAK_RESET,
        }
    }
}

/// Reward shaping weights. Plugged straight into `reward::shape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    pub baseline: f64,
    pub exploration: f64,
    pub collision: f64,
    pub beacon_sensed: f64,
    pub beacon_approach: f64,
    pub farming: f64,
    pub idle: f64,
    pub wall_proximity: f64,
    pub exploration_milestone: usize,
    pub stationary_limit: u32,
    pub circling_window: usize,
    pub circling_balance: usize,
    pub wall_distance: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            baseline: REWARD_BASELINE,
            exploration: REWARD_EXPLORATION,
            collision: REWARD_COLLISION,
            beacon_sensed: REWARD_BEACON_SENSED,
            beacon_approach: REWARD_BEACON_APPROACH,
            farming: REWARD_FARMING,
            idle: REWARD_IDLE,
            wall_proximity: REWARD_WALL_PROXIMITY,
            exploration_milestone: EXPLORATION_MILESTONE,
            stationary_limit: STATIONARY_LIMIT,
            circling_window: CIRCLING_WINDOW,
            circling_balance: CIRCLING_BALANCE,
            wall_distance: WALL_PROXIMITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub period_ms: u64,
    pub inactivity_ms: u64,
    pub window: usize,
    pub repetition_threshold: f64,
    pub boost: f64,
    pub decay: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            period_ms: MONITOR_PERIOD_MS,
            inactivity_ms: INACTIVITY_MS,
            window: REPETITION_WINDOW,
            repetition_threshold: DEFAULT_REPETITION_THRESHOLD,
            boost: EPSILON_BOOST,
            decay: EPSILON_DECAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: usize,
    pub height: usize,
    /// Optional ASCII map; the built-in arena is used when absent.
    pub map_path: Option<String>,
    pub farming_duration_ms: u64,
    pub frame_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WORLD_WIDTH,
            height: DEFAULT_WORLD_HEIGHT,
            map_path: None,
            farming_duration_ms: DEFAULT_FARMING_DURATION_MS,
            frame_ms: DEFAULT_FRAME_MS,
        }
    }
}

impl SimConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(&path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.network.layer_sizes.len() < 2 {
            return Err(CoreError::config(format!(
                "layer_sizes needs at least 2 entries, got {}",
                self.network.layer_sizes.len()
            )));
        }
        if self.network.layer_sizes[0] != INPUT_SIZE {
            return Err(CoreError::config(format!(
                "first layer must have {} inputs, got {}",
                INPUT_SIZE, self.network.layer_sizes[0]
            )));
        }
        if self.network.layer_sizes.last() != Some(&OUTPUT_SIZE) {
            return Err(CoreError::config(format!("last layer must have {} outputs", OUTPUT_SIZE)));
        }
        if self.network.layer_sizes.contains(&0) {
            return Err(CoreError::config("layer sizes must be non-zero"));
        }
        if !(self.network.learning_rate > 0.0) {
            return Err(CoreError::config("learning_rate must be positive"));
        }
        let p = &self.policy;
        if p.epsilon_min > p.epsilon_max {
            return Err(CoreError::config("epsilon_min exceeds epsilon_max"));
        }
        if p.cooldown_floor_ms > p.cooldown_ceiling_ms {
            return Err(CoreError::config("cooldown_floor_ms exceeds cooldown_ceiling_ms"));
        }
        if self.sensor.samples == 0 {
            return Err(CoreError::config("sensor samples must be at least 1"));
        }
        if self.monitor.window == 0 {
            return Err(CoreError::config("monitor window must be at least 1"));
        }
        if self.world.frame_ms == 0 {
            return Err(CoreError::config("frame_ms must be positive"));
        }
        Ok(())
    }
}
