//! Constants for the beacon runner simulation.
//!
//! Topology: 4 sensor inputs → hidden (ReLU) → 3 motor outputs (sigmoid).
//! Every value here is a default; `SimConfig` can override all of them.

// =============================================================================
// Network Topology
// =============================================================================

/// Sensor inputs: [left distance, left detected, right distance, right detected].
pub const INPUT_SIZE: usize = 4;

/// Motor outputs: [forward, turn left, turn right].
pub const OUTPUT_SIZE: usize = 3;

/// Default layer sizes. Two hidden layers of 8.
pub const DEFAULT_LAYER_SIZES: [usize; 4] = [INPUT_SIZE, 8, 8, OUTPUT_SIZE];

/// Default learning rate for on-line backpropagation.
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// Uniform init range: weights and biases start in [-WEIGHT_INIT_RANGE, +WEIGHT_INIT_RANGE].
pub const WEIGHT_INIT_RANGE: f64 = 1.0;

/// Pad value for target slots that carry no reward signal.
/// The reward lives in slot 0; the other outputs are trained toward this value.
pub const TARGET_PAD: f64 = 0.0;

// =============================================================================
// Sensors
// =============================================================================

/// Maximum ray length in pixels.
pub const DEFAULT_SENSOR_RANGE: u32 = 100;

/// Divisor applied to sensor distances before they reach the network.
pub const DISTANCE_NORMALIZER: f64 = 100.0;

/// Minimum milliseconds between sensor refreshes.
pub const DEFAULT_SENSOR_UPDATE_INTERVAL_MS: u64 = 100;

/// Rays sampled per sensor.
pub const DEFAULT_SENSOR_SAMPLES: usize = 5;

/// Width of the sampled cone, in degrees, centred on the heading.
pub const DEFAULT_SENSOR_CONE_DEGREES: f64 = 15.0;

/// Half the distance between the two sensors, measured along the body rim.
pub const DEFAULT_SENSOR_LATERAL_OFFSET: f64 = 10.0;

/// How far past the body rim the sensors sit.
pub const DEFAULT_SENSOR_STANDOFF: f64 = 5.0;

// =============================================================================
// Body & Motion
// =============================================================================

pub const BODY_RADIUS: f64 = 15.0;

/// Pixels per forward step.
pub const MOVE_STEP: f64 = 5.0;

/// Radians per turn (10 degrees).
pub const TURN_STEP: f64 = std::f64::consts::PI / 18.0;

// =============================================================================
// Policy
// =============================================================================

/// A normalized decision component must exceed this to trigger its action.
pub const DECISION_THRESHOLD: f64 = 0.4;

pub const DEFAULT_EPSILON: f64 = 0.1;
pub const EPSILON_MIN: f64 = 0.1;
pub const EPSILON_MAX: f64 = 0.5;

/// Capacity of the action history ring.
pub const ACTION_HISTORY_CAPACITY: usize = 20;

// =============================================================================
// Adaptive Cooldown
// =============================================================================

/// Baseline milliseconds between dispatched actions.
pub const COOLDOWN_BASELINE_MS: f64 = 64.0;

/// One frame: act every tick at best.
pub const COOLDOWN_FLOOR_MS: f64 = 16.0;

/// Upper bound for the adaptive cooldown.
pub const COOLDOWN_CEILING_MS: f64 = 150.0;

/// Multiplier applied on a rewarding tick.
pub const COOLDOWN_SHRINK: f64 = 0.9;

/// Multiplier applied on a punishing tick.
pub const COOLDOWN_GROW: f64 = 1.1;

/// Reward above this counts as a success.
pub const SUCCESS_REWARD: f64 = 0.3;

/// Reward below this counts as a failure.
pub const FAILURE_REWARD: f64 = -0.2;

/// Consecutive successes after which the cooldown returns to baseline.
pub const SUCCESS_STREAK_RESET: u32 = 10;

// =============================================================================
// Reward Shaping
// =============================================================================

pub const REWARD_BASELINE: f64 = 0.05;
pub const REWARD_EXPLORATION: f64 = 0.2;
pub const REWARD_COLLISION: f64 = -0.5;
pub const REWARD_BEACON_SENSED: f64 = 0.3;
pub const REWARD_BEACON_APPROACH: f64 = 0.5;
pub const REWARD_FARMING: f64 = 1.0;
pub const REWARD_IDLE: f64 = -0.1;
pub const REWARD_WALL_PROXIMITY: f64 = -0.05;

/// Explored-cell count granularity for the exploration bonus.
pub const EXPLORATION_MILESTONE: usize = 10;

/// Ticks without movement before the idle penalty applies.
pub const STATIONARY_LIMIT: u32 = 10;

/// Actions inspected by the circling check.
pub const CIRCLING_WINDOW: usize = 20;

/// Left/right turn counts closer than this are considered circling.
pub const CIRCLING_BALANCE: usize = 5;

/// Sensed wall distance below which the proximity penalty applies.
pub const WALL_PROXIMITY: f64 = 10.0;

// =============================================================================
// Monitor
// =============================================================================

pub const MONITOR_PERIOD_MS: u64 = 5_000;

/// No action for this long counts as inactive.
pub const INACTIVITY_MS: u64 = 5_000;

/// Recent actions inspected by the repetition check.
pub const REPETITION_WINDOW: usize = 5;

/// Share of the window one action must hold to count as repetitive.
pub const DEFAULT_REPETITION_THRESHOLD: f64 = 0.8;

pub const EPSILON_BOOST: f64 = 1.1;
pub const EPSILON_DECAY: f64 = 0.99;

// =============================================================================
// World
// =============================================================================

pub const DEFAULT_WORLD_WIDTH: usize = 800;
pub const DEFAULT_WORLD_HEIGHT: usize = 600;

pub const BEACON_SIZE: usize = 30;

/// Distance from the beacon edge at which the body counts as arrived.
pub const BEACON_REACH_MARGIN: f64 = 15.0;

/// Keep relocated beacons this far from the arena edge.
pub const BEACON_PADDING: usize = 50;

/// How long the agent farms a reached beacon before it relocates.
pub const DEFAULT_FARMING_DURATION_MS: u64 = 3_000;

/// Simulated milliseconds per frame (~60 fps).
pub const DEFAULT_FRAME_MS: u64 = 16;
