//! The Agent: sense → decide → act → evaluate → learn.
//!
//! One `tick` runs the whole loop once:
//! 1. SENSE: read both sensors (throttled), normalize to 4 inputs
//! 2. DECIDE: epsilon-greedy between a random action and the network
//! 3. ACT: hand the command to the world, which may block it
//! 4. EVALUATE: shape a reward, adapt the action cooldown
//! 5. LEARN: one backprop step on the decision that led here
//! 6. BOOKKEEPING: explored cells, stationary counter
//!
//! The exploration rate is adjusted from outside by the `Monitor`, which
//! takes `&mut AgentState` between ticks.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{PolicyConfig, RewardWeights, SimConfig};
use crate::constants::*;
use crate::environment::Classifier;
use crate::error::{NetworkError, Result};
use crate::history::ActionHistory;
use crate::network::{Network, StateImport, TrainingSample};
use crate::reward::{self, RewardBreakdown, RewardContext};
use crate::sensor::{SensorModel, SensorPair};
use crate::utils::cell_of;
use crate::world::{Action, ActionExecutor, ActionOutcome};

/// Per-agent bookkeeping. Serialized fields are persisted; the rest is
/// session-local and resets on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentState {
    pub epsilon: f64,
    pub explored_areas: BTreeSet<(i64, i64)>,
    pub collision_counter: u64,
    pub beacon_reached_counter: u64,
    /// Reward earned since the current beacon was placed.
    pub cumulative_reward: f64,
    /// Reward earned over the agent's lifetime.
    pub total_reward: f64,
    pub reward_count: u64,
    /// Milliseconds that must pass between dispatched actions.
    pub action_cooldown: f64,
    pub success_streak: u32,

    #[serde(skip)]
    pub action_history: ActionHistory,
    #[serde(skip)]
    pub last_action: Option<Action>,
    #[serde(skip)]
    pub last_action_time: Option<u64>,
    #[serde(skip)]
    pub last_beacon_distance: Option<f64>,
    #[serde(skip)]
    pub is_beacon_reached: bool,
    #[serde(skip)]
    pub stationary_counter: u32,
    #[serde(skip)]
    pub last_position: Option<(f64, f64)>,
    #[serde(skip)]
    pub milestones_rewarded: usize,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            explored_areas: BTreeSet::new(),
            collision_counter: 0,
            beacon_reached_counter: 0,
            cumulative_reward: 0.0,
            total_reward: 0.0,
            reward_count: 0,
            action_cooldown: COOLDOWN_BASELINE_MS,
            success_streak: 0,
            action_history: ActionHistory::default(),
            last_action: None,
            last_action_time: None,
            last_beacon_distance: None,
            is_beacon_reached: false,
            stationary_counter: 0,
            last_position: None,
            milestones_rewarded: 0,
        }
    }
}

impl AgentState {
    pub fn new(policy: &PolicyConfig) -> Self {
        Self {
            epsilon: policy.epsilon.clamp(policy.epsilon_min, policy.epsilon_max),
            action_cooldown: policy.cooldown_baseline_ms,
            ..Self::default()
        }
    }

    pub fn average_reward(&self) -> f64 {
        if self.reward_count > 0 {
            self.total_reward / self.reward_count as f64
        } else {
            0.0
        }
    }

    fn record_reward(&mut self, reward: f64) {
        self.total_reward += reward;
        self.cumulative_reward += reward;
        self.reward_count += 1;
    }
}

/// Snapshot of how the agent is doing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub explored_areas: usize,
    pub collisions: u64,
    pub beacons_reached: u64,
    pub average_reward: f64,
    pub epsilon: f64,
}

/// How this tick's action was chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum Choice {
    /// Still inside the action cooldown; the cycle stopped after sensing.
    CoolingDown,
    Explore(Action),
    /// Network decision (normalized to sum 1) and the action it selected, if any.
    Exploit { decision: Vec<f64>, action: Option<Action> },
}

impl Choice {
    pub fn action(&self) -> Option<Action> {
        match self {
            Choice::CoolingDown => None,
            Choice::Explore(a) => Some(*a),
            Choice::Exploit { action, .. } => *action,
        }
    }
}

/// What happened during one tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub sensors: SensorPair,
    pub choice: Choice,
    pub outcome: Option<ActionOutcome>,
    pub reward: RewardBreakdown,
    pub trained: bool,
}

/// Pick an action from a normalized network decision.
///
/// Forward wins if it clears the threshold; otherwise the larger turn wins
/// if it clears the threshold; otherwise nothing.
///
/// # Arguments
/// * `decision` - `[forward, left, right]`, normally from `normalize_decision`
/// * `threshold` - strict lower bound a score must exceed to act
///
/// # Returns
/// `None` when no score clears the threshold, when the two turn scores tie,
/// or when `decision` has fewer than three entries.
pub fn select_action(decision: &[f64], threshold: f64) -> Option<Action> {
    let &[fwd, left, right, ..] = decision else {
        return None;
    };
    if fwd > threshold {
        Some(Action::MoveForward)
    } else if left > right && left > threshold {
        Some(Action::TurnLeft)
    } else if right > left && right > threshold {
        Some(Action::TurnRight)
    } else {
        None
    }
}

/// Scale a decision vector to sum to 1. A zero vector is returned unchanged.
///
/// Sigmoid outputs are positive, so the sum is only zero when every
/// output underflowed; dividing then would produce NaN scores.
pub fn normalize_decision(raw: &[f64]) -> Vec<f64> {
    let sum: f64 = raw.iter().sum();
    if sum == 0.0 {
        return raw.to_vec();
    }
    raw.iter().map(|v| v / sum).collect()
}

/// The learning agent.
#[derive(Debug, Clone)]
pub struct Agent {
    network: Network,
    state: AgentState,
    sensors: SensorModel,
    policy: PolicyConfig,
    weights: RewardWeights,
    /// Inputs at the most recent decision; the next reward trains on these.
    previous_inputs: Option<[f64; INPUT_SIZE]>,
    rng: StdRng,
}

impl Agent {
    pub fn new(config: &SimConfig) -> Result<Self> {
        Self::build(config, StdRng::from_entropy())
    }

    /// Deterministic agent: same seed, same weights, same exploration draws.
    pub fn with_seed(config: &SimConfig, seed: u64) -> Result<Self> {
        Self::build(config, StdRng::seed_from_u64(seed))
    }

    fn build(config: &SimConfig, mut rng: StdRng) -> Result<Self> {
        config.validate()?;
        let network = Network::with_rng(
            &config.network.layer_sizes,
            config.network.learning_rate,
            &mut rng,
        )?;
        Ok(Self {
            network,
            state: AgentState::new(&config.policy),
            sensors: SensorModel::new(config.sensor.clone()),
            policy: config.policy.clone(),
            weights: config.reward.clone(),
            previous_inputs: None,
            rng,
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }

    pub fn sensors(&self) -> &SensorModel {
        &self.sensors
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn has_previous_decision(&self) -> bool {
        self.previous_inputs.is_some()
    }

    /// Load network weights. On rejection the current weights stay.
    pub fn import_network(&mut self, state: StateImport) -> std::result::Result<(), NetworkError> {
        self.network.import_state(state)
    }

    /// Adopt persisted bookkeeping. Session-local fields keep their current values.
    ///
    /// Epsilon and the action cooldown are clamped into the configured
    /// policy ranges. The paid-milestone count is rebuilt from the explored
    /// cell count so restored exploration is not paid a second time.
    pub fn restore_state(&mut self, restored: AgentState) {
        let s = &mut self.state;
        s.epsilon = restored.epsilon.clamp(self.policy.epsilon_min, self.policy.epsilon_max);
        s.explored_areas = restored.explored_areas;
        s.collision_counter = restored.collision_counter;
        s.beacon_reached_counter = restored.beacon_reached_counter;
        s.cumulative_reward = restored.cumulative_reward;
        s.total_reward = restored.total_reward;
        s.reward_count = restored.reward_count;
        s.action_cooldown = restored
            .action_cooldown
            .clamp(self.policy.cooldown_floor_ms, self.policy.cooldown_ceiling_ms);
        s.success_streak = restored.success_streak;
        s.milestones_rewarded = s.explored_areas.len() / self.weights.exploration_milestone.max(1);
        info!(
            "Restored agent state: {} explored cells, {} beacons, epsilon {:.3}",
            s.explored_areas.len(),
            s.beacon_reached_counter,
            s.epsilon
        );
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics {
            explored_areas: self.state.explored_areas.len(),
            collisions: self.state.collision_counter,
            beacons_reached: self.state.beacon_reached_counter,
            average_reward: self.state.average_reward(),
            epsilon: self.state.epsilon,
        }
    }

    /// The game loop saw the body arrive at the beacon.
    pub fn on_beacon_reached(&mut self) {
        if self.state.is_beacon_reached {
            return;
        }
        self.state.is_beacon_reached = true;
        self.state.beacon_reached_counter += 1;
        info!("Beacon reached (total {})", self.state.beacon_reached_counter);
    }

    /// The game loop moved the beacon somewhere new.
    pub fn on_beacon_relocated(&mut self) {
        self.state.is_beacon_reached = false;
        self.state.last_beacon_distance = None;
        self.state.cumulative_reward = 0.0;
    }

    /// Run one sense → decide → act → evaluate → learn cycle. Inside the
    /// action cooldown only the sensors are read.
    ///
    /// 1. Sense: throttled ray-cast readings, normalized to network input.
    /// 2. Decide: with probability epsilon a uniform random action,
    ///    otherwise the network's normalized decision through
    ///    `select_action`. The inputs are kept for training.
    /// 3. Act: execute the action, if any, and record it in the history.
    /// 4. Evaluate: shape the reward; only a wall block counts as a
    ///    collision. The cooldown adapts to the total.
    /// 5. Learn: one backprop step toward the reward on the kept inputs.
    /// 6. Bookkeeping: mark the body's grid cell explored and track
    ///    whether it stood still.
    ///
    /// # Arguments
    /// * `world` - sensed and acted on; the beacon is not moved here
    /// * `now_ms` - caller's clock, drives the sensor throttle and cooldown
    ///
    /// # Returns
    /// What was sensed, chosen, done and paid this tick.
    pub fn tick<W>(&mut self, world: &mut W, now_ms: u64) -> TickReport
    where
        W: Classifier + ActionExecutor,
    {
        // ====================================================================
        // 1. SENSE
        // ====================================================================
        let sensors = self.sensors.sensor_data(world.pose(), &*world, now_ms);
        let inputs = sensors.normalized();

        // ====================================================================
        // 2. DECIDE
        // ====================================================================
        if self.cooling_down(now_ms) {
            return TickReport {
                sensors,
                choice: Choice::CoolingDown,
                outcome: None,
                reward: RewardBreakdown::default(),
                trained: false,
            };
        }
        let choice = self.decide(&inputs);

        // ====================================================================
        // 3. ACT
        // ====================================================================
        let outcome = choice.action().map(|action| {
            let outcome = world.execute(action);
            self.state.action_history.push(action, now_ms);
            self.state.last_action = Some(action);
            self.state.last_action_time = Some(now_ms);
            outcome
        });

        // ====================================================================
        // 4. EVALUATE
        // ====================================================================
        let collided = outcome.is_some_and(ActionOutcome::is_collision);
        let reward = self.evaluate(&sensors, collided);

        // ====================================================================
        // 5. LEARN
        // ====================================================================
        let trained = self.learn(reward.total());

        // ====================================================================
        // 6. BOOKKEEPING
        // ====================================================================
        let pose = world.pose();
        self.update_exploration(pose.x, pose.y);

        debug!(
            "tick {}ms: {:?} -> {:?}, reward {:.3}",
            now_ms,
            choice,
            outcome,
            reward.total()
        );

        TickReport {
            sensors,
            choice,
            outcome,
            reward,
            trained,
        }
    }

    fn cooling_down(&self, now_ms: u64) -> bool {
        match self.state.last_action_time {
            Some(t) => (now_ms.saturating_sub(t) as f64) < self.state.action_cooldown,
            None => false,
        }
    }

    fn decide(&mut self, inputs: &[f64; INPUT_SIZE]) -> Choice {
        let choice = if self.rng.gen::<f64>() < self.state.epsilon {
            let action = Action::ALL[self.rng.gen_range(0..Action::ALL.len())];
            Choice::Explore(action)
        } else {
            match self.network.feed_forward(inputs) {
                Ok(raw) => {
                    let decision = normalize_decision(&raw);
                    let action = select_action(&decision, self.policy.decision_threshold);
                    Choice::Exploit { decision, action }
                }
                Err(e) => {
                    warn!("Network rejected sensor input: {}", e);
                    Choice::Exploit {
                        decision: Vec::new(),
                        action: None,
                    }
                }
            }
        };
        self.previous_inputs = Some(*inputs);
        choice
    }

    fn evaluate(&mut self, sensors: &SensorPair, collided: bool) -> RewardBreakdown {
        let circling = reward::is_circling(&self.state.action_history, &self.weights);
        let ctx = RewardContext {
            sensors,
            collided,
            explored_cells: self.state.explored_areas.len(),
            milestones_rewarded: self.state.milestones_rewarded,
            previous_beacon_distance: self.state.last_beacon_distance,
            farming: self.state.is_beacon_reached,
            stationary_ticks: self.state.stationary_counter,
            circling,
        };
        let breakdown = reward::shape(&ctx, &self.weights);

        if breakdown.earned_milestone() {
            self.state.milestones_rewarded =
                self.state.explored_areas.len() / self.weights.exploration_milestone.max(1);
        }
        if collided {
            self.state.collision_counter += 1;
        }
        self.state.last_beacon_distance = sensors.beacon_distance();

        let total = breakdown.total();
        self.adapt_cooldown(total);
        self.state.record_reward(total);
        breakdown
    }

    /// Shrink the cooldown on success, grow it on failure.
    fn adapt_cooldown(&mut self, reward: f64) {
        let p = &self.policy;
        let s = &mut self.state;
        if reward > p.success_reward {
            s.action_cooldown = (s.action_cooldown * p.cooldown_shrink).max(p.cooldown_floor_ms);
            s.success_streak += 1;
            if s.success_streak >= p.success_streak_reset {
                s.action_cooldown = p.cooldown_baseline_ms;
                s.success_streak = 0;
            }
        } else if reward < p.failure_reward {
            s.action_cooldown = (s.action_cooldown * p.cooldown_grow).min(p.cooldown_ceiling_ms);
            s.success_streak = 0;
        }
    }

    fn learn(&mut self, reward: f64) -> bool {
        let Some(inputs) = self.previous_inputs else {
            return false;
        };
        let sample = TrainingSample::scalar(inputs.to_vec(), reward, self.network.output_size());
        match self.network.train(&[sample], 1) {
            Ok(()) => true,
            Err(e) => {
                warn!("Training step skipped: {}", e);
                false
            }
        }
    }

    fn update_exploration(&mut self, x: f64, y: f64) {
        self.state.explored_areas.insert(cell_of(x, y));
        if self.state.last_position == Some((x, y)) {
            self.state.stationary_counter += 1;
        } else {
            self.state.stationary_counter = 0;
        }
        self.state.last_position = Some((x, y));
    }
}
