//! Exploration-rate controller.
//!
//! Runs on its own period, independent of the tick. Raises epsilon when the
//! agent is stuck in a rut and lets it decay otherwise.

use log::debug;

use crate::agent::AgentState;
use crate::config::{MonitorConfig, PolicyConfig};

/// Why the monitor judged the agent to be stuck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// No action ever, or none within `inactivity_ms`.
    Inactive,
    /// One action holds at least `repetition_threshold` of the recent window.
    Repetitive(f64),
    Healthy,
}

impl Verdict {
    pub fn is_stuck(self) -> bool {
        !matches!(self, Verdict::Healthy)
    }
}

#[derive(Debug, Clone)]
pub struct Monitor {
    config: MonitorConfig,
    epsilon_min: f64,
    epsilon_max: f64,
}

impl Monitor {
    pub fn new(config: MonitorConfig, policy: &PolicyConfig) -> Self {
        Self {
            config,
            epsilon_min: policy.epsilon_min,
            epsilon_max: policy.epsilon_max,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn period_ms(&self) -> u64 {
        self.config.period_ms
    }

    pub fn check(&self, state: &AgentState, now_ms: u64) -> Verdict {
        let idle = match state.last_action_time {
            None => true,
            Some(t) => now_ms.saturating_sub(t) > self.config.inactivity_ms,
        };
        if idle {
            return Verdict::Inactive;
        }
        match state.action_history.dominant(self.config.window) {
            Some((_, share)) if share >= self.config.repetition_threshold => {
                Verdict::Repetitive(share)
            }
            _ => Verdict::Healthy,
        }
    }

    /// One monitor invocation. Returns the verdict that drove the update.
    pub fn run(&self, state: &mut AgentState, now_ms: u64) -> Verdict {
        let verdict = self.check(state, now_ms);
        let before = state.epsilon;
        state.epsilon = if verdict.is_stuck() {
            (state.epsilon * self.config.boost).min(self.epsilon_max)
        } else {
            (state.epsilon * self.config.decay).max(self.epsilon_min)
        };
        debug!(
            "monitor {}ms: {:?}, epsilon {:.4} -> {:.4}",
            now_ms, verdict, before, state.epsilon
        );
        verdict
    }
}
