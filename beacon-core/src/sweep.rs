//! Parameter sweep over the beacon farming duration and the monitor's
//! repetition threshold.
//!
//! Every candidate runs several independent headless simulations, in
//! parallel with rayon, and keeps the WORST run as its score so a lucky
//! seed cannot carry a bad setting.

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::agent::PerformanceMetrics;
use crate::config::SimConfig;
use crate::error::Result;
use crate::simulation::Simulation;

/// One point in the grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub farming_duration_ms: u64,
    pub repetition_threshold: f64,
}

impl Candidate {
    /// `base` with this candidate's two values swapped in.
    pub fn apply(&self, base: &SimConfig) -> SimConfig {
        let mut config = base.clone();
        config.world.farming_duration_ms = self.farming_duration_ms;
        config.monitor.repetition_threshold = self.repetition_threshold;
        config
    }
}

/// Result of evaluating a single candidate.
#[derive(Clone, Debug, Serialize)]
pub struct SweepResult {
    pub candidate: Candidate,
    /// Metrics of the worst run.
    pub worst: PerformanceMetrics,
}

impl SweepResult {
    /// Beacons first, average reward breaks ties.
    fn ranks_above(&self, other: &SweepResult) -> std::cmp::Ordering {
        other
            .worst
            .beacons_reached
            .cmp(&self.worst.beacons_reached)
            .then(other.worst.average_reward.total_cmp(&self.worst.average_reward))
    }
}

#[derive(Clone, Debug)]
pub struct SweepPlan {
    pub farming_durations_ms: Vec<u64>,
    pub repetition_thresholds: Vec<f64>,
    pub ticks: u64,
    pub runs: usize,
    /// Run `r` of every candidate uses seed `base_seed + r`.
    pub base_seed: u64,
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            farming_durations_ms: vec![1_000, 3_000, 5_000],
            repetition_thresholds: vec![0.6, 0.8, 1.0],
            ticks: 20_000,
            runs: 3,
            base_seed: 0,
        }
    }
}

impl SweepPlan {
    pub fn candidates(&self) -> Vec<Candidate> {
        self.farming_durations_ms
            .iter()
            .flat_map(|&farming_duration_ms| {
                self.repetition_thresholds
                    .iter()
                    .map(move |&repetition_threshold| Candidate {
                        farming_duration_ms,
                        repetition_threshold,
                    })
            })
            .collect()
    }
}

fn evaluate_single(config: &SimConfig, ticks: u64, seed: u64) -> Result<PerformanceMetrics> {
    let mut sim = Simulation::with_seed(config, seed)?;
    Ok(sim.run(ticks, 0))
}

/// Evaluate one candidate over `plan.runs` seeds and keep the worst.
pub fn evaluate(candidate: Candidate, base: &SimConfig, plan: &SweepPlan) -> Result<SweepResult> {
    let config = candidate.apply(base);
    let runs = (0..plan.runs.max(1) as u64)
        .map(|r| evaluate_single(&config, plan.ticks, plan.base_seed + r))
        .collect::<Result<Vec<_>>>()?;

    let worst = runs
        .into_iter()
        .map(|worst| SweepResult { candidate, worst })
        .max_by(|a, b| a.ranks_above(b))
        .map(|r| r.worst)
        .unwrap_or_else(|| PerformanceMetrics {
            explored_areas: 0,
            collisions: 0,
            beacons_reached: 0,
            average_reward: 0.0,
            epsilon: base.policy.epsilon,
        });

    Ok(SweepResult { candidate, worst })
}

/// Evaluate every candidate in parallel. Results come back best first.
pub fn sweep(base: &SimConfig, plan: &SweepPlan) -> Result<Vec<SweepResult>> {
    let candidates = plan.candidates();
    info!(
        "Sweeping {} candidates x {} runs x {} ticks",
        candidates.len(),
        plan.runs,
        plan.ticks
    );

    let mut results = candidates
        .into_par_iter()
        .map(|c| evaluate(c, base, plan))
        .collect::<Result<Vec<_>>>()?;

    results.sort_by(|a, b| a.ranks_above(b));
    Ok(results)
}
