//! The Simulation: orchestrates the Agent, the World and the Monitor.
//!
//! Stands in for the browser game loop. Time is a millisecond clock that
//! only moves when `step` is called, so runs are reproducible.

use std::fs;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agent::{Agent, PerformanceMetrics, TickReport};
use crate::config::SimConfig;
use crate::environment::GridMap;
use crate::error::Result;
use crate::monitor::{Monitor, Verdict};
use crate::world::World;

/// The main simulation runner.
#[derive(Debug)]
pub struct Simulation {
    agent: Agent,
    world: World,
    monitor: Monitor,

    farming_duration_ms: u64,
    frame_ms: u64,

    /// Simulated time in milliseconds.
    pub clock_ms: u64,

    /// Frames stepped so far.
    pub ticks: u64,

    /// When the current beacon was reached, while farming it.
    farming_since: Option<u64>,

    last_monitor_ms: u64,

    /// Drives beacon relocation; separate from the agent's own stream.
    rng: StdRng,

    /// Metrics snapshot taken at every log interval.
    pub metrics_history: Vec<PerformanceMetrics>,
}

impl Simulation {
    pub fn new(config: &SimConfig) -> Result<Self> {
        let agent = Agent::new(config)?;
        Self::assemble(config, agent, StdRng::from_entropy())
    }

    /// Fully deterministic run.
    pub fn with_seed(config: &SimConfig, seed: u64) -> Result<Self> {
        let agent = Agent::with_seed(config, seed)?;
        Self::assemble(config, agent, StdRng::seed_from_u64(seed.wrapping_add(1)))
    }

    fn assemble(config: &SimConfig, agent: Agent, mut rng: StdRng) -> Result<Self> {
        let world = match &config.world.map_path {
            Some(path) => {
                let text = fs::read_to_string(path)?;
                World::from_map(GridMap::from_ascii(&text)?, &mut rng)
            }
            None => World::arena(config.world.width, config.world.height),
        };
        Ok(Self::from_parts(config, agent, world, rng))
    }

    /// Build around an existing agent and world.
    pub fn from_parts(config: &SimConfig, agent: Agent, world: World, rng: StdRng) -> Self {
        Self {
            agent,
            world,
            monitor: Monitor::new(config.monitor.clone(), &config.policy),
            farming_duration_ms: config.world.farming_duration_ms,
            frame_ms: config.world.frame_ms,
            clock_ms: 0,
            ticks: 0,
            farming_since: None,
            last_monitor_ms: 0,
            rng,
            metrics_history: Vec::new(),
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut Agent {
        &mut self.agent
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn frame_ms(&self) -> u64 {
        self.frame_ms
    }

    pub fn last_monitor_ms(&self) -> u64 {
        self.last_monitor_ms
    }

    pub fn is_farming(&self) -> bool {
        self.farming_since.is_some()
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        self.agent.metrics()
    }

    /// One game-loop frame at `now_ms`: beacon lifecycle, then one agent tick.
    pub fn tick_at(&mut self, now_ms: u64) -> TickReport {
        match self.farming_since {
            None if self.world.beacon_reached() => {
                self.agent.on_beacon_reached();
                self.farming_since = Some(now_ms);
            }
            Some(since) if now_ms.saturating_sub(since) >= self.farming_duration_ms => {
                self.world.relocate_beacon(&mut self.rng);
                self.agent.on_beacon_relocated();
                self.farming_since = None;
                info!(
                    "Beacon moved to ({:.0}, {:.0}) after {}ms of farming",
                    self.world.beacon.x,
                    self.world.beacon.y,
                    now_ms.saturating_sub(since)
                );
            }
            _ => {}
        }

        self.agent.tick(&mut self.world, now_ms)
    }

    /// One monitor invocation at `now_ms`.
    pub fn monitor_at(&mut self, now_ms: u64) -> Verdict {
        self.last_monitor_ms = now_ms;
        self.monitor.run(self.agent.state_mut(), now_ms)
    }

    /// Advance the clock by one frame, tick, and run the monitor when due.
    pub fn step(&mut self) -> TickReport {
        self.clock_ms += self.frame_ms;
        let report = self.tick_at(self.clock_ms);
        if self.clock_ms.saturating_sub(self.last_monitor_ms) >= self.monitor.period_ms() {
            self.monitor_at(self.clock_ms);
        }
        self.ticks += 1;
        report
    }

    /// Run until `max_ticks` frames have been stepped.
    pub fn run(&mut self, max_ticks: u64, log_interval: u64) -> PerformanceMetrics {
        while self.ticks < max_ticks {
            self.step();

            if log_interval > 0 && self.ticks % log_interval == 0 {
                let m = self.metrics();
                info!(
                    "Tick {}: explored={} collisions={} beacons={} avg_reward={:.3} epsilon={:.3}",
                    self.ticks,
                    m.explored_areas,
                    m.collisions,
                    m.beacons_reached,
                    m.average_reward,
                    m.epsilon
                );
                self.metrics_history.push(m);
            }
        }

        self.metrics()
    }
}
