//! Beacon Runner, headless.
//!
//! Runs the agent in the arena for a fixed number of frames and reports how
//! it did, or sweeps the farming/repetition settings in parallel.
//!
//! Usage:
//!   beacon-sim --ticks 50000 --seed 7
//!   beacon-sim --config beacon.toml --sweep --runs 3

use anyhow::{bail, Context, Result};
use beacon_core::config::SimConfig;
use beacon_core::simulation::Simulation;
use beacon_core::sweep::{sweep, SweepPlan};
use clap::Parser;
use env_logger::Env;

#[derive(Parser)]
#[command(name = "beacon-sim", about = "Headless beacon runner simulation")]
struct Args {
    /// TOML config file; built-in defaults when absent
    #[arg(long, short)]
    config: Option<String>,

    /// Frames to run
    #[arg(long, short, default_value = "100000")]
    ticks: u64,

    /// Log metrics every N frames (0 = final report only)
    #[arg(long, default_value = "5000")]
    log_interval: u64,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Override the beacon farming duration (ms)
    #[arg(long)]
    farming_ms: Option<u64>,

    /// Override the monitor repetition threshold
    #[arg(long)]
    repetition: Option<f64>,

    /// Sweep farming duration x repetition threshold instead of a single run
    #[arg(long)]
    sweep: bool,

    /// Independent runs per sweep candidate
    #[arg(long, default_value = "3")]
    runs: usize,

    /// Write sweep results as JSON to this path
    #[arg(long)]
    output: Option<String>,
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path))?,
        None => SimConfig::default(),
    };
    if let Some(ms) = args.farming_ms {
        config.world.farming_duration_ms = ms;
    }
    if let Some(threshold) = args.repetition {
        if !(0.0..=1.0).contains(&threshold) {
            bail!("--repetition must be within [0, 1], got {}", threshold);
        }
        config.monitor.repetition_threshold = threshold;
    }
    config.validate()?;
    Ok(config)
}

fn run_sweep(args: &Args, config: &SimConfig) -> Result<()> {
    let plan = SweepPlan {
        ticks: args.ticks,
        runs: args.runs,
        base_seed: args.seed.unwrap_or(0),
        ..SweepPlan::default()
    };
    let results = sweep(config, &plan)?;

    eprintln!();
    eprintln!("========================================");
    eprintln!("SWEEP RESULTS (worst of {} runs)", plan.runs);
    eprintln!("========================================");
    for r in &results {
        eprintln!(
            "  farming={:>5}ms repetition={:.2}  beacons={:>4} avg_reward={:.4}",
            r.candidate.farming_duration_ms,
            r.candidate.repetition_threshold,
            r.worst.beacons_reached,
            r.worst.average_reward
        );
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&results)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path))?;
        eprintln!("Results written to {}", path);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = load_config(&args)?;

    if args.sweep {
        return run_sweep(&args, &config);
    }

    eprintln!("========================================");
    eprintln!("  BEACON RUNNER");
    eprintln!("========================================");
    eprintln!("  Ticks:            {}", args.ticks);
    eprintln!("  Layers:           {:?}", config.network.layer_sizes);
    eprintln!("  Farming duration: {}ms", config.world.farming_duration_ms);
    eprintln!("  Repetition:       {:.2}", config.monitor.repetition_threshold);
    eprintln!();

    let mut sim = match args.seed {
        Some(seed) => Simulation::with_seed(&config, seed)?,
        None => Simulation::new(&config)?,
    };
    let metrics = sim.run(args.ticks, args.log_interval);

    eprintln!();
    eprintln!("========================================");
    eprintln!("FINAL RESULTS");
    eprintln!("========================================");
    eprintln!("  Simulated time:  {:.1}s", sim.clock_ms as f64 / 1000.0);
    eprintln!("  Explored cells:  {}", metrics.explored_areas);
    eprintln!("  Collisions:      {}", metrics.collisions);
    eprintln!("  Beacons reached: {}", metrics.beacons_reached);
    eprintln!("  Average reward:  {:.4}", metrics.average_reward);
    eprintln!("  Epsilon:         {:.3}", metrics.epsilon);
    Ok(())
}
