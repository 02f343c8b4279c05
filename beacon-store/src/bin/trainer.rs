//! Trainer: runs the agent in real time and keeps its state in a store.
//!
//! All timers share one thread. Frames, monitor checks, periodic saves and
//! metrics reports are callbacks on a single `select!` loop, so none of them
//! ever sees the agent half-updated. Saves are fire-and-forget; the startup
//! load is awaited alongside ticking and applied whenever it lands.
//!
//! Usage:
//!   trainer --server 127.0.0.1:7878
//!   trainer --offline --store beacon_state.jsonl --max-ticks 20000

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use beacon_core::config::SimConfig;
use beacon_core::simulation::Simulation;
use beacon_store::adapter::{self, PersistenceAdapter};
use beacon_store::record::RecordStore;
use beacon_store::{service, StateService, StoreClient};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use tokio::time::{interval, interval_at, MissedTickBehavior};

#[derive(Parser)]
#[command(name = "trainer", about = "Train a beacon runner against a state store")]
struct Args {
    /// State server address
    #[arg(long, env = "BEACON_STORE_ADDR", default_value = "127.0.0.1:7878")]
    server: String,

    /// Run an in-process store instead of connecting to a server
    #[arg(long)]
    offline: bool,

    /// Record file for --offline (in memory when absent)
    #[arg(long)]
    store: Option<String>,

    /// TOML config file; built-in defaults when absent
    #[arg(long, short)]
    config: Option<String>,

    /// Seed for the agent and beacon placement
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds between state saves
    #[arg(long, default_value = "300")]
    save_secs: u64,

    /// Seconds between metrics reports
    #[arg(long, default_value = "60")]
    metrics_secs: u64,

    /// Stop after this many frames (0 = run until Ctrl-C)
    #[arg(long, default_value = "0")]
    max_ticks: u64,
}

fn build_client(args: &Args) -> Result<StoreClient> {
    if !args.offline {
        if args.store.is_some() {
            bail!("--store only applies with --offline");
        }
        return Ok(StoreClient::tcp(args.server.clone()));
    }
    let store = match &args.store {
        Some(path) => RecordStore::open(path)
            .with_context(|| format!("Failed to open record file: {}", path))?,
        None => RecordStore::in_memory(),
    };
    Ok(StoreClient::Memory(service::spawn(StateService::new(store))))
}

fn log_metrics(sim: &Simulation) {
    let m = sim.metrics();
    info!(
        "Frame {}: explored={} collisions={} beacons={} avg_reward={:.3} epsilon={:.3}",
        sim.ticks, m.explored_areas, m.collisions, m.beacons_reached, m.average_reward, m.epsilon
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if args.save_secs == 0 || args.metrics_secs == 0 {
        bail!("--save-secs and --metrics-secs must be positive");
    }

    let config = match &args.config {
        Some(path) => SimConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path))?,
        None => SimConfig::default(),
    };
    let mut sim = match args.seed {
        Some(seed) => Simulation::with_seed(&config, seed)?,
        None => Simulation::new(&config)?,
    };
    let adapter = PersistenceAdapter::new(build_client(&args)?);

    eprintln!("========================================");
    eprintln!("  BEACON TRAINER");
    eprintln!("========================================");
    if args.offline {
        eprintln!("  Store:      offline ({})", args.store.as_deref().unwrap_or("in memory"));
    } else {
        eprintln!("  Store:      {}", args.server);
    }
    eprintln!("  Layers:     {:?}", config.network.layer_sizes);
    eprintln!("  Frame:      {}ms", sim.frame_ms());
    eprintln!("  Monitor:    every {}ms", sim.monitor().period_ms());
    eprintln!("  Save:       every {}s", args.save_secs);
    eprintln!();

    let started = Instant::now();
    let now_ms = || started.elapsed().as_millis() as u64;

    let mut frames = interval(Duration::from_millis(sim.frame_ms().max(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let monitor_period = Duration::from_millis(sim.monitor().period_ms().max(1));
    let mut monitor = interval_at(tokio::time::Instant::now() + monitor_period, monitor_period);
    let save_period = Duration::from_secs(args.save_secs);
    let mut saves = interval_at(tokio::time::Instant::now() + save_period, save_period);
    let metrics_period = Duration::from_secs(args.metrics_secs);
    let mut metrics = interval_at(tokio::time::Instant::now() + metrics_period, metrics_period);

    let load = adapter.load();
    tokio::pin!(load);
    let mut load_done = false;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = frames.tick() => {
                sim.tick_at(now_ms());
                sim.ticks += 1;
                if args.max_ticks > 0 && sim.ticks >= args.max_ticks {
                    eprintln!("  Reached {} frames.", sim.ticks);
                    break;
                }
            }
            _ = monitor.tick() => {
                sim.monitor_at(now_ms());
            }
            _ = saves.tick() => {
                adapter.save_detached(sim.agent());
            }
            _ = metrics.tick() => {
                log_metrics(&sim);
            }
            res = &mut load, if !load_done => {
                load_done = true;
                match res {
                    Ok(Some(restored)) => {
                        if adapter::apply(sim.agent_mut(), restored) {
                            info!("Loaded stored network after {} frames", sim.ticks);
                        }
                    }
                    Ok(None) => info!("Starting from fresh state"),
                    Err(e) => warn!("Load failed, starting from fresh state: {:#}", e),
                }
            }
            res = &mut shutdown => {
                if let Err(e) = res {
                    warn!("Ctrl-C handler failed: {}", e);
                }
                eprintln!("  Interrupted.");
                break;
            }
        }
    }

    let summary = adapter.save_all(sim.agent()).await;
    log_metrics(&sim);

    eprintln!();
    eprintln!("========================================");
    eprintln!("TRAINER STOPPED");
    eprintln!("========================================");
    eprintln!("  Frames:      {}", sim.ticks);
    eprintln!("  Wall time:   {:.1}s", started.elapsed().as_secs_f64());
    eprintln!("  Final save:  {} ok, {} failed", summary.ok, summary.failed);
    Ok(())
}
