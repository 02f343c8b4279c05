//! Store Server: keeps agent state in an append-only record file and serves
//! load/save requests over line-delimited JSON.
//!
//! Usage:
//!   store-server --listen 127.0.0.1:7878 --store beacon_state.jsonl

use anyhow::{Context, Result};
use beacon_store::record::RecordStore;
use beacon_store::{server, service, StateService};
use clap::Parser;
use env_logger::Env;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "store-server", about = "Serve persisted agent state")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BEACON_STORE_LISTEN", default_value = "127.0.0.1:7878")]
    listen: String,

    /// Record file path
    #[arg(long, short, default_value = "beacon_state.jsonl")]
    store: String,

    /// Keep rows in memory only (nothing survives a restart)
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let store = if args.memory {
        RecordStore::in_memory()
    } else {
        RecordStore::open(&args.store)
            .with_context(|| format!("Failed to open record file: {}", args.store))?
    };

    eprintln!("========================================");
    eprintln!("  BEACON STORE -- State Server");
    eprintln!("========================================");
    eprintln!("  Listen:     {}", args.listen);
    if args.memory {
        eprintln!("  Store:      (in memory)");
    } else {
        eprintln!("  Store:      {}", args.store);
    }
    eprintln!("  Rows:       {}", store.len());
    eprintln!();

    let listener = TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    let handle = service::spawn(StateService::new(store));

    tokio::select! {
        res = server::serve(listener, handle) => res.context("Server stopped")?,
        _ = tokio::signal::ctrl_c() => eprintln!("  Shutting down."),
    }
    Ok(())
}
