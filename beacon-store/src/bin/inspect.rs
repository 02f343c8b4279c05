//! Inspect: validate a record file and show the state it currently holds.
//!
//! Usage: inspect --input beacon_state.jsonl [--all] [--limit 20]

use anyhow::{Context, Result};
use beacon_store::record::{read_all, RecordStore, StateRecord};
use clap::Parser;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "inspect", about = "Inspect a beacon state record file")]
struct Args {
    /// Record file path
    #[arg(long, short, default_value = "beacon_state.jsonl")]
    input: String,

    /// List every row instead of the latest per (layer, type)
    #[arg(long)]
    all: bool,

    /// Max rows to display (0 = all)
    #[arg(long, default_value = "20")]
    limit: usize,
}

/// One-line description of a row's payload.
fn summarize(row: &StateRecord) -> String {
    match row.decode_data() {
        Ok(Value::Array(items)) => {
            let nums: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
            if nums.is_empty() {
                format!("array[{}]", items.len())
            } else {
                let min = nums.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = nums.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                format!("array[{}] min {:.4} max {:.4}", items.len(), min, max)
            }
        }
        Ok(other) => other.to_string(),
        Err(e) => format!("<undecodable: {}>", e),
    }
}

fn print_row(row: &StateRecord) {
    println!(
        "#{:6} | ts {:>13} | layer {:>8} | {:<20} | {}",
        row.id,
        row.timestamp,
        row.layer.to_string(),
        row.kind,
        summarize(row)
    );
}

fn main() -> Result<()> {
    let args = Args::parse();

    let rows = read_all(&args.input).with_context(|| format!("Failed to read: {}", args.input))?;
    let total = rows.len();

    eprintln!("File: {}", args.input);
    eprintln!("Rows: {}", total);
    eprintln!();

    let store = RecordStore::from_rows(rows);
    let shown: Vec<&StateRecord> = if args.all {
        store.rows().iter().collect()
    } else {
        store.latest()
    };

    for (i, row) in shown.iter().enumerate() {
        if args.limit != 0 && i >= args.limit {
            eprintln!("... {} more", shown.len() - i);
            break;
        }
        print_row(row);
    }

    let limit = if args.limit == 0 { shown.len() } else { args.limit };
    eprintln!("\nShown {} of {} rows", shown.len().min(limit), total);
    Ok(())
}
