//! Export persisted usage counts to JSON or CSV format
//!
//! Usage:
//!   cargo run -p export_usage -- --db ~/.webime/usage.redb --format json
//!   cargo run -p export_usage -- --db ~/.webime/usage.redb --format csv --output usage.csv

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use webime_core::{UsageRecord, UsageStore};

#[derive(Parser, Debug)]
#[command(name = "export_usage")]
#[command(about = "Export usage counts to JSON or CSV format")]
struct Args {
    /// Path to the usage database
    #[arg(short, long)]
    db: PathBuf,

    /// Output format: json or csv
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sort by count (descending)
    #[arg(long)]
    sort_by_count: bool,
}

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init();
    let args = Args::parse();

    let store = UsageStore::open_redb(&args.db)
        .with_context(|| format!("failed to open usage db {}", args.db.display()))?;
    let mut records = store.records().context("failed to read usage records")?;

    if args.sort_by_count {
        // stable: ties stay in (segment, surface) order
        records.sort_by(|a, b| b.count.cmp(&a.count));
    }

    let output = match args.format.as_str() {
        "json" => export_json(&records)?,
        "csv" => export_csv(&records),
        _ => anyhow::bail!("Unsupported format: {}. Use 'json' or 'csv'", args.format),
    };

    if let Some(path) = args.output {
        std::fs::write(&path, output)
            .with_context(|| format!("failed to write {}", path.display()))?;
    } else {
        print!("{}", output);
    }

    Ok(())
}

fn export_json(records: &[UsageRecord]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

fn csv_field(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn export_csv(records: &[UsageRecord]) -> String {
    let mut output = String::from("segment,surface,count\n");
    for r in records {
        output.push_str(&format!("{},{},{}\n", csv_field(&r.segment), csv_field(&r.surface), r.count));
    }
    output
}
