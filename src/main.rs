use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use intrusive_queue_mini::core::config::StressConfig;
use intrusive_queue_mini::core::report::{Outcome, append_records};
use intrusive_queue_mini::core::stress;
use intrusive_queue_mini::{DefaultGuard, SpinGuard};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GuardKind {
    Parking,
    Spin,
}

/// Run the concurrent put/get stress scenario against one queue.
#[derive(Debug, Parser)]
#[command(name = "qstress", version)]
struct Args {
    /// TOML config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    producers: Option<usize>,

    #[arg(long)]
    items_per_producer: Option<usize>,

    /// Append the run record to this NDJSON file.
    #[arg(long)]
    report: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = GuardKind::Parking)]
    guard: GuardKind,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => StressConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => StressConfig::default(),
    };
    if let Some(producers) = args.producers {
        config.producers = producers;
    }
    if let Some(items) = args.items_per_producer {
        config.items_per_producer = items;
    }
    if args.report.is_some() {
        config.report_path = args.report.clone();
    }
    config.validate()?;

    let record = match args.guard {
        GuardKind::Parking => stress::run::<DefaultGuard>(&config)?,
        GuardKind::Spin => stress::run::<SpinGuard>(&config)?,
    };
    println!("{record}");

    if let Some(path) = &config.report_path {
        append_records(std::slice::from_ref(&record), path)
            .with_context(|| format!("Failed to append report to {}", path.display()))?;
    }

    if record.outcome == Outcome::Failed {
        bail!("stress run {} failed", record.run_id);
    }
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
