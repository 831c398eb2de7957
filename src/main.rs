//! CLI entry point for the battery health rater.
//!
//! Provides subcommands for scoring every vehicle in the registry exports,
//! printing fleet statistics and summaries, and inspecting one vehicle.

use anyhow::{Context, Result, bail};
use battery_health_rater::{
    config::RaterConfig,
    metrics::VehicleClass,
    output::{print_json, print_pretty, write_scores},
    report::FleetReport,
    scoring::ScoreResult,
};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "battery_health_rater")]
#[command(about = "Scores EV battery health across a fleet", long_about = None)]
struct Cli {
    /// JSON config file (defaults come from the environment)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory containing registry export CSVs
    #[arg(long, global = true, value_name = "DIR")]
    dataset_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every vehicle and write the results to CSV
    Score {
        /// CSV file to write scores to
        #[arg(short, long, default_value = "vehicle_battery_scores.csv")]
        output: PathBuf,

        /// Only score this vehicle
        #[arg(short, long)]
        vehicle: Option<String>,
    },
    /// Print fleet statistics as JSON
    Stats {
        /// Restrict to one class (commercial, compact, midsize, large, premium)
        #[arg(short, long)]
        class: Option<VehicleClass>,
    },
    /// Print vehicle counts, class breakdown and data completeness
    Summary,
    /// Print one vehicle's score compared against the fleet
    Vehicle {
        #[arg(value_name = "ID")]
        id: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RaterConfig::load(path)?,
        None => RaterConfig::from_env()?,
    };
    if let Some(dir) = cli.dataset_dir {
        config = config.with_dataset_dir(dir);
    }

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = config
        .log_file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = config
        .log_file_path
        .file_name()
        .unwrap_or(OsStr::new("battery_health_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    info!(dataset_dir = %config.dataset_dir.display(), "Configuration loaded");
    print_pretty(&config);

    let report = FleetReport::new(config);

    match cli.command {
        Commands::Score { output, vehicle } => {
            let scores = report.scores();
            let selected: Vec<ScoreResult> = match vehicle {
                Some(id) => {
                    let found: Vec<_> = scores
                        .iter()
                        .filter(|r| r.vehicle_id == id)
                        .cloned()
                        .collect();
                    if found.is_empty() {
                        bail!("vehicle not found: {id}");
                    }
                    found
                }
                None => scores.to_vec(),
            };

            for result in &selected {
                info!(
                    vehicle_id = %result.vehicle_id,
                    class = %result.vehicle_class,
                    final_score = result.final_score,
                    grade = %result.grade(),
                    "Vehicle scored"
                );
            }

            write_scores(&output, &selected)
                .with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::Stats { class } => match &*report.statistics(class) {
            Some(stats) => print_json(stats)?,
            None => warn!(class = ?class, "no data"),
        },
        Commands::Summary => {
            print_json(&*report.summary())?;
        }
        Commands::Vehicle { id } => match report.vehicle(&id) {
            Some(detail) => print_json(&detail)?,
            None => bail!("vehicle not found: {id}"),
        },
    }

    Ok(())
}
