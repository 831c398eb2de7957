//! Output formatting and persistence for score results.
//!
//! Supports pretty-printing, JSON serialization, and CSV export.

use anyhow::Result;
use chrono::SecondsFormat;
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info};

use crate::scoring::penalty::round_to;
use crate::scoring::{Factor, ScoreResult};
use csv::WriterBuilder;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One row of the score export. Absent values serialize as empty cells.
#[derive(Debug, Serialize)]
pub struct ScoreRow {
    pub car_id: String,
    pub car_type: Option<String>,
    pub vehicle_type: String,
    pub age_years: f64,
    pub model_year: Option<i32>,
    pub model_month: Option<u32>,
    pub age_string: Option<String>,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub collection_period: Option<String>,
    pub efficiency: Option<f64>,
    pub efficiency_score: f64,
    pub avg_temperature: Option<f64>,
    pub temperature_score: f64,
    pub cell_imbalance: Option<f64>,
    pub cell_imbalance_score: f64,
    pub driving_habit_score: f64,
    pub charging_count: Option<f64>,
    pub avg_charging_amount: Option<f64>,
    pub charging_pattern_score: f64,
    pub weighted_avg: f64,
    pub age_penalty: f64,
    pub final_score: f64,
    pub grade: String,
}

impl From<&ScoreResult> for ScoreRow {
    fn from(r: &ScoreResult) -> Self {
        let r2 = |v: f64| round_to(v, 2);
        let score = |f: Factor| r2(r.scores.value(f));

        Self {
            car_id: r.vehicle_id.clone(),
            car_type: r.vehicle_class_raw.clone(),
            vehicle_type: r.vehicle_class.to_string(),
            age_years: r2(r.age_years),
            model_year: r.model_year,
            model_month: r.model_month,
            age_string: r.age_label(),
            first_date: r.first_seen.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            last_date: r.last_seen.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            collection_period: r.collection_period(),
            efficiency: r.efficiency.map(r2),
            efficiency_score: score(Factor::Efficiency),
            avg_temperature: r.avg_temperature.map(r2),
            temperature_score: score(Factor::Temperature),
            cell_imbalance: r.cell_imbalance.map(|v| round_to(v, 4)),
            cell_imbalance_score: score(Factor::CellImbalance),
            driving_habit_score: score(Factor::DrivingHabit),
            charging_count: r.charging_count.map(|v| round_to(v, 0)),
            avg_charging_amount: r.avg_charging_amount.map(|v| round_to(v, 1)),
            charging_pattern_score: score(Factor::ChargingPattern),
            weighted_avg: r2(r.weighted_avg),
            age_penalty: r.age_penalty,
            final_score: r2(r.final_score),
            grade: r.grade().to_string(),
        }
    }
}

/// Writes one row per result to a CSV file at `path`, replacing any
/// previous contents.
pub fn write_scores(path: &Path, results: &[ScoreResult]) -> Result<()> {
    debug!(path = %path.display(), rows = results.len(), "Writing score CSV");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for result in results {
        writer.serialize(ScoreRow::from(result))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = results.len(), "Score CSV written");
    Ok(())
}
