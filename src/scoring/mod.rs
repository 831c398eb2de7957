//! Battery health scoring.
//!
//! A [`MetricRecord`] is turned into five factor sub-scores, a weighted
//! composite and an age deduction. See [`score`] for the combination rules.

pub mod factors;
pub mod grade;
pub mod penalty;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::metrics::{MetricRecord, VehicleClass};
use factors::{
    cell_imbalance_score, charging_pattern_score, driving_habit_score, efficiency_score,
    temperature_score,
};
pub use grade::{Grade, grade};
pub use penalty::age_penalty;

/// Divisor for the weighted sum. Fixed at the sum of the design weights
/// regardless of which factors were present.
pub const WEIGHT_TOTAL: f64 = 0.90;
pub const MAX_FINAL_SCORE: f64 = 98.0;

/// The five weighted factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Efficiency,
    Temperature,
    CellImbalance,
    DrivingHabit,
    ChargingPattern,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::Efficiency,
        Factor::Temperature,
        Factor::CellImbalance,
        Factor::DrivingHabit,
        Factor::ChargingPattern,
    ];

    pub fn weight(self) -> f64 {
        match self {
            Factor::Efficiency => 0.30,
            Factor::Temperature => 0.15,
            Factor::CellImbalance => 0.15,
            Factor::DrivingHabit => 0.15,
            Factor::ChargingPattern => 0.15,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Factor::Efficiency => "efficiency",
            Factor::Temperature => "temperature",
            Factor::CellImbalance => "cell_imbalance",
            Factor::DrivingHabit => "driving_habit",
            Factor::ChargingPattern => "charging_pattern",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-scores for one vehicle. `None` means the underlying metric was absent
/// and the factor is left out of the weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FactorScores {
    pub efficiency: Option<f64>,
    pub temperature: Option<f64>,
    pub cell_imbalance: Option<f64>,
    pub driving_habit: f64,
    pub charging_pattern: f64,
}

impl FactorScores {
    /// Sub-score for `factor`, if it counts towards the composite.
    pub fn get(&self, factor: Factor) -> Option<f64> {
        match factor {
            Factor::Efficiency => self.efficiency,
            Factor::Temperature => self.temperature,
            Factor::CellImbalance => self.cell_imbalance,
            Factor::DrivingHabit => Some(self.driving_habit),
            Factor::ChargingPattern => Some(self.charging_pattern),
        }
    }

    /// Sub-score for `factor`, 0 when absent.
    pub fn value(&self, factor: Factor) -> f64 {
        self.get(factor).unwrap_or(0.0)
    }

    pub fn weighted_sum(&self) -> f64 {
        Factor::ALL
            .iter()
            .filter_map(|f| self.get(*f).map(|s| s * f.weight()))
            .sum()
    }

    pub fn weighted_avg(&self) -> f64 {
        self.weighted_sum() / WEIGHT_TOTAL
    }
}

/// Immutable outcome of scoring one [`MetricRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub vehicle_id: String,
    pub vehicle_class_raw: Option<String>,
    pub vehicle_class: VehicleClass,
    pub model_year: Option<i32>,
    pub model_month: Option<u32>,
    pub age_years: f64,

    pub efficiency: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub cell_imbalance: Option<f64>,
    pub charging_count: Option<f64>,
    pub avg_charging_amount: Option<f64>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,

    pub scores: FactorScores,
    pub age_penalty: f64,
    pub weighted_avg: f64,
    pub final_score: f64,
}

impl ScoreResult {
    pub fn grade(&self) -> Grade {
        grade(self.final_score)
    }

    /// `YYYY.MM` model date, when fully known.
    pub fn age_label(&self) -> Option<String> {
        match (self.model_year, self.model_month) {
            (Some(y), Some(m)) => Some(format!("{y}.{m:02}")),
            _ => None,
        }
    }

    /// `YYYY.MM.DD ~ YYYY.MM.DD` observation window, when both ends are known.
    pub fn collection_period(&self) -> Option<String> {
        let first = self.first_seen?;
        let last = self.last_seen?;
        Some(format!(
            "{} ~ {}",
            first.format("%Y.%m.%d"),
            last.format("%Y.%m.%d")
        ))
    }

    /// Whole days from the last observation to `at`.
    pub fn days_since_last_seen(&self, at: DateTime<Utc>) -> Option<i64> {
        self.last_seen.map(|last| (at - last).num_days())
    }
}

/// Scores one vehicle as of `evaluated_at`.
///
/// Never fails: absent efficiency, temperature or cell readings drop those
/// factors from the weighted sum, while driving habit and charging pattern
/// always count (at their defaults when unknown). The sum is divided by
/// [`WEIGHT_TOTAL`], the age penalty subtracted, and the result clamped to
/// `[0, 98]`.
pub fn score(record: &MetricRecord, evaluated_at: DateTime<Utc>) -> ScoreResult {
    let age_years = record.age_years(evaluated_at);
    let class = record.vehicle_class;

    let scores = FactorScores {
        efficiency: record
            .efficiency
            .map(|_| efficiency_score(record.efficiency, class, age_years)),
        temperature: record
            .avg_temperature
            .map(|_| temperature_score(record.avg_temperature)),
        cell_imbalance: record
            .cell_imbalance
            .map(|_| cell_imbalance_score(record.cell_imbalance)),
        driving_habit: driving_habit_score(&record.driving_habit),
        charging_pattern: charging_pattern_score(&record.charging_pattern),
    };

    let weighted_avg = scores.weighted_avg();
    let age_penalty = age_penalty(age_years);
    let final_score = (weighted_avg - age_penalty).clamp(0.0, MAX_FINAL_SCORE);

    ScoreResult {
        vehicle_id: record.vehicle_id.clone(),
        vehicle_class_raw: record.vehicle_class_raw.clone(),
        vehicle_class: class,
        model_year: record.model_year,
        model_month: record.model_month,
        age_years,
        efficiency: record.efficiency,
        avg_temperature: record.avg_temperature,
        cell_imbalance: record.cell_imbalance,
        charging_count: record.charging_pattern.charging_count,
        avg_charging_amount: record.charging_pattern.avg_charging_amount,
        first_seen: record.first_seen,
        last_seen: record.last_seen,
        scores,
        age_penalty,
        weighted_avg,
        final_score,
    }
}
