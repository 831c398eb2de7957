//! Value objects produced by fleet aggregation.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::metrics::VehicleClass;
use crate::scoring::{Factor, Grade, ScoreResult};

/// Confidence qualifier derived from sample size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reliability {
    High,
    Normal,
}

/// Distribution of one factor's sub-scores across the fleet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorAggregate {
    pub mean: f64,
    pub stddev: f64,
    pub samples: usize,
    /// Rank of `mean` within the per-vehicle distribution.
    pub percentile: f64,
}

/// Points lost per factor, measured against 100 and weighted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PenaltyBreakdown {
    pub factors: BTreeMap<Factor, f64>,
    pub age: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GradeDistribution {
    pub excellent: usize,
    pub good: usize,
    pub normal: usize,
    pub bad: usize,
}

impl GradeDistribution {
    pub fn record(&mut self, grade: Grade) {
        match grade {
            Grade::A => self.excellent += 1,
            Grade::B => self.good += 1,
            Grade::C => self.normal += 1,
            Grade::D => self.bad += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.excellent + self.good + self.normal + self.bad
    }
}

/// Fleet-wide summary of a set of score results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetStatistics {
    pub vehicle_class: Option<VehicleClass>,
    pub vehicle_count: usize,
    pub final_score: f64,
    pub weighted_avg: f64,
    pub reliability: Reliability,
    pub factors: BTreeMap<Factor, FactorAggregate>,
    pub penalties: PenaltyBreakdown,
    pub grades: GradeDistribution,
}

/// How much telemetry backs the fleet's scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completeness {
    pub plenty: usize,
    pub normal: usize,
    pub empty: usize,
    pub total: usize,
    pub plenty_pct: f64,
    pub normal_pct: f64,
    pub empty_pct: f64,
}

/// Vehicle count for one raw model label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassShare {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSummary {
    pub vehicle_count: usize,
    pub classes: Vec<ClassShare>,
    pub completeness: Completeness,
    pub grades: GradeDistribution,
}

/// One factor of a single vehicle, placed against the fleet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorDetail {
    pub score: Option<f64>,
    pub percentile: f64,
    pub contribution: f64,
    pub penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleReport {
    pub result: ScoreResult,
    pub grade: Grade,
    pub factors: BTreeMap<Factor, FactorDetail>,
    pub age_penalty: f64,
    pub total_penalty: f64,
}
