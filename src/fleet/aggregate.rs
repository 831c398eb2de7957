use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::fleet::types::{
    ClassShare, Completeness, FactorAggregate, FactorDetail, FleetStatistics, FleetSummary,
    GradeDistribution, PenaltyBreakdown, Reliability, VehicleReport,
};
use crate::fleet::utility::{mean, pct, percentile, stddev};
use crate::metrics::VehicleClass;
use crate::scoring::{Factor, ScoreResult, WEIGHT_TOTAL};

/// Sample count above which statistics are reported as highly reliable.
const HIGH_RELIABILITY_SAMPLES: usize = 100;
/// Charging sessions above which a vehicle counts as richly observed.
const PLENTY_CHARGING_COUNT: f64 = 100.0;

/// Sub-scores of `factor` for every result where it is present.
fn factor_series<'a>(
    results: impl IntoIterator<Item = &'a ScoreResult>,
    factor: Factor,
) -> Vec<f64> {
    results
        .into_iter()
        .filter_map(|r| r.scores.get(factor))
        .collect()
}

fn weighted_shortfall(score: f64, factor: Factor) -> f64 {
    (100.0 - score).max(0.0) * factor.weight()
}

/// Aggregates score results into [`FleetStatistics`].
///
/// When `class` is given only results of that class are considered. Returns
/// `None` when nothing is left to aggregate.
///
/// Each factor's percentile ranks the fleet mean against the per-vehicle
/// distribution, and penalties are taken from the averaged sub-scores rather
/// than averaged per vehicle.
pub fn aggregate(results: &[ScoreResult], class: Option<VehicleClass>) -> Option<FleetStatistics> {
    let selected: Vec<&ScoreResult> = results
        .iter()
        .filter(|r| class.is_none_or(|c| r.vehicle_class == c))
        .collect();

    if selected.is_empty() {
        debug!(class = ?class, "No score results to aggregate");
        return None;
    }

    let mut factors = BTreeMap::new();
    let mut factor_penalties = BTreeMap::new();
    let mut weighted_total = 0.0;

    for factor in Factor::ALL {
        let series = factor_series(selected.iter().copied(), factor);
        let avg = mean(&series);

        weighted_total += avg * factor.weight();
        factor_penalties.insert(factor, weighted_shortfall(avg, factor));

        factors.insert(
            factor,
            FactorAggregate {
                mean: avg,
                stddev: stddev(&series, avg),
                samples: series.len(),
                percentile: percentile(&series, avg),
            },
        );
    }

    let final_scores: Vec<f64> = selected.iter().map(|r| r.final_score).collect();
    let age_penalties: Vec<f64> = selected.iter().map(|r| r.age_penalty).collect();
    let age_penalty = mean(&age_penalties);
    let total_penalty = factor_penalties.values().sum::<f64>() + age_penalty;

    let mut grades = GradeDistribution::default();
    for result in &selected {
        grades.record(result.grade());
    }

    let reliability = if final_scores.len() > HIGH_RELIABILITY_SAMPLES {
        Reliability::High
    } else {
        Reliability::Normal
    };

    Some(FleetStatistics {
        vehicle_class: class,
        vehicle_count: selected.len(),
        final_score: mean(&final_scores),
        weighted_avg: weighted_total / WEIGHT_TOTAL,
        reliability,
        factors,
        penalties: PenaltyBreakdown {
            factors: factor_penalties,
            age: age_penalty,
            total: total_penalty,
        },
        grades,
    })
}

/// Buckets vehicles by how much telemetry backs their score.
///
/// No efficiency reading → `empty`; more than 100 whole charging sessions →
/// `plenty`; anything else → `normal`.
pub fn completeness(results: &[ScoreResult]) -> Completeness {
    let (mut plenty, mut normal, mut empty) = (0, 0, 0);

    for result in results {
        if result.efficiency.is_none() {
            empty += 1;
        } else if result
            .charging_count
            .is_some_and(|count| count.trunc() > PLENTY_CHARGING_COUNT)
        {
            plenty += 1;
        } else {
            normal += 1;
        }
    }

    let total = plenty + normal + empty;
    Completeness {
        plenty,
        normal,
        empty,
        total,
        plenty_pct: pct(plenty, total),
        normal_pct: pct(normal, total),
        empty_pct: pct(empty, total),
    }
}

/// Vehicle counts per raw model label, most common first.
pub fn class_breakdown(results: &[ScoreResult]) -> Vec<ClassShare> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for label in results
        .iter()
        .filter_map(|r| r.vehicle_class_raw.as_deref())
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        *counts.entry(label).or_default() += 1;
    }

    let total: usize = counts.values().sum();
    let mut shares: Vec<ClassShare> = counts
        .into_iter()
        .map(|(label, count)| ClassShare {
            label: label.to_string(),
            count,
            percentage: pct(count, total),
        })
        .collect();

    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    shares
}

pub fn summary(results: &[ScoreResult]) -> FleetSummary {
    let mut grades = GradeDistribution::default();
    for result in results {
        grades.record(result.grade());
    }

    FleetSummary {
        vehicle_count: results.len(),
        classes: class_breakdown(results),
        completeness: completeness(results),
        grades,
    }
}

/// Places one vehicle against the whole fleet. `None` if `vehicle_id` is unknown.
pub fn vehicle_report(results: &[ScoreResult], vehicle_id: &str) -> Option<VehicleReport> {
    let result = results.iter().find(|r| r.vehicle_id == vehicle_id)?;

    let mut factors = BTreeMap::new();
    for factor in Factor::ALL {
        let value = result.scores.value(factor);
        let distribution = factor_series(results, factor);

        factors.insert(
            factor,
            FactorDetail {
                score: result.scores.get(factor),
                percentile: percentile(&distribution, value),
                contribution: value * factor.weight(),
                penalty: weighted_shortfall(value, factor),
            },
        );
    }

    let total_penalty = factors.values().map(|d| d.penalty).sum::<f64>() + result.age_penalty;

    Some(VehicleReport {
        result: result.clone(),
        grade: result.grade(),
        factors,
        age_penalty: result.age_penalty,
        total_penalty,
    })
}
