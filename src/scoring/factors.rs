//! Per-factor scoring curves.
//!
//! Each present factor lands in `[MIN_SUB_SCORE, MAX_SUB_SCORE]`. Efficiency,
//! temperature and cell balance score 0 when their reading is absent; the
//! caller is responsible for excluding them from the weighted sum.

use crate::metrics::{ChargingPattern, DrivingHabit, VehicleClass};

pub const MIN_SUB_SCORE: f64 = 40.0;
pub const MAX_SUB_SCORE: f64 = 100.0;
/// Score used for driving habit and charging pattern when nothing is known.
pub const DEFAULT_SUB_SCORE: f64 = 80.0;

/// Per-year relaxation of the efficiency band, in km/kWh.
const EFFICIENCY_AGE_RELAXATION: f64 = 0.143;
const EFFICIENCY_MAX_RELAXATION: f64 = 0.8;
const EFFICIENCY_MIN_BAND_WIDTH: f64 = 0.1;

const TEMPERATURE_REFERENCE: f64 = 30.0;

const CELL_IMBALANCE_CENTER: f64 = 0.02;
const CELL_IMBALANCE_SCALE: f64 = 0.004;

const DAILY_DISTANCE_RANGE: (f64, f64) = (20.0, 100.0);
const CUMULATIVE_DISTANCE_TARGET: f64 = 7300.0;

pub(crate) fn clip(score: f64) -> f64 {
    score.clamp(MIN_SUB_SCORE, MAX_SUB_SCORE)
}

/// The class band widened downward for vehicle age.
///
/// Both bounds drop by `min(age × 0.143, 0.8)`; the upper bound stays
/// non-negative and at least 0.1 above the lower one.
pub fn efficiency_band(class: VehicleClass, age_years: f64) -> (f64, f64) {
    let (base_min, base_max) = class.efficiency_band();
    let adjustment = (age_years * EFFICIENCY_AGE_RELAXATION).min(EFFICIENCY_MAX_RELAXATION);

    let min = base_min - adjustment;
    let mut max = (base_max - adjustment).max(0.0);
    if max <= min {
        max = min + EFFICIENCY_MIN_BAND_WIDTH;
    }
    (min, max)
}

/// Linear 40..100 across the age-adjusted class band.
pub fn efficiency_score(efficiency: Option<f64>, class: VehicleClass, age_years: f64) -> f64 {
    let Some(efficiency) = efficiency else {
        return 0.0;
    };
    let (min, max) = efficiency_band(class, age_years);

    if efficiency <= min {
        MIN_SUB_SCORE
    } else if efficiency >= max {
        MAX_SUB_SCORE
    } else {
        let ratio = (efficiency - min) / (max - min);
        MIN_SUB_SCORE + ratio * (MAX_SUB_SCORE - MIN_SUB_SCORE)
    }
}

/// `100 − 2 × (temp − 30)`, clipped.
pub fn temperature_score(avg_temperature: Option<f64>) -> f64 {
    match avg_temperature {
        Some(temp) => clip(100.0 - 2.0 * (temp - TEMPERATURE_REFERENCE)),
        None => 0.0,
    }
}

/// Logistic curve centred on 20 mV of cell voltage spread.
pub fn cell_imbalance_score(cell_imbalance: Option<f64>) -> f64 {
    match cell_imbalance {
        Some(imbalance) => {
            let norm = (imbalance - CELL_IMBALANCE_CENTER) / CELL_IMBALANCE_SCALE;
            clip(100.0 / (1.0 + norm.exp()))
        }
        None => 0.0,
    }
}

/// Prefers acceleration/braking variability, then distance figures, then
/// the default.
pub fn driving_habit_score(habit: &DrivingHabit) -> f64 {
    if habit.accel_std.is_some() || habit.brake_std.is_some() {
        let accel = habit.accel_std.unwrap_or(0.0);
        let brake = habit.brake_std.unwrap_or(0.0);
        return clip(100.0 - 20.0 * (accel + brake));
    }

    if habit.daily_distance.is_none() && habit.cumulative_distance.is_none() {
        return DEFAULT_SUB_SCORE;
    }

    let mut score = DEFAULT_SUB_SCORE;
    let (low, high) = DAILY_DISTANCE_RANGE;

    if let Some(daily) = habit.daily_distance {
        if (low..=high).contains(&daily) {
            score += 10.0;
        } else if daily < low {
            score -= (low - daily) * 0.5;
        } else {
            score -= (daily - high) * 0.1;
        }
    }

    if let Some(cumulative) = habit.cumulative_distance {
        if cumulative >= CUMULATIVE_DISTANCE_TARGET {
            score += 10.0;
        } else {
            score -= (CUMULATIVE_DISTANCE_TARGET - cumulative) / 730.0;
        }
    }

    clip(score)
}

/// `100 − 50 × high_soc_ratio`, clipped; default when the ratio is unknown.
pub fn charging_pattern_score(pattern: &ChargingPattern) -> f64 {
    match pattern.high_soc_ratio {
        Some(ratio) => clip(100.0 - 50.0 * ratio),
        None => DEFAULT_SUB_SCORE,
    }
}
