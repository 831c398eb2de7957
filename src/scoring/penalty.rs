/// Largest deduction age can cause.
pub const MAX_AGE_PENALTY: f64 = 7.5;

/// Piecewise-linear deduction for battery age, rounded to one decimal.
///
/// | Age (years) | Penalty                 |
/// |-------------|-------------------------|
/// | ≤ 1         | 1.5 × a                 |
/// | 1 – 3       | 1.5 + 1.2 × (a − 1)     |
/// | 3 – 5       | 3.9 + 0.8 × (a − 3)     |
/// | > 5         | 5.5 + 0.4 × (a − 5)     |
///
/// Capped at [`MAX_AGE_PENALTY`].
pub fn age_penalty(age_years: f64) -> f64 {
    let a = age_years.max(0.0);
    let penalty = match a {
        a if a <= 1.0 => 1.5 * a,
        a if a <= 3.0 => 1.5 + 1.2 * (a - 1.0),
        a if a <= 5.0 => 3.9 + 0.8 * (a - 3.0),
        a => 5.5 + 0.4 * (a - 5.0),
    };
    round_to(penalty.min(MAX_AGE_PENALTY), 1)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
