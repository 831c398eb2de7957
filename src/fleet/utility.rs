/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Share of `distribution` strictly below `value`, as a whole percentage.
/// Returns 0.0 for an empty distribution.
pub fn percentile(distribution: &[f64], value: f64) -> f64 {
    if distribution.is_empty() {
        return 0.0;
    }
    let below = distribution.iter().filter(|x| **x < value).count();
    (100.0 * below as f64 / distribution.len() as f64).round()
}

/// `part / total` as a percentage rounded to one decimal, 0.0 when `total` is 0.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        ((part as f64 / total as f64) * 1000.0).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_and_values() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[10.0, 20.0, 30.0]), 20.0);
    }

    #[test]
    fn test_stddev() {
        assert_eq!(stddev(&[], 0.0), 0.0);
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(stddev(&values, mean(&values)), 2.0);
    }

    #[test]
    fn test_percentile_counts_strictly_below() {
        let distribution = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile(&distribution, 30.0), 40.0);
        assert_eq!(percentile(&distribution, 10.0), 0.0);
        assert_eq!(percentile(&distribution, 51.0), 100.0);
    }

    #[test]
    fn test_percentile_rounds_to_whole_number() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0], 2.5), 67.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_pct() {
        assert_eq!(pct(10, 0), 0.0);
        assert_eq!(pct(1, 3), 33.3);
        assert_eq!(pct(2, 3), 66.7);
        assert_eq!(pct(50, 100), 50.0);
    }
}
