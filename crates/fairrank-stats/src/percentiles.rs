/// Computes a single percentile value from sorted data.
///
/// This function uses linear interpolation between the two closest ranks: the
/// k-th percentile of n values lies at fractional position `(n - 1) * k / 100`.
/// The 50th percentile is therefore the conventional median.
///
/// # Arguments
///
/// * `sorted_values` - Values sorted in ascending order
/// * `percentile` - The percentile to compute (0.0 to 100.0, clamped)
///
/// # Returns
///
/// The value at the specified percentile. Returns `f64::NAN` if the input is empty.
///
/// # Examples
///
/// ```
/// use fairrank_stats::percentiles::compute_percentile;
///
/// let values = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(compute_percentile(&values, 50.0), 2.5);
/// assert_eq!(compute_percentile(&values, 0.0), 1.0);
/// assert_eq!(compute_percentile(&values, 100.0), 4.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    let Some(&last) = sorted_values.last() else {
        return f64::NAN;
    };
    let rank = (sorted_values.len() - 1) as f64 * percentile.clamp(0.0, 100.0) / 100.0;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if upper >= sorted_values.len() {
        return last;
    }
    let frac = rank - lower as f64;
    sorted_values[lower] + frac * (sorted_values[upper] - sorted_values[lower])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_nan() {
        assert!(compute_percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn test_single_value() {
        assert_eq!(compute_percentile(&[7.0], 25.0), 7.0);
        assert_eq!(compute_percentile(&[7.0], 75.0), 7.0);
    }

    #[test]
    fn test_interpolates_between_ranks() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(compute_percentile(&values, 50.0), 30.0);
        assert!((compute_percentile(&values, 10.0) - 14.0).abs() < 1e-12);
        assert!((compute_percentile(&values, 90.0) - 46.0).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_percentile_is_clamped() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(compute_percentile(&values, -5.0), 1.0);
        assert_eq!(compute_percentile(&values, 150.0), 3.0);
    }
}
