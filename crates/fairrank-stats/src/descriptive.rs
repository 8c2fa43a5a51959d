use serde::{Deserialize, Serialize};

use crate::percentiles::compute_percentile;

/// Location and spread of a set of scores.
///
/// Variance and standard deviation use the sample (`n - 1`) divisor. They are
/// undefined for a single observation and reported as `0.0` in that case, so
/// callers that need a defined spread must check [`count`](Self::count).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Mean of the two central values for even counts.
    pub median: f64,
    pub variance: f64,
    pub std_dev: f64,
    /// First quartile (25th percentile, interpolated).
    pub q1: f64,
    /// Third quartile (75th percentile, interpolated).
    pub q3: f64,
}

impl DescriptiveStats {
    /// Summarizes values in any order; `None` when there are none.
    ///
    /// # Examples
    ///
    /// ```
    /// # use fairrank_stats::descriptive::DescriptiveStats;
    /// let scores = DescriptiveStats::new([9.0, 6.0, 8.0, 5.0, 7.0]).unwrap();
    /// assert_eq!((scores.min, scores.max), (5.0, 9.0));
    /// assert_eq!(scores.mean, 7.0);
    /// assert_eq!(scores.median, 7.0);
    /// assert_eq!(scores.variance, 2.5);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted: Vec<f64> = values.into_iter().collect();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted)
    }

    /// Summarizes values already sorted ascending.
    ///
    /// # Panics
    ///
    /// Debug builds panic on unsorted input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use fairrank_stats::descriptive::DescriptiveStats;
    /// let values = [6.0, 7.0, 7.0, 8.0];
    /// let stats = DescriptiveStats::from_sorted(&values).unwrap();
    /// assert_eq!(stats.count, 4);
    /// assert_eq!(stats.median, 7.0);
    /// ```
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        debug_assert!(sorted_values.is_sorted(), "input must be sorted ascending");

        let (&first, &last) = (sorted_values.first()?, sorted_values.last()?);
        let mean = mean(sorted_values)?;
        let variance = sample_variance_around(sorted_values, mean).unwrap_or(0.0);

        Some(Self {
            count: sorted_values.len(),
            min: first,
            max: last,
            mean,
            median: compute_percentile(sorted_values, 50.0),
            variance,
            std_dev: variance.sqrt(),
            q1: compute_percentile(sorted_values, 25.0),
            q3: compute_percentile(sorted_values, 75.0),
        })
    }
}

/// Arithmetic mean, or `None` for an empty slice.
///
/// ```
/// # use fairrank_stats::descriptive::mean;
/// assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
/// assert_eq!(mean(&[]), None);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (`n - 1` divisor), or `None` when fewer than two values are given.
///
/// ```
/// # use fairrank_stats::descriptive::sample_variance;
/// assert_eq!(sample_variance(&[6.0, 7.0, 7.0, 8.0]), Some(2.0 / 3.0));
/// assert_eq!(sample_variance(&[1.0]), None);
/// ```
#[must_use]
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    sample_variance_around(values, mean(values)?)
}

#[expect(clippy::cast_precision_loss)]
fn sample_variance_around(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sum_sq = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    Some(sum_sq / (values.len() - 1) as f64)
}
