//! Z-score outlier filtering
//!
//! Outliers are removed from each score sample before any group comparison,
//! so that a handful of anomalous ratings cannot drive a bias verdict.
//!
//! # Algorithm
//!
//! For a sample with mean μ and sample standard deviation σ (`n - 1` divisor),
//! value `x[i]` is an outlier iff
//!
//! ```text
//! |x[i] - μ| / σ > threshold
//! ```
//!
//! The threshold is expressed in standard deviations and defaults to
//! [`DEFAULT_THRESHOLD`]. When σ is zero (constant samples, or a single value
//! whose σ is undefined and reported as `0.0`) nothing is flagged. Samples of
//! one or two values never have outliers; their z-scores are still reported.
//!
//! # Examples
//!
//! ```
//! use fairrank_analysis::outlier;
//!
//! let sample = [5.0, 5.1, 4.9, 5.0, 5.2, 4.8, 5.0, 5.1, 4.9, 50.0];
//! let report = outlier::detect(&sample, 2.0)?;
//! assert_eq!(report.outlier_indices, [9]);
//!
//! let (filtered, removed) = outlier::remove(&sample, &report)?;
//! assert_eq!(filtered.len(), 9);
//! assert_eq!(removed, [9]);
//! # Ok::<(), fairrank_analysis::error::AnalysisError>(())
//! ```

use fairrank_stats::descriptive::{mean, sample_variance};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{AnalysisError, validate_values},
    model::PersonId,
    sample::ScoreSample,
};

/// Default outlier threshold in standard deviations.
pub const DEFAULT_THRESHOLD: f64 = 3.0;

/// Largest sample size for which nothing is ever flagged.
pub const MAX_DEGENERATE_LEN: usize = 2;

/// Result of a single outlier detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    /// Number of values in the analyzed sample.
    pub sample_len: usize,
    pub mean: f64,
    /// Sample standard deviation; `0.0` when the sample has a single value.
    pub std_dev: f64,
    pub threshold: f64,
    /// Standardized distance of every value, in sample order (all `0.0` when `std_dev` is zero).
    pub z_scores: Vec<f64>,
    /// Indices of flagged values, ascending.
    pub outlier_indices: Vec<usize>,
}

impl OutlierReport {
    #[must_use]
    pub fn is_outlier(&self, index: usize) -> bool {
        self.outlier_indices.binary_search(&index).is_ok()
    }

    #[must_use]
    pub fn num_outliers(&self) -> usize {
        self.outlier_indices.len()
    }
}

/// Checks that `threshold` is usable as an outlier cut-off.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidThreshold`] unless `threshold` is positive and finite.
pub fn validate_threshold(threshold: f64) -> Result<(), AnalysisError> {
    if threshold.is_finite() && threshold > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidThreshold { value: threshold })
    }
}

/// Flags the values lying more than `threshold` standard deviations from the mean.
///
/// # Errors
///
/// Returns an error if `sample` is empty or not finite, or if `threshold` is
/// not positive and finite.
pub fn detect(sample: &[f64], threshold: f64) -> Result<OutlierReport, AnalysisError> {
    validate_values(sample)?;
    validate_threshold(threshold)?;

    let mean = mean(sample).ok_or(AnalysisError::EmptySample)?;
    let std_dev = sample_variance(sample).map_or(0.0, f64::sqrt);

    let z_scores = if std_dev > 0.0 {
        sample.iter().map(|v| (v - mean) / std_dev).collect()
    } else {
        vec![0.0; sample.len()]
    };
    // too few values to tell an outlier from the rest
    let outlier_indices = if sample.len() <= MAX_DEGENERATE_LEN {
        vec![]
    } else {
        z_scores
            .iter()
            .enumerate()
            .filter(|(_, z)| z.abs() > threshold)
            .map(|(i, _)| i)
            .collect::<Vec<_>>()
    };

    debug!(
        len = sample.len(),
        mean,
        std_dev,
        threshold,
        outliers = outlier_indices.len(),
        "outlier detection"
    );

    Ok(OutlierReport {
        sample_len: sample.len(),
        mean,
        std_dev,
        threshold,
        z_scores,
        outlier_indices,
    })
}

/// Drops the values flagged in `report`, keeping survivors in their original order.
///
/// Returns the filtered values and the removed indices (ascending).
///
/// # Errors
///
/// Returns an error if `sample` is empty or not finite, or if `report` was
/// produced for a sample of a different length.
pub fn remove(
    sample: &[f64],
    report: &OutlierReport,
) -> Result<(Vec<f64>, Vec<usize>), AnalysisError> {
    validate_values(sample)?;
    if report.sample_len != sample.len() {
        return Err(AnalysisError::ReportMismatch {
            expected: report.sample_len,
            actual: sample.len(),
        });
    }
    let filtered = sample
        .iter()
        .enumerate()
        .filter(|(i, _)| !report.is_outlier(*i))
        .map(|(_, v)| *v)
        .collect();
    Ok((filtered, report.outlier_indices.clone()))
}

/// A score sample with its outliers removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredSample {
    pub sample: ScoreSample,
    pub removed_ids: Vec<PersonId>,
    pub report: OutlierReport,
}

/// Detects and removes outliers from an identifier-aware sample.
///
/// # Errors
///
/// Returns an error if `sample` is empty or `threshold` is invalid.
///
/// # Examples
///
/// ```
/// use fairrank_analysis::{model::PersonId, outlier, sample::ScoreSample};
///
/// let ids = (0..8).map(|i| PersonId::new(format!("P{i}"))).collect();
/// let sample = ScoreSample::new(ids, vec![7.0, 7.2, 6.8, 7.1, 6.9, 7.0, 7.1, 0.5])?;
/// let filtered = outlier::filter(&sample, 2.0)?;
/// assert_eq!(filtered.removed_ids, [PersonId::new("P7")]);
/// assert_eq!(filtered.sample.len(), 7);
/// # Ok::<(), fairrank_analysis::error::AnalysisError>(())
/// ```
pub fn filter(sample: &ScoreSample, threshold: f64) -> Result<FilteredSample, AnalysisError> {
    let report = detect(sample.values(), threshold)?;
    let removed_ids = report
        .outlier_indices
        .iter()
        .map(|&i| sample.ids()[i].clone())
        .collect();
    Ok(FilteredSample {
        sample: sample.without_indices(&report.outlier_indices),
        removed_ids,
        report,
    })
}

/// Outliers found across the columns of a rectangular table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultivariateOutliers {
    /// One report per column.
    pub per_dimension: Vec<OutlierReport>,
    pub min_dimensions: usize,
    /// Rows flagged in at least `min_dimensions` columns, ascending.
    pub global_outliers: Vec<usize>,
}

/// Runs [`detect`] on every column of `rows` and flags the rows that are
/// outliers in at least `min_dimensions` columns.
///
/// # Errors
///
/// Returns an error if `rows` is empty, ragged, has no columns or holds
/// non-finite values, if `threshold` is invalid, or if `min_dimensions` is zero.
///
/// # Examples
///
/// ```
/// use fairrank_analysis::outlier;
///
/// let mut rows = vec![vec![5.0, 5.0]; 9];
/// rows[0] = vec![5.1, 4.9];
/// rows[1] = vec![4.9, 5.1];
/// rows.push(vec![40.0, 40.0]);
/// let result = outlier::detect_multivariate(&rows, 2.0, 2)?;
/// assert_eq!(result.global_outliers, [9]);
/// # Ok::<(), fairrank_analysis::error::AnalysisError>(())
/// ```
pub fn detect_multivariate(
    rows: &[Vec<f64>],
    threshold: f64,
    min_dimensions: usize,
) -> Result<MultivariateOutliers, AnalysisError> {
    if min_dimensions == 0 {
        return Err(AnalysisError::InvalidMinDimensions);
    }
    validate_threshold(threshold)?;
    let Some(first) = rows.first() else {
        return Err(AnalysisError::EmptySample);
    };
    let width = first.len();
    if width == 0 {
        return Err(AnalysisError::EmptySample);
    }
    if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(AnalysisError::RaggedRows {
            row,
            expected: width,
            actual: r.len(),
        });
    }

    let per_dimension = (0..width)
        .map(|col| {
            let column = rows.iter().map(|r| r[col]).collect::<Vec<_>>();
            detect(&column, threshold)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let global_outliers = (0..rows.len())
        .filter(|&row| {
            per_dimension.iter().filter(|r| r.is_outlier(row)).count() >= min_dimensions
        })
        .collect();

    Ok(MultivariateOutliers {
        per_dimension,
        min_dimensions,
        global_outliers,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_distr::{Distribution as _, Normal};
    use rand_pcg::Pcg64;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_constant_sample_has_no_outliers() {
        for threshold in [0.001, 0.5, 3.0, 100.0] {
            let report = detect(&[4.0; 12], threshold).unwrap();
            assert_eq!(report.std_dev, 0.0);
            assert!(report.outlier_indices.is_empty());
            assert!(report.z_scores.iter().all(|&z| z == 0.0));
        }
    }

    #[test]
    fn test_single_value() {
        let report = detect(&[7.5], 3.0).unwrap();
        assert_eq!(report.mean, 7.5);
        assert_eq!(report.std_dev, 0.0);
        assert!(report.outlier_indices.is_empty());
    }

    #[test]
    fn test_uses_sample_std_dev() {
        let report = detect(&[1.0, 2.0, 3.0, 4.0], 3.0).unwrap();
        assert!((report.std_dev - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_strict() {
        // |z| equals the threshold exactly
        let sample = [-1.0, 1.0];
        let report = detect(&sample, 1.0 / 2.0_f64.sqrt()).unwrap();
        assert!((report.z_scores[1] - 1.0 / 2.0_f64.sqrt()).abs() < 1e-15);
        assert!(report.outlier_indices.is_empty());
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut rng = Pcg64::seed_from_u64(11);
        let normal = Normal::new(6.0, 1.0).unwrap();
        let mut sample = (0..200).map(|_| normal.sample(&mut rng)).collect::<Vec<_>>();
        sample[17] = 30.0;
        sample[150] = -20.0;

        let report = detect(&sample, DEFAULT_THRESHOLD).unwrap();
        let (filtered, removed) = remove(&sample, &report).unwrap();

        assert!(removed.contains(&17));
        assert!(removed.contains(&150));
        assert!(removed.is_sorted());
        assert_eq!(filtered.len(), sample.len() - report.num_outliers());
        let expected = sample
            .iter()
            .enumerate()
            .filter(|(i, _)| !removed.contains(i))
            .map(|(_, v)| *v)
            .collect::<Vec<_>>();
        assert_eq!(filtered, expected);
    }

    #[test]
    fn test_remove_rejects_foreign_report() {
        let report = detect(&[1.0, 2.0, 3.0], 3.0).unwrap();
        let err = remove(&[1.0, 2.0], &report).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::ReportMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(detect(&[], 3.0).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(
            detect(&[1.0, f64::NAN], 3.0).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        for threshold in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            assert_eq!(
                detect(&[1.0, 2.0], threshold).unwrap_err().kind(),
                ErrorKind::InvalidParameter
            );
        }
    }

    #[test]
    fn test_two_values_are_never_outliers() {
        let report = detect(&[0.0, 10.0], 0.5).unwrap();
        assert_eq!(report.num_outliers(), 0);
        assert!((report.std_dev - 50.0_f64.sqrt()).abs() < 1e-12);
        assert!((report.z_scores[0] + 0.5_f64.sqrt()).abs() < 1e-12);

        let ids = vec![PersonId::new("a"), PersonId::new("b")];
        let sample = ScoreSample::new(ids, vec![0.0, 10.0]).unwrap();
        let filtered = filter(&sample, 0.1).unwrap();
        assert_eq!(filtered.sample.len(), 2);
        assert!(filtered.removed_ids.is_empty());
    }

    #[test]
    fn test_three_values_can_be_flagged() {
        let report = detect(&[0.0, 0.0, 10.0], 1.0).unwrap();
        assert_eq!(report.outlier_indices, [2]);
    }

    #[test]
    fn test_multivariate_requires_enough_dimensions() {
        let mut rows = (0..20)
            .map(|i| vec![f64::from(i % 3), f64::from(i % 4)])
            .collect::<Vec<_>>();
        // extreme in one column only
        rows.push(vec![100.0, 1.0]);

        let strict = detect_multivariate(&rows, 3.0, 2).unwrap();
        assert!(strict.global_outliers.is_empty());
        let loose = detect_multivariate(&rows, 3.0, 1).unwrap();
        assert_eq!(loose.global_outliers, [20]);
        assert_eq!(loose.per_dimension.len(), 2);
    }

    #[test]
    fn test_multivariate_rejects_bad_shapes() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(
            detect_multivariate(&rows, 3.0, 1),
            Err(AnalysisError::RaggedRows {
                row: 1,
                expected: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            detect_multivariate(&[vec![1.0]], 3.0, 0),
            Err(AnalysisError::InvalidMinDimensions)
        ));
        assert!(matches!(
            detect_multivariate(&[], 3.0, 1),
            Err(AnalysisError::EmptySample)
        ));
    }
}
