//! Two-group bias detection
//!
//! Scores are partitioned by group, summarized per group, and the two group
//! means are compared with Welch's unequal-variance t-test.
//!
//! # Decision Rule
//!
//! Bias is reported only when the difference is both statistically
//! significant and practically meaningful:
//!
//! ```text
//! bias_detected = p_value < alpha && |mean_A - mean_B| >= bias_threshold
//! ```
//!
//! Group A is the group declared first in [`Group`], so a Female/Male
//! comparison reports `mean_female - mean_male`.
//!
//! # Degenerate Groups
//!
//! A group with fewer than two observations has no sample variance. The test
//! is then inconclusive: statistic `0.0`, p-value `1.0`, no bias. When both
//! groups have zero variance, equal means give p = 1 and different means give
//! p = 0 with an infinite statistic.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use fairrank_analysis::{bias::BiasDetector, model::Group};
//!
//! let scores = BTreeMap::from([
//!     (Group::Female, vec![6.0, 7.0, 7.0, 8.0]),
//!     (Group::Male, vec![8.0, 9.0, 9.0, 10.0]),
//! ]);
//! let analysis = BiasDetector::default().analyze(&scores)?;
//! assert_eq!(analysis.mean_difference, -2.0);
//! assert!(analysis.p_value < 0.05);
//! assert!(analysis.bias_detected);
//! # Ok::<(), fairrank_analysis::error::AnalysisError>(())
//! ```

use std::collections::BTreeMap;

use fairrank_stats::{
    descriptive::DescriptiveStats,
    effect_size::{EffectMagnitude, cohens_d},
    ttest::WelchTTest,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{AnalysisError, validate_values},
    model::{Group, PersonId},
};

/// Default minimum absolute mean difference for a bias verdict.
pub const DEFAULT_BIAS_THRESHOLD: f64 = 0.05;
/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Descriptive statistics of one group's scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatistics {
    pub group: Group,
    #[serde(flatten)]
    pub stats: DescriptiveStats,
}

/// Outcome of comparing two groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasAnalysis {
    pub group_a: GroupStatistics,
    pub group_b: GroupStatistics,
    /// `mean_a - mean_b`
    pub mean_difference: f64,
    /// `mean_difference / |mean_b|`, or `0.0` when `mean_b` is zero.
    pub relative_difference: f64,
    /// Welch statistic; `±inf` when both groups are constant with different means.
    #[serde(with = "fairrank_stats::serde_float")]
    pub t_statistic: f64,
    /// Welch–Satterthwaite degrees of freedom; `None` when the test is inconclusive.
    pub degrees_of_freedom: Option<f64>,
    pub p_value: f64,
    /// Cohen's d with pooled standard deviation.
    pub effect_size: f64,
    pub effect_magnitude: EffectMagnitude,
    pub alpha: f64,
    pub bias_threshold: f64,
    /// `p_value < alpha`
    pub significant: bool,
    pub bias_detected: bool,
}

impl BiasAnalysis {
    #[must_use]
    pub fn group(&self, group: Group) -> Option<&GroupStatistics> {
        [&self.group_a, &self.group_b]
            .into_iter()
            .find(|g| g.group == group)
    }
}

/// Compares the score distributions of exactly two groups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasDetector {
    bias_threshold: f64,
    alpha: f64,
}

impl Default for BiasDetector {
    fn default() -> Self {
        Self {
            bias_threshold: DEFAULT_BIAS_THRESHOLD,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl BiasDetector {
    /// Creates a detector with the given decision parameters.
    ///
    /// # Errors
    ///
    /// Returns an error unless `bias_threshold` is finite and non-negative and
    /// `alpha` lies strictly between 0 and 1.
    pub fn new(bias_threshold: f64, alpha: f64) -> Result<Self, AnalysisError> {
        if !(bias_threshold.is_finite() && bias_threshold >= 0.0) {
            return Err(AnalysisError::InvalidBiasThreshold {
                value: bias_threshold,
            });
        }
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(AnalysisError::InvalidAlpha { value: alpha });
        }
        Ok(Self {
            bias_threshold,
            alpha,
        })
    }

    #[must_use]
    pub fn bias_threshold(&self) -> f64 {
        self.bias_threshold
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Analyzes a mapping of exactly two groups to their scores.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapping does not hold exactly two groups, or if
    /// a group's scores are empty or not finite.
    pub fn analyze(
        &self,
        scores_by_group: &BTreeMap<Group, Vec<f64>>,
    ) -> Result<BiasAnalysis, AnalysisError> {
        let mut groups = scores_by_group.iter();
        let (Some((&group_a, scores_a)), Some((&group_b, scores_b)), None) =
            (groups.next(), groups.next(), groups.next())
        else {
            return Err(AnalysisError::GroupCount {
                found: scores_by_group.len(),
            });
        };

        let stats_a = group_statistics(group_a, scores_a)?;
        let stats_b = group_statistics(group_b, scores_b)?;

        let mean_difference = stats_a.stats.mean - stats_b.stats.mean;
        let relative_difference = if stats_b.stats.mean == 0.0 {
            0.0
        } else {
            mean_difference / stats_b.stats.mean.abs()
        };

        let (t_statistic, degrees_of_freedom, p_value) =
            match WelchTTest::from_stats(&stats_a.stats, &stats_b.stats) {
                Some(test) => (test.t_statistic, Some(test.degrees_of_freedom), test.p_value),
                None => (0.0, None, 1.0),
            };
        let effect_size = cohens_d(&stats_a.stats, &stats_b.stats);
        let significant = p_value < self.alpha;
        let bias_detected = significant && mean_difference.abs() >= self.bias_threshold;

        debug!(
            %group_a,
            %group_b,
            mean_difference,
            t_statistic,
            p_value,
            bias_detected,
            "bias analysis"
        );

        Ok(BiasAnalysis {
            group_a: stats_a,
            group_b: stats_b,
            mean_difference,
            relative_difference,
            t_statistic,
            degrees_of_freedom,
            p_value,
            effect_size,
            effect_magnitude: EffectMagnitude::from_cohens_d(effect_size),
            alpha: self.alpha,
            bias_threshold: self.bias_threshold,
            significant,
            bias_detected,
        })
    }
}

/// Analyzes two groups with explicit decision parameters.
///
/// Shorthand for [`BiasDetector::new`] followed by [`BiasDetector::analyze`].
///
/// # Errors
///
/// Returns an error if a parameter is invalid or the groups are malformed.
pub fn analyze(
    scores_by_group: &BTreeMap<Group, Vec<f64>>,
    bias_threshold: f64,
    alpha: f64,
) -> Result<BiasAnalysis, AnalysisError> {
    BiasDetector::new(bias_threshold, alpha)?.analyze(scores_by_group)
}

fn group_statistics(group: Group, scores: &[f64]) -> Result<GroupStatistics, AnalysisError> {
    validate_values(scores).map_err(|err| match err {
        AnalysisError::EmptySample => AnalysisError::EmptyGroup { group },
        other => other,
    })?;
    let stats = DescriptiveStats::new(scores.iter().copied())
        .ok_or(AnalysisError::EmptyGroup { group })?;
    Ok(GroupStatistics { group, stats })
}

/// Splits id-keyed scores into per-group score lists.
///
/// # Errors
///
/// Returns [`AnalysisError::MissingGroup`] for a scored individual with no
/// recorded group.
pub fn partition_by_group(
    scores_by_id: &BTreeMap<PersonId, f64>,
    group_by_id: &BTreeMap<PersonId, Group>,
) -> Result<BTreeMap<Group, Vec<f64>>, AnalysisError> {
    let mut partition = BTreeMap::<Group, Vec<f64>>::new();
    for (id, &score) in scores_by_id {
        let group = group_by_id
            .get(id)
            .ok_or_else(|| AnalysisError::MissingGroup { id: id.clone() })?;
        partition.entry(*group).or_default().push(score);
    }
    Ok(partition)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_distr::{Distribution as _, Normal};
    use rand_pcg::Pcg64;

    use super::*;
    use crate::error::ErrorKind;

    fn two_groups(a: &[f64], b: &[f64]) -> BTreeMap<Group, Vec<f64>> {
        BTreeMap::from([(Group::Female, a.to_vec()), (Group::Male, b.to_vec())])
    }

    #[test]
    fn test_biased_scenario() {
        let analysis = BiasDetector::default()
            .analyze(&two_groups(&[6.0, 7.0, 7.0, 8.0], &[8.0, 9.0, 9.0, 10.0]))
            .unwrap();

        assert_eq!(analysis.group_a.group, Group::Female);
        assert_eq!(analysis.group_a.stats.mean, 7.0);
        assert_eq!(analysis.group_b.stats.mean, 9.0);
        assert_eq!(analysis.group_a.stats.median, 7.0);
        assert_eq!(analysis.mean_difference, -2.0);
        assert!((analysis.relative_difference + 2.0 / 9.0).abs() < 1e-12);
        assert!((analysis.t_statistic + 12.0_f64.sqrt()).abs() < 1e-9);
        assert!((analysis.degrees_of_freedom.unwrap() - 6.0).abs() < 1e-9);
        assert!(analysis.p_value < 0.05);
        assert!(analysis.significant);
        assert!(analysis.bias_detected);
        assert_eq!(analysis.effect_magnitude, EffectMagnitude::Large);
    }

    #[test]
    fn test_small_difference_is_not_bias() {
        // significant but below the practical threshold
        let a = [5.0, 5.001, 5.002, 5.001, 5.0, 5.002];
        let b = [5.02, 5.021, 5.022, 5.021, 5.02, 5.022];
        let analysis = analyze(&two_groups(&a, &b), 0.05, 0.05).unwrap();
        assert!(analysis.significant);
        assert!(!analysis.bias_detected);
    }

    #[test]
    fn test_group_order_follows_enum() {
        let scores = BTreeMap::from([
            (Group::Undisclosed, vec![1.0, 2.0]),
            (Group::Male, vec![3.0, 4.0]),
        ]);
        let analysis = BiasDetector::default().analyze(&scores).unwrap();
        assert_eq!(analysis.group_a.group, Group::Male);
        assert_eq!(analysis.group_b.group, Group::Undisclosed);
        assert_eq!(analysis.mean_difference, 2.0);
        assert!(analysis.group(Group::Undisclosed).is_some());
        assert!(analysis.group(Group::Female).is_none());
    }

    #[test]
    fn test_single_observation_is_inconclusive() {
        let analysis = BiasDetector::default()
            .analyze(&two_groups(&[2.0], &[9.0, 9.5, 10.0]))
            .unwrap();
        assert_eq!(analysis.group_a.stats.std_dev, 0.0);
        assert_eq!(analysis.t_statistic, 0.0);
        assert_eq!(analysis.p_value, 1.0);
        assert_eq!(analysis.degrees_of_freedom, None);
        assert!(!analysis.bias_detected);
    }

    #[test]
    fn test_zero_variance_groups() {
        let detector = BiasDetector::default();
        let equal = detector
            .analyze(&two_groups(&[5.0, 5.0], &[5.0, 5.0, 5.0]))
            .unwrap();
        assert_eq!(equal.p_value, 1.0);
        assert!(!equal.bias_detected);

        let different = detector
            .analyze(&two_groups(&[5.0, 5.0], &[7.0, 7.0, 7.0]))
            .unwrap();
        assert_eq!(different.p_value, 0.0);
        assert_eq!(different.t_statistic, f64::NEG_INFINITY);
        assert!(different.bias_detected);
    }

    #[test]
    fn test_infinite_statistic_survives_json() {
        let analysis = BiasDetector::default()
            .analyze(&two_groups(&[5.0, 5.0], &[7.0, 7.0, 7.0]))
            .unwrap();
        let json = serde_json::to_string(&analysis).unwrap();
        assert!(json.contains(r#""t_statistic":"-inf""#));
        let back: BiasAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(back.t_statistic, f64::NEG_INFINITY);
        assert_eq!(back.p_value, 0.0);
        assert_eq!(back.mean_difference, -2.0);
        assert!(back.bias_detected);
    }

    #[test]
    fn test_rejects_wrong_group_count() {
        let detector = BiasDetector::default();
        let one = BTreeMap::from([(Group::Female, vec![1.0, 2.0])]);
        assert!(matches!(
            detector.analyze(&one),
            Err(AnalysisError::GroupCount { found: 1 })
        ));
        let mut three = two_groups(&[1.0, 2.0], &[3.0, 4.0]);
        three.insert(Group::Other, vec![5.0, 6.0]);
        assert!(matches!(
            detector.analyze(&three),
            Err(AnalysisError::GroupCount { found: 3 })
        ));
        assert!(matches!(
            detector.analyze(&BTreeMap::new()),
            Err(AnalysisError::GroupCount { found: 0 })
        ));
    }

    #[test]
    fn test_rejects_empty_or_non_finite_group() {
        let detector = BiasDetector::default();
        assert!(matches!(
            detector.analyze(&two_groups(&[1.0, 2.0], &[])),
            Err(AnalysisError::EmptyGroup {
                group: Group::Male
            })
        ));
        let err = detector
            .analyze(&two_groups(&[1.0, f64::NAN], &[1.0]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        for (threshold, alpha) in [(-0.1, 0.05), (f64::NAN, 0.05), (0.05, 0.0), (0.05, 1.0)] {
            let err = BiasDetector::new(threshold, alpha).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        }
        assert!(BiasDetector::new(0.0, 0.01).is_ok());
    }

    #[test]
    fn test_identical_distributions_rarely_flag_bias() {
        let mut rng = Pcg64::seed_from_u64(2024);
        let normal = Normal::new(7.0, 1.0).unwrap();
        let detector = BiasDetector::default();
        let trials = 300;
        let flagged = (0..trials)
            .filter(|_| {
                let a = (0..40).map(|_| normal.sample(&mut rng)).collect::<Vec<_>>();
                let b = (0..45).map(|_| normal.sample(&mut rng)).collect::<Vec<_>>();
                detector.analyze(&two_groups(&a, &b)).unwrap().bias_detected
            })
            .count();
        // expected ~15 of 300
        assert!(flagged < 35, "flagged = {flagged}");
    }

    #[test]
    fn test_partition_by_group() {
        let scores = BTreeMap::from([
            (PersonId::new("a"), 1.0),
            (PersonId::new("b"), 2.0),
            (PersonId::new("c"), 3.0),
        ]);
        let mut groups = BTreeMap::from([
            (PersonId::new("a"), Group::Female),
            (PersonId::new("b"), Group::Male),
            (PersonId::new("c"), Group::Female),
        ]);
        let partition = partition_by_group(&scores, &groups).unwrap();
        assert_eq!(partition[&Group::Female], [1.0, 3.0]);
        assert_eq!(partition[&Group::Male], [2.0]);

        groups.remove(&PersonId::new("b"));
        assert!(matches!(
            partition_by_group(&scores, &groups),
            Err(AnalysisError::MissingGroup { .. })
        ));
    }
}
