use crate::descriptive::DescriptiveStats;

/// Computes Cohen's d, the standardized mean difference between two groups.
///
/// Uses the pooled sample standard deviation. Positive when group A has the
/// larger mean. Returns `0.0` when the pooled deviation is zero or undefined
/// (fewer than three observations in total).
///
/// # Interpretation (Cohen's conventions)
///
/// - |d| < 0.2: negligible effect
/// - 0.2 <= |d| < 0.5: small effect
/// - 0.5 <= |d| < 0.8: medium effect
/// - |d| >= 0.8: large effect
///
/// # Examples
///
/// ```
/// use fairrank_stats::{descriptive::DescriptiveStats, effect_size::cohens_d};
///
/// let a = DescriptiveStats::new([6.0, 7.0, 7.0, 8.0]).unwrap();
/// let b = DescriptiveStats::new([8.0, 9.0, 9.0, 10.0]).unwrap();
/// let d = cohens_d(&a, &b);
/// assert!((d + 2.0 / (2.0_f64 / 3.0).sqrt()).abs() < 1e-12);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn cohens_d(a: &DescriptiveStats, b: &DescriptiveStats) -> f64 {
    let dof = (a.count + b.count).saturating_sub(2);
    if dof == 0 {
        return 0.0;
    }
    let pooled_var = ((a.count.saturating_sub(1)) as f64 * a.variance
        + (b.count.saturating_sub(1)) as f64 * b.variance)
        / dof as f64;
    let pooled_std = pooled_var.sqrt();
    if pooled_std == 0.0 {
        return 0.0;
    }
    (a.mean - b.mean) / pooled_std
}

/// Conventional label for the magnitude of Cohen's d.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMagnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectMagnitude {
    #[must_use]
    pub fn from_cohens_d(d: f64) -> Self {
        let d = d.abs();
        if d < 0.2 {
            Self::Negligible
        } else if d < 0.5 {
            Self::Small
        } else if d < 0.8 {
            Self::Medium
        } else {
            Self::Large
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(values: &[f64]) -> DescriptiveStats {
        DescriptiveStats::new(values.iter().copied()).unwrap()
    }

    #[test]
    fn test_large_effect() {
        let d = cohens_d(
            &stats(&[0.9, 0.92, 0.88, 0.91, 0.89]),
            &stats(&[0.5, 0.52, 0.48, 0.51, 0.49]),
        );
        assert!(d > 2.0);
        assert_eq!(EffectMagnitude::from_cohens_d(d), EffectMagnitude::Large);
    }

    #[test]
    fn test_zero_spread_gives_zero() {
        assert_eq!(cohens_d(&stats(&[3.0, 3.0]), &stats(&[5.0, 5.0])), 0.0);
        assert_eq!(cohens_d(&stats(&[3.0]), &stats(&[5.0])), 0.0);
    }

    #[test]
    fn test_magnitude_uses_absolute_value() {
        assert_eq!(EffectMagnitude::from_cohens_d(0.1), EffectMagnitude::Negligible);
        assert_eq!(EffectMagnitude::from_cohens_d(0.3), EffectMagnitude::Small);
        assert_eq!(EffectMagnitude::from_cohens_d(-0.6), EffectMagnitude::Medium);
        assert_eq!(EffectMagnitude::from_cohens_d(-0.9), EffectMagnitude::Large);
    }
}
