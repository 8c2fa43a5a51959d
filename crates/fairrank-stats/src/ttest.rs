use serde::{Deserialize, Serialize};

use crate::{descriptive::DescriptiveStats, distribution::student_t_two_tailed};

/// Result of Welch's unequal-variance two-sample t-test.
///
/// The statistic is signed: positive when the first sample's mean is larger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WelchTTest {
    /// `(mean_a - mean_b) / sqrt(var_a / n_a + var_b / n_b)`
    #[serde(with = "crate::serde_float")]
    pub t_statistic: f64,
    /// Welch–Satterthwaite degrees of freedom.
    pub degrees_of_freedom: f64,
    /// Two-tailed p-value.
    pub p_value: f64,
}

impl WelchTTest {
    /// Runs the test on two raw samples.
    ///
    /// Returns `None` when either sample has fewer than two observations, since
    /// the sample variance is undefined there.
    ///
    /// # Examples
    ///
    /// ```
    /// use fairrank_stats::ttest::WelchTTest;
    ///
    /// let test = WelchTTest::new(&[6.0, 7.0, 7.0, 8.0], &[8.0, 9.0, 9.0, 10.0]).unwrap();
    /// assert!((test.t_statistic + 12.0_f64.sqrt()).abs() < 1e-12);
    /// assert!((test.degrees_of_freedom - 6.0).abs() < 1e-12);
    /// assert!(test.p_value < 0.05);
    ///
    /// assert!(WelchTTest::new(&[1.0], &[2.0, 3.0]).is_none());
    /// ```
    #[must_use]
    pub fn new(sample_a: &[f64], sample_b: &[f64]) -> Option<Self> {
        let a = DescriptiveStats::new(sample_a.iter().copied())?;
        let b = DescriptiveStats::new(sample_b.iter().copied())?;
        Self::from_stats(&a, &b)
    }

    /// Runs the test from precomputed descriptive statistics.
    ///
    /// When both variances are zero the statistic degenerates: equal means give
    /// `t = 0, p = 1`, different means give a signed infinite `t` with `p = 0`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_stats(a: &DescriptiveStats, b: &DescriptiveStats) -> Option<Self> {
        if a.count < 2 || b.count < 2 {
            return None;
        }
        let n_a = a.count as f64;
        let n_b = b.count as f64;
        let se_a = a.variance / n_a;
        let se_b = b.variance / n_b;
        let se_sq = se_a + se_b;
        let diff = a.mean - b.mean;

        if se_sq <= 0.0 {
            let (t_statistic, p_value) = if diff == 0.0 {
                (0.0, 1.0)
            } else {
                (f64::INFINITY.copysign(diff), 0.0)
            };
            return Some(Self {
                t_statistic,
                degrees_of_freedom: n_a + n_b - 2.0,
                p_value,
            });
        }

        let t_statistic = diff / se_sq.sqrt();
        let degrees_of_freedom =
            se_sq.powi(2) / (se_a.powi(2) / (n_a - 1.0) + se_b.powi(2) / (n_b - 1.0));
        let p_value = student_t_two_tailed(t_statistic, degrees_of_freedom);

        Some(Self {
            t_statistic,
            degrees_of_freedom,
            p_value,
        })
    }

    /// Returns true if the difference is significant at the given alpha level.
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_distr::{Distribution as _, Normal};
    use rand_pcg::Pcg64;

    use super::*;

    #[test]
    fn test_identical_samples_are_inconclusive() {
        let sample = [3.0, 4.0, 5.0, 6.0];
        let test = WelchTTest::new(&sample, &sample).unwrap();
        assert_eq!(test.t_statistic, 0.0);
        assert!((test.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sign_follows_first_sample() {
        let test = WelchTTest::new(&[9.0, 10.0, 11.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!(test.t_statistic > 0.0);
        let test = WelchTTest::new(&[1.0, 2.0, 3.0], &[9.0, 10.0, 11.0]).unwrap();
        assert!(test.t_statistic < 0.0);
    }

    #[test]
    fn test_unequal_variances() {
        let a = [
            27.5, 21.0, 19.0, 23.6, 17.0, 17.9, 16.9, 20.1, 21.9, 22.6, 23.1, 19.6, 19.0, 21.7, 21.4,
        ];
        let b = [
            27.1, 22.0, 20.8, 23.4, 23.4, 23.5, 25.8, 22.0, 24.8, 20.2, 21.9, 22.1, 22.9, 20.5, 24.4,
        ];
        let test = WelchTTest::new(&a, &b).unwrap();
        assert!((test.t_statistic + 2.455_356).abs() < 1e-5);
        assert!((test.degrees_of_freedom - 24.988_53).abs() < 1e-4);
        assert!((test.p_value - 0.021_378).abs() < 1e-5);
    }

    #[test]
    fn test_zero_variance_with_different_means() {
        let test = WelchTTest::new(&[5.0, 5.0, 5.0], &[7.0, 7.0]).unwrap();
        assert_eq!(test.t_statistic, f64::NEG_INFINITY);
        assert_eq!(test.p_value, 0.0);
        assert!(test.is_significant(0.05));
    }

    #[test]
    fn test_zero_variance_with_equal_means() {
        let test = WelchTTest::new(&[5.0, 5.0], &[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(test.t_statistic, 0.0);
        assert_eq!(test.p_value, 1.0);
    }

    #[test]
    fn test_false_positive_rate_is_near_alpha() {
        let mut rng = Pcg64::seed_from_u64(7);
        let normal = Normal::new(7.0, 1.2).unwrap();
        let trials = 400;
        let rejections = (0..trials)
            .filter(|_| {
                let a = (0..30).map(|_| normal.sample(&mut rng)).collect::<Vec<_>>();
                let b = (0..25).map(|_| normal.sample(&mut rng)).collect::<Vec<_>>();
                WelchTTest::new(&a, &b).unwrap().is_significant(0.05)
            })
            .count();
        // expected ~20 of 400
        assert!(rejections < 45, "rejections = {rejections}");
    }
}
