//! Pipeline configuration
//!
//! Every field has a default, so a configuration file only needs to name the
//! values it changes:
//!
//! ```json
//! {
//!   "correction_strength": 0.5,
//!   "criteria": { "competency": 1.0, "okr": 2.0 },
//!   "score_range": { "min": 0.0, "max": 10.0 }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    bias::{BiasDetector, DEFAULT_ALPHA, DEFAULT_BIAS_THRESHOLD},
    correction::{DEFAULT_STRENGTH, validate_strength},
    error::AnalysisError,
    model::Group,
    outlier::{DEFAULT_THRESHOLD, validate_threshold},
    ranking::Criteria,
};

/// Parameters of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Outlier cut-off in standard deviations.
    pub outlier_threshold: f64,
    /// Minimum absolute mean difference for a bias verdict.
    pub bias_threshold: f64,
    /// Significance level of the group comparison.
    pub alpha: f64,
    /// Fraction of the group gap closed by the corrector.
    pub correction_strength: f64,
    /// The two groups compared and corrected; other groups pass through unchanged.
    pub compared_groups: [Group; 2],
    pub criteria: Criteria,
    /// Clamp applied to corrected scores, if any.
    pub score_range: Option<ScoreRange>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            outlier_threshold: DEFAULT_THRESHOLD,
            bias_threshold: DEFAULT_BIAS_THRESHOLD,
            alpha: DEFAULT_ALPHA,
            correction_strength: DEFAULT_STRENGTH,
            compared_groups: [Group::Female, Group::Male],
            criteria: Criteria::standard(),
            score_range: None,
        }
    }
}

impl PipelineConfig {
    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter found.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        validate_threshold(self.outlier_threshold)?;
        BiasDetector::new(self.bias_threshold, self.alpha)?;
        validate_strength(self.correction_strength)?;
        let [a, b] = self.compared_groups;
        if a == b {
            return Err(AnalysisError::DuplicateComparedGroup { group: a });
        }
        if let Some(range) = &self.score_range {
            range.validate()?;
        }
        Ok(())
    }

    pub(crate) fn detector(&self) -> Result<BiasDetector, AnalysisError> {
        BiasDetector::new(self.bias_threshold, self.alpha)
    }
}

/// Closed interval that corrected scores are clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidScoreRange`] unless both bounds are
    /// finite and `min <= max`.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.min.is_finite() && self.max.is_finite() && self.min <= self.max {
            Ok(())
        } else {
            Err(AnalysisError::InvalidScoreRange {
                min: self.min,
                max: self.max,
            })
        }
    }

    #[must_use]
    pub fn clamp(&self, score: f64) -> f64 {
        score.clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.outlier_threshold, 3.0);
        assert_eq!(config.bias_threshold, 0.05);
        assert_eq!(config.alpha, 0.05);
        assert_eq!(config.correction_strength, 1.0);
        assert_eq!(config.compared_groups, [Group::Female, Group::Male]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{ "correction_strength": 0.5, "score_range": { "min": 0.0, "max": 10.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.correction_strength, 0.5);
        assert_eq!(config.alpha, 0.05);
        assert_eq!(config.criteria, Criteria::standard());
        assert_eq!(config.score_range.unwrap().clamp(11.2), 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(serde_json::from_str::<PipelineConfig>(r#"{ "strength": 0.5 }"#).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            PipelineConfig {
                outlier_threshold: 0.0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                alpha: 1.5,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                bias_threshold: -0.1,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                correction_strength: 2.0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                compared_groups: [Group::Male, Group::Male],
                ..PipelineConfig::default()
            },
            PipelineConfig {
                score_range: Some(ScoreRange {
                    min: 10.0,
                    max: 0.0,
                }),
                ..PipelineConfig::default()
            },
        ];
        for config in bad {
            let err = config.validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParameter, "{err}");
        }
    }
}
