//! Error taxonomy shared by every pipeline stage.
//!
//! Every fallible operation either returns a complete result or one of these
//! errors; there are no partially populated results. Numeric degeneracies
//! (zero variance, groups too small for a variance) are not errors.

use crate::model::{Group, PersonId};

/// Coarse classification of an [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The data handed to a stage has the wrong shape or contains non-finite values.
    InvalidInput,
    /// A tuning parameter is outside its valid domain.
    InvalidParameter,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum AnalysisError {
    #[display("Sample is empty")]
    EmptySample,
    #[display("Non-finite value {value} at index {index}")]
    NonFiniteValue { index: usize, value: f64 },
    #[display("Non-finite score {value} for '{id}'")]
    NonFiniteScore { id: PersonId, value: f64 },
    #[display("Identifier list has {ids} entries but sample has {values} values")]
    LengthMismatch { ids: usize, values: usize },
    #[display("Outlier report describes {expected} values but sample has {actual}")]
    ReportMismatch { expected: usize, actual: usize },
    #[display("Row {row} has {actual} columns, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[display("Exactly two groups are required, found {found}")]
    GroupCount { found: usize },
    #[display("Group '{group}' has no scores")]
    EmptyGroup { group: Group },
    #[display("No group recorded for '{id}'")]
    MissingGroup { id: PersonId },
    #[display("Identifier '{id}' appears more than once")]
    DuplicateId { id: PersonId },

    #[display("Outlier threshold must be positive and finite, got {value}")]
    InvalidThreshold { value: f64 },
    #[display("Alpha must lie in (0, 1), got {value}")]
    InvalidAlpha { value: f64 },
    #[display("Bias threshold must be non-negative and finite, got {value}")]
    InvalidBiasThreshold { value: f64 },
    #[display("Correction strength must lie in [0, 1], got {value}")]
    InvalidCorrectionStrength { value: f64 },
    #[display("Weight for criterion '{criterion}' must be non-negative and finite, got {weight}")]
    InvalidWeight { criterion: String, weight: f64 },
    #[display("Criteria carry no positive weight")]
    NoCriteria,
    #[display("Minimum outlier dimension count must be at least 1")]
    InvalidMinDimensions,
    #[display("Score range [{min}, {max}] is empty or non-finite")]
    InvalidScoreRange { min: f64, max: f64 },
    #[display("Compared groups must differ, got '{group}' twice")]
    DuplicateComparedGroup { group: Group },

    #[display("Source '{name}': {inner}")]
    Source {
        name: String,
        #[error(source)]
        inner: Box<AnalysisError>,
    },
}

impl AnalysisError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySample
            | Self::NonFiniteValue { .. }
            | Self::NonFiniteScore { .. }
            | Self::LengthMismatch { .. }
            | Self::ReportMismatch { .. }
            | Self::RaggedRows { .. }
            | Self::GroupCount { .. }
            | Self::EmptyGroup { .. }
            | Self::MissingGroup { .. }
            | Self::DuplicateId { .. } => ErrorKind::InvalidInput,
            Self::InvalidThreshold { .. }
            | Self::InvalidAlpha { .. }
            | Self::InvalidBiasThreshold { .. }
            | Self::InvalidCorrectionStrength { .. }
            | Self::InvalidWeight { .. }
            | Self::NoCriteria
            | Self::InvalidMinDimensions
            | Self::InvalidScoreRange { .. }
            | Self::DuplicateComparedGroup { .. } => ErrorKind::InvalidParameter,
            Self::Source { inner, .. } => inner.kind(),
        }
    }

    pub(crate) fn in_source(name: &str) -> impl FnOnce(Self) -> Self + '_ {
        move |inner| Self::Source {
            name: name.to_owned(),
            inner: Box::new(inner),
        }
    }
}

/// Checks that a sample is non-empty and holds only finite values.
pub(crate) fn validate_values(values: &[f64]) -> Result<(), AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::EmptySample);
    }
    if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(AnalysisError::NonFiniteValue { index, value });
    }
    Ok(())
}
