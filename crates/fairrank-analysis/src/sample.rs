//! Identifier-aware score samples.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{error::AnalysisError, model::PersonId};

/// Ordered scores of one source, one per individual.
///
/// The identifier list runs parallel to the values so that identity survives
/// outlier removal. Every value is finite. A sample may be empty (for example
/// after filtering), but every statistic computed from it requires at least
/// one value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSample {
    ids: Vec<PersonId>,
    values: Vec<f64>,
}

impl ScoreSample {
    /// Builds a sample from parallel identifier and value lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the lists differ in length or a value is not finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use fairrank_analysis::{model::PersonId, sample::ScoreSample};
    ///
    /// let sample = ScoreSample::new(
    ///     vec![PersonId::new("a"), PersonId::new("b")],
    ///     vec![6.0, 8.0],
    /// )?;
    /// assert_eq!(sample.values(), &[6.0, 8.0]);
    ///
    /// assert!(ScoreSample::new(vec![PersonId::new("a")], vec![f64::NAN]).is_err());
    /// # Ok::<(), fairrank_analysis::error::AnalysisError>(())
    /// ```
    pub fn new(ids: Vec<PersonId>, values: Vec<f64>) -> Result<Self, AnalysisError> {
        if ids.len() != values.len() {
            return Err(AnalysisError::LengthMismatch {
                ids: ids.len(),
                values: values.len(),
            });
        }
        if let Some((id, &value)) = ids.iter().zip(&values).find(|(_, v)| !v.is_finite()) {
            return Err(AnalysisError::NonFiniteScore {
                id: id.clone(),
                value,
            });
        }
        Ok(Self { ids, values })
    }

    /// Builds a sample from `(id, value)` pairs, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is not finite.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, AnalysisError>
    where
        I: IntoIterator<Item = (PersonId, f64)>,
    {
        let (ids, values) = pairs.into_iter().unzip();
        Self::new(ids, values)
    }

    #[must_use]
    pub fn ids(&self) -> &[PersonId] {
        &self.ids
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PersonId, f64)> + '_ {
        self.ids.iter().zip(self.values.iter().copied())
    }

    /// Scores keyed by identifier.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<PersonId, f64> {
        self.iter().map(|(id, v)| (id.clone(), v)).collect()
    }

    /// Keeps the entries whose index is not listed in `removed` (ascending).
    pub(crate) fn without_indices(&self, removed: &[usize]) -> Self {
        let (ids, values) = self
            .iter()
            .enumerate()
            .filter(|(i, _)| removed.binary_search(i).is_err())
            .map(|(_, (id, v))| (id.clone(), v))
            .unzip();
        Self { ids, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<PersonId> {
        names.iter().copied().map(PersonId::from).collect()
    }

    #[test]
    fn test_length_mismatch() {
        let err = ScoreSample::new(ids(&["a"]), vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::LengthMismatch { ids: 1, values: 2 }
        ));
    }

    #[test]
    fn test_non_finite_names_the_individual() {
        let err = ScoreSample::new(ids(&["a", "b"]), vec![1.0, f64::INFINITY]).unwrap_err();
        match err {
            AnalysisError::NonFiniteScore { id, .. } => assert_eq!(id.as_str(), "b"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_without_indices_keeps_order() {
        let sample = ScoreSample::new(ids(&["a", "b", "c", "d"]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let kept = sample.without_indices(&[1, 3]);
        assert_eq!(kept.ids(), ids(&["a", "c"]).as_slice());
        assert_eq!(kept.values(), &[1.0, 3.0]);
    }
}
