//! Multi-criteria ranking
//!
//! Corrected component scores (one per evaluation source) are combined into a
//! weighted final score per individual, then sorted into a total order.
//!
//! # Combined Score
//!
//! ```text
//! combined = Σ w_i · s_i / Σ w_i
//! ```
//!
//! The sums run over the components that are both present for the individual
//! and named in the [`Criteria`]. Absent components are never zero-filled:
//! weights are renormalized over what is present.
//!
//! # Ordering
//!
//! Entries are sorted by combined score descending, ties broken by identifier
//! ascending. Positions are dense and strictly sequential (1, 2, 3, ...), so
//! tied individuals still receive distinct positions.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use fairrank_analysis::{model::PersonId, ranking::{self, Criteria}};
//!
//! let criteria = Criteria::new([("competency", 1.0), ("okr", 3.0)])?;
//! let components = BTreeMap::from([
//!     (PersonId::new("a"), BTreeMap::from([("competency".into(), 8.0), ("okr".into(), 4.0)])),
//!     (PersonId::new("b"), BTreeMap::from([("competency".into(), 6.0)])),
//! ]);
//!
//! let combined = ranking::combine(&components, &criteria)?;
//! assert_eq!(combined[&PersonId::new("a")].score, 5.0);
//! assert_eq!(combined[&PersonId::new("b")].score, 6.0);
//!
//! let ranking = ranking::rank(&combined);
//! assert_eq!(ranking.entries[0].id, PersonId::new("b"));
//! assert_eq!(ranking.entries[1].position, 2);
//! # Ok::<(), fairrank_analysis::error::AnalysisError>(())
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::AnalysisError,
    model::{PersonId, source},
};

/// Component name → non-negative weight.
///
/// At least one weight is positive. Weights need not sum to one; they are
/// renormalized per individual over the components that individual has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct Criteria {
    weights: BTreeMap<String, f64>,
}

impl Default for Criteria {
    fn default() -> Self {
        Self::standard()
    }
}

impl Criteria {
    /// Builds a validated weight set.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidWeight`] for a negative or non-finite
    /// weight and [`AnalysisError::NoCriteria`] when no weight is positive.
    pub fn new<I, S>(weights: I) -> Result<Self, AnalysisError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let weights = weights
            .into_iter()
            .map(|(name, weight)| (name.into(), weight))
            .collect::<BTreeMap<String, f64>>();
        if let Some((criterion, &weight)) = weights
            .iter()
            .find(|(_, w)| !(w.is_finite() && **w >= 0.0))
        {
            return Err(AnalysisError::InvalidWeight {
                criterion: criterion.clone(),
                weight,
            });
        }
        if !weights.values().any(|w| *w > 0.0) {
            return Err(AnalysisError::NoCriteria);
        }
        Ok(Self { weights })
    }

    /// Competency, 360° feedback and OKR scores with OKRs weighted highest.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            weights: BTreeMap::from([
                (source::COMPETENCY.to_owned(), 1.0),
                (source::FEEDBACK_360.to_owned(), 0.9),
                (source::OKR.to_owned(), 1.2),
            ]),
        }
    }

    /// Nine-box performance and potential, equally weighted.
    #[must_use]
    pub fn nine_box() -> Self {
        Self {
            weights: BTreeMap::from([
                (source::NINE_BOX_PERFORMANCE.to_owned(), 1.0),
                (source::NINE_BOX_POTENTIAL.to_owned(), 1.0),
            ]),
        }
    }

    #[must_use]
    pub fn weight(&self, name: &str) -> Option<f64> {
        self.weights.get(name).copied()
    }

    /// Names with a positive weight.
    pub fn weighted_components(&self) -> impl Iterator<Item = &str> + '_ {
        self.weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.weights.iter().map(|(name, w)| (name.as_str(), *w))
    }
}

impl TryFrom<BTreeMap<String, f64>> for Criteria {
    type Error = AnalysisError;

    fn try_from(weights: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::new(weights)
    }
}

impl From<Criteria> for BTreeMap<String, f64> {
    fn from(criteria: Criteria) -> Self {
        criteria.weights
    }
}

/// Weighted score of one individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedScore {
    pub score: f64,
    /// Component scores that contributed (present and positively weighted).
    pub components: BTreeMap<String, f64>,
}

impl CombinedScore {
    /// A combined score without component breakdown.
    #[must_use]
    pub fn new(score: f64) -> Self {
        Self {
            score,
            components: BTreeMap::new(),
        }
    }
}

/// Combines each individual's component scores using `criteria`.
///
/// Individuals with no positively weighted component present are left out
/// and reported with a warning.
///
/// # Errors
///
/// Returns [`AnalysisError::NonFiniteScore`] if a contributing component is not finite.
pub fn combine(
    components_by_id: &BTreeMap<PersonId, BTreeMap<String, f64>>,
    criteria: &Criteria,
) -> Result<BTreeMap<PersonId, CombinedScore>, AnalysisError> {
    let mut combined = BTreeMap::new();
    for (id, components) in components_by_id {
        let contributing = components
            .iter()
            .filter_map(|(name, &score)| {
                let weight = criteria.weight(name)?;
                (weight > 0.0).then_some((name, score, weight))
            })
            .collect::<Vec<_>>();

        if let Some(&(_, value, _)) = contributing.iter().find(|(_, s, _)| !s.is_finite()) {
            return Err(AnalysisError::NonFiniteScore {
                id: id.clone(),
                value,
            });
        }
        if contributing.is_empty() {
            warn!(%id, "no weighted component present, left out of ranking");
            continue;
        }

        let weight_sum = contributing.iter().map(|(_, _, w)| w).sum::<f64>();
        let score = contributing.iter().map(|(_, s, w)| s * w).sum::<f64>() / weight_sum;
        let components = contributing
            .into_iter()
            .map(|(name, s, _)| (name.clone(), s))
            .collect();
        combined.insert(id.clone(), CombinedScore { score, components });
    }
    debug!(
        individuals = components_by_id.len(),
        combined = combined.len(),
        "combined component scores"
    );
    Ok(combined)
}

/// One individual's place in a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 1-based dense position.
    pub position: usize,
    pub id: PersonId,
    pub combined_score: f64,
    pub components: BTreeMap<String, f64>,
}

/// Summary of the combined scores in a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingSummary {
    pub count: usize,
    pub max: f64,
    pub min: f64,
    pub mean: f64,
}

/// Individuals in rank order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub entries: Vec<RankingEntry>,
}

impl Ranking {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first `n` entries, or all of them when the ranking is shorter.
    #[must_use]
    pub fn top_n(&self, n: usize) -> &[RankingEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    #[must_use]
    pub fn entry(&self, id: &PersonId) -> Option<&RankingEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Count, extremes and mean of the combined scores; `None` when empty.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn summary(&self) -> Option<RankingSummary> {
        let first = self.entries.first()?;
        let last = self.entries.last()?;
        let count = self.entries.len();
        let mean = self.entries.iter().map(|e| e.combined_score).sum::<f64>() / count as f64;
        Some(RankingSummary {
            count,
            max: first.combined_score,
            min: last.combined_score,
            mean,
        })
    }
}

/// Sorts combined scores into a dense ranking.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use fairrank_analysis::{model::PersonId, ranking::{self, CombinedScore}};
///
/// let scores = BTreeMap::from([
///     (PersonId::new("C"), CombinedScore::new(7.0)),
///     (PersonId::new("B"), CombinedScore::new(9.0)),
///     (PersonId::new("A"), CombinedScore::new(9.0)),
/// ]);
/// let ranking = ranking::rank(&scores);
/// let order = ranking.entries.iter().map(|e| (e.id.as_str(), e.position)).collect::<Vec<_>>();
/// assert_eq!(order, [("A", 1), ("B", 2), ("C", 3)]);
/// ```
#[must_use]
pub fn rank(combined: &BTreeMap<PersonId, CombinedScore>) -> Ranking {
    let mut sorted = combined.iter().collect::<Vec<_>>();
    sorted.sort_by(|(id_a, a), (id_b, b)| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| id_a.cmp(id_b))
    });
    let entries = sorted
        .into_iter()
        .enumerate()
        .map(|(i, (id, combined))| RankingEntry {
            position: i + 1,
            id: id.clone(),
            combined_score: combined.score,
            components: combined.components.clone(),
        })
        .collect();
    Ranking { entries }
}
