//! Input data model for one evaluation period
//!
//! An [`EvaluationBatch`] is what the pipeline consumes: every individual in
//! the period with a stable identifier, a group attribute and the scalar
//! scores produced by each evaluation source.
//!
//! # Data Structure
//!
//! ```text
//! EvaluationBatch
//! ├─ period
//! └─ people: Vec<PersonRecord>
//!     ├─ id (stable identifier)
//!     ├─ group (partitioning attribute, never mutated)
//!     └─ scores: source name -> score (absent or null = not evaluated)
//! ```
//!
//! # Missing Scores
//!
//! A source that did not evaluate an individual is simply absent from the
//! record (or `null` in JSON). Absent scores are skipped by every stage; they
//! are never treated as zero.
//!
//! # Serialization
//!
//! ```json
//! {
//!   "period": "2024-H1",
//!   "people": [
//!     {
//!       "id": "P0001",
//!       "group": "female",
//!       "scores": { "competency": 7.4, "feedback_360": 6.9, "okr": null }
//!     }
//!   ]
//! }
//! ```
//!
//! # Examples
//!
//! ```
//! use fairrank_analysis::model::{EvaluationBatch, Group, PersonRecord, source};
//!
//! let batch = EvaluationBatch {
//!     period: "2024-H1".into(),
//!     people: vec![
//!         PersonRecord::new("P0001", Group::Female).with_score(source::COMPETENCY, 7.5),
//!         PersonRecord::new("P0002", Group::Male).with_score(source::OKR, 8.0),
//!     ],
//! };
//!
//! let sample = batch.sample_for(source::COMPETENCY)?;
//! assert_eq!(sample.len(), 1);
//! assert_eq!(batch.sources().len(), 2);
//! # Ok::<(), fairrank_analysis::error::AnalysisError>(())
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{error::AnalysisError, sample::ScoreSample};

/// Names of the evaluation sources known to the default criteria presets.
pub mod source {
    pub const COMPETENCY: &str = "competency";
    pub const FEEDBACK_360: &str = "feedback_360";
    pub const OKR: &str = "okr";
    pub const NINE_BOX_PERFORMANCE: &str = "nine_box_performance";
    pub const NINE_BOX_POTENTIAL: &str = "nine_box_potential";

    pub const ALL: [&str; 5] = [
        COMPETENCY,
        FEEDBACK_360,
        OKR,
        NINE_BOX_PERFORMANCE,
        NINE_BOX_POTENTIAL,
    ];
}

/// Stable identifier of an evaluated individual.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PersonId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Group attribute used to partition scores for bias analysis.
///
/// The declared order matters: when two groups are compared, the one declared
/// first is group A and mean differences are reported as A − B.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    #[display("female")]
    Female,
    #[display("male")]
    Male,
    #[display("other")]
    Other,
    #[display("undisclosed")]
    Undisclosed,
}

impl Group {
    pub const ALL: [Self; 4] = [Self::Female, Self::Male, Self::Other, Self::Undisclosed];
}

/// One individual's attributes and per-source scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: PersonId,
    pub group: Group,
    #[serde(default)]
    pub scores: BTreeMap<String, Option<f64>>,
}

impl PersonRecord {
    pub fn new(id: impl Into<String>, group: Group) -> Self {
        Self {
            id: PersonId::new(id),
            group,
            scores: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_score(mut self, source: &str, score: f64) -> Self {
        self.scores.insert(source.to_owned(), Some(score));
        self
    }

    /// Score from `source`, or `None` if the source did not evaluate this individual.
    #[must_use]
    pub fn score(&self, source: &str) -> Option<f64> {
        self.scores.get(source).copied().flatten()
    }
}

/// All evaluation records of one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationBatch {
    pub period: String,
    pub people: Vec<PersonRecord>,
}

impl EvaluationBatch {
    /// Checks that every identifier occurs only once.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::DuplicateId`] for the first repeated identifier.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let mut seen = BTreeSet::new();
        for person in &self.people {
            if !seen.insert(&person.id) {
                return Err(AnalysisError::DuplicateId {
                    id: person.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Group attribute of every individual, keyed by identifier.
    #[must_use]
    pub fn groups(&self) -> BTreeMap<PersonId, Group> {
        self.people
            .iter()
            .map(|p| (p.id.clone(), p.group))
            .collect()
    }

    /// Names of the sources that scored at least one individual.
    #[must_use]
    pub fn sources(&self) -> BTreeSet<&str> {
        self.people
            .iter()
            .flat_map(|p| {
                p.scores
                    .iter()
                    .filter(|(_, score)| score.is_some())
                    .map(|(name, _)| name.as_str())
            })
            .collect()
    }

    /// Builds the sample of individuals scored by `source`, in batch order.
    ///
    /// # Errors
    ///
    /// Returns an error if a present score is not finite.
    pub fn sample_for(&self, source: &str) -> Result<ScoreSample, AnalysisError> {
        ScoreSample::from_pairs(
            self.people
                .iter()
                .filter_map(|p| p.score(source).map(|score| (p.id.clone(), score))),
        )
    }
}
