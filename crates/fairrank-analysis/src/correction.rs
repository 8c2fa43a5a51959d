//! Mean-shift bias correction
//!
//! Each group's scores receive one additive shift that moves the group mean
//! toward a common target:
//!
//! ```text
//! T          = (n_A · μ_A + n_B · μ_B) / (n_A + n_B)
//! adjusted_i = s_i + strength · (T − μ_g(i))
//! ```
//!
//! A uniform shift keeps the order and spread inside each group, and since
//! `n_A · shift_A + n_B · shift_B = 0` the overall mean is unchanged. With
//! strength `0.0` every score is returned untouched; with strength `1.0` both
//! group means land on `T`.
//!
//! The corrector never clamps. Keeping adjusted scores inside a rating scale
//! is left to the caller (the pipeline does it when a score range is
//! configured).

use std::collections::BTreeMap;

use fairrank_stats::descriptive::mean;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    bias::partition_by_group,
    error::AnalysisError,
    model::{Group, PersonId},
};

/// Default correction strength: close the whole gap.
pub const DEFAULT_STRENGTH: f64 = 1.0;

/// Shift applied to one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAdjustment {
    pub group: Group,
    pub count: usize,
    pub mean_before: f64,
    pub mean_after: f64,
    /// Additive shift applied to every score of the group.
    pub shift: f64,
}

/// Adjusted scores and the per-group shifts that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReweightingResult {
    pub correction_strength: f64,
    pub target_mean: f64,
    /// Exactly two entries, in group declaration order.
    pub adjustments: Vec<GroupAdjustment>,
    /// `mean_a - mean_b` before the shift.
    pub mean_difference_before: f64,
    /// `mean_a - mean_b` after the shift.
    pub mean_difference_after: f64,
    pub adjusted_scores: BTreeMap<PersonId, f64>,
}

impl ReweightingResult {
    #[must_use]
    pub fn adjustment(&self, group: Group) -> Option<&GroupAdjustment> {
        self.adjustments.iter().find(|a| a.group == group)
    }

    #[must_use]
    pub fn adjusted_score(&self, id: &PersonId) -> Option<f64> {
        self.adjusted_scores.get(id).copied()
    }
}

/// Checks that `strength` lies in `[0, 1]`.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidCorrectionStrength`] otherwise.
pub fn validate_strength(strength: f64) -> Result<(), AnalysisError> {
    if (0.0..=1.0).contains(&strength) {
        Ok(())
    } else {
        Err(AnalysisError::InvalidCorrectionStrength { value: strength })
    }
}

/// Shifts each group's scores toward the size-weighted mean of both groups.
///
/// # Arguments
///
/// * `scores_by_id` - Scores to correct; every individual must belong to one of exactly two groups
/// * `group_by_id` - Group of each individual (may contain individuals without a score)
/// * `correction_strength` - Fraction of the gap to close, in `[0, 1]`
///
/// # Errors
///
/// Returns an error if the strength is out of range, a score is not finite,
/// a scored individual has no group, or the scores do not span exactly two groups.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use fairrank_analysis::{correction, model::{Group, PersonId}};
///
/// let people = [("f1", Group::Female, 6.0), ("f2", Group::Female, 8.0),
///               ("m1", Group::Male, 8.0), ("m2", Group::Male, 10.0)];
/// let scores = people.iter().map(|(id, _, s)| (PersonId::new(*id), *s)).collect();
/// let groups = people.iter().map(|(id, g, _)| (PersonId::new(*id), *g)).collect();
///
/// let result = correction::apply(&scores, &groups, 1.0)?;
/// assert_eq!(result.target_mean, 8.0);
/// assert_eq!(result.adjusted_score(&PersonId::new("f1")), Some(7.0));
/// assert_eq!(result.adjusted_score(&PersonId::new("m2")), Some(9.0));
/// # Ok::<(), fairrank_analysis::error::AnalysisError>(())
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn apply(
    scores_by_id: &BTreeMap<PersonId, f64>,
    group_by_id: &BTreeMap<PersonId, Group>,
    correction_strength: f64,
) -> Result<ReweightingResult, AnalysisError> {
    validate_strength(correction_strength)?;
    if let Some((id, &value)) = scores_by_id.iter().find(|(_, v)| !v.is_finite()) {
        return Err(AnalysisError::NonFiniteScore {
            id: id.clone(),
            value,
        });
    }

    let partition = partition_by_group(scores_by_id, group_by_id)?;
    if partition.len() != 2 {
        return Err(AnalysisError::GroupCount {
            found: partition.len(),
        });
    }

    let group_means = partition
        .iter()
        .map(|(&group, scores)| {
            let m = mean(scores).ok_or(AnalysisError::EmptyGroup { group })?;
            Ok((group, (scores.len(), m)))
        })
        .collect::<Result<BTreeMap<_, _>, AnalysisError>>()?;

    let total = group_means.values().map(|(n, _)| *n).sum::<usize>() as f64;
    let target_mean = group_means
        .values()
        .map(|(n, m)| *n as f64 * m)
        .sum::<f64>()
        / total;
    let shifts = group_means
        .iter()
        .map(|(&group, (_, m))| (group, correction_strength * (target_mean - m)))
        .collect::<BTreeMap<_, _>>();

    let mut adjusted_scores = BTreeMap::new();
    let mut adjusted_by_group = BTreeMap::<Group, Vec<f64>>::new();
    for (id, &score) in scores_by_id {
        let group = group_by_id
            .get(id)
            .ok_or_else(|| AnalysisError::MissingGroup { id: id.clone() })?;
        let shift = shifts.get(group).copied().unwrap_or_default();
        let adjusted = score + shift;
        adjusted_scores.insert(id.clone(), adjusted);
        adjusted_by_group.entry(*group).or_default().push(adjusted);
    }

    let adjustments = group_means
        .iter()
        .map(|(&group, &(count, mean_before))| GroupAdjustment {
            group,
            count,
            mean_before,
            mean_after: adjusted_by_group
                .get(&group)
                .and_then(|scores| mean(scores))
                .unwrap_or(mean_before),
            shift: shifts.get(&group).copied().unwrap_or_default(),
        })
        .collect::<Vec<_>>();
    let mean_difference_before = adjustments[0].mean_before - adjustments[1].mean_before;
    let mean_difference_after = adjustments[0].mean_after - adjustments[1].mean_after;

    debug!(
        correction_strength,
        target_mean,
        mean_difference_before,
        mean_difference_after,
        "bias correction"
    );

    Ok(ReweightingResult {
        correction_strength,
        target_mean,
        adjustments,
        mean_difference_before,
        mean_difference_after,
        adjusted_scores,
    })
}
