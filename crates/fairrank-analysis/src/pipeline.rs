//! End-to-end pipeline over one evaluation period
//!
//! For every positively weighted source in the configured criteria that has
//! at least one score in the batch:
//!
//! 1. **Filter**: build the source's [`ScoreSample`] (absent scores are
//!    skipped) and remove z-score outliers.
//! 2. **Detect**: restrict survivors to the two compared groups and analyze
//!    bias before correction.
//! 3. **Correct**: shift the compared groups toward their common mean,
//!    optionally clamp into the configured score range, and analyze bias again.
//!    Individuals of other groups keep their filtered score.
//!
//! The corrected component scores of all sources are then combined with the
//! criteria weights and ranked.
//!
//! Any stage error aborts the run and is reported as
//! [`AnalysisError::Source`] naming the failing source.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    bias::{BiasAnalysis, partition_by_group},
    config::PipelineConfig,
    correction::{self, ReweightingResult},
    error::AnalysisError,
    model::{EvaluationBatch, Group, PersonId},
    outlier::{self, OutlierReport},
    ranking::{self, Ranking},
    sample::ScoreSample,
};

/// Everything computed for one evaluation source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    /// Scores as received, before outlier removal.
    pub sample: ScoreSample,
    pub outliers: OutlierReport,
    pub removed_ids: Vec<PersonId>,
    pub bias_before: BiasAnalysis,
    pub correction: ReweightingResult,
    pub bias_after: BiasAnalysis,
    /// Surviving individuals outside the compared groups, left uncorrected.
    pub passthrough_ids: Vec<PersonId>,
    /// Final component scores fed into the ranking.
    pub corrected_scores: BTreeMap<PersonId, f64>,
}

/// Result of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub period: String,
    pub sources: Vec<SourceReport>,
    pub ranking: Ranking,
}

impl PipelineReport {
    #[must_use]
    pub fn source(&self, name: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.source == name)
    }
}

/// Runs the filter, detect, correct and rank stages with one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processes one evaluation period.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch has duplicate identifiers or any stage
    /// fails for any source.
    ///
    /// # Examples
    ///
    /// ```
    /// use fairrank_analysis::{
    ///     config::PipelineConfig,
    ///     model::{EvaluationBatch, Group, PersonRecord, source},
    ///     pipeline::Pipeline,
    /// };
    ///
    /// let scores = [("F1", Group::Female, 6.0), ("F2", Group::Female, 7.0),
    ///               ("F3", Group::Female, 7.0), ("F4", Group::Female, 8.0),
    ///               ("M1", Group::Male, 8.0), ("M2", Group::Male, 9.0),
    ///               ("M3", Group::Male, 9.0), ("M4", Group::Male, 10.0)];
    /// let batch = EvaluationBatch {
    ///     period: "2024-H1".into(),
    ///     people: scores
    ///         .iter()
    ///         .map(|(id, g, s)| PersonRecord::new(*id, *g).with_score(source::OKR, *s))
    ///         .collect(),
    /// };
    ///
    /// let report = Pipeline::new(PipelineConfig::default())?.run(&batch)?;
    /// let okr = report.source(source::OKR).unwrap();
    /// assert!(okr.bias_before.bias_detected);
    /// assert!(!okr.bias_after.bias_detected);
    /// assert_eq!(report.ranking.len(), 8);
    /// # Ok::<(), fairrank_analysis::error::AnalysisError>(())
    /// ```
    pub fn run(&self, batch: &EvaluationBatch) -> Result<PipelineReport, AnalysisError> {
        batch.validate()?;
        let groups = batch.groups();
        let present = batch.sources();

        let mut sources = Vec::new();
        for name in self.config.criteria.weighted_components() {
            if !present.contains(name) {
                warn!(source = name, "no scores for weighted source, skipped");
                continue;
            }
            let report = self
                .run_source(batch, &groups, name)
                .map_err(AnalysisError::in_source(name))?;
            sources.push(report);
        }
        let ignored = present
            .iter()
            .filter(|name| self.config.criteria.weight(name).is_none_or(|w| w <= 0.0))
            .collect::<Vec<_>>();
        if !ignored.is_empty() {
            debug!(?ignored, "sources without weight are not analyzed");
        }

        let mut components = BTreeMap::<PersonId, BTreeMap<String, f64>>::new();
        for report in &sources {
            for (id, &score) in &report.corrected_scores {
                components
                    .entry(id.clone())
                    .or_default()
                    .insert(report.source.clone(), score);
            }
        }
        let combined = ranking::combine(&components, &self.config.criteria)?;
        let ranking = ranking::rank(&combined);

        info!(
            period = %batch.period,
            people = batch.people.len(),
            sources = sources.len(),
            ranked = ranking.len(),
            "pipeline finished"
        );

        Ok(PipelineReport {
            period: batch.period.clone(),
            sources,
            ranking,
        })
    }

    fn run_source(
        &self,
        batch: &EvaluationBatch,
        groups: &BTreeMap<PersonId, Group>,
        source: &str,
    ) -> Result<SourceReport, AnalysisError> {
        let sample = batch.sample_for(source)?;
        let filtered = outlier::filter(&sample, self.config.outlier_threshold)?;

        let compared_groups = self.config.compared_groups;
        let mut compared = BTreeMap::new();
        let mut passthrough = BTreeMap::new();
        for (id, score) in filtered.sample.iter() {
            let group = groups
                .get(id)
                .ok_or_else(|| AnalysisError::MissingGroup { id: id.clone() })?;
            if compared_groups.contains(group) {
                compared.insert(id.clone(), score);
            } else {
                passthrough.insert(id.clone(), score);
            }
        }
        if !passthrough.is_empty() {
            warn!(
                source,
                count = passthrough.len(),
                "individuals outside the compared groups are left uncorrected"
            );
        }

        let detector = self.config.detector()?;
        let bias_before = detector.analyze(&self.split(&compared, groups)?)?;
        let correction = correction::apply(&compared, groups, self.config.correction_strength)?;

        let mut corrected_scores = correction.adjusted_scores.clone();
        if let Some(range) = &self.config.score_range {
            for score in corrected_scores.values_mut() {
                *score = range.clamp(*score);
            }
        }
        let bias_after = detector.analyze(&self.split(&corrected_scores, groups)?)?;

        info!(
            source,
            scored = sample.len(),
            removed = filtered.removed_ids.len(),
            difference_before = bias_before.mean_difference,
            difference_after = bias_after.mean_difference,
            bias_before = bias_before.bias_detected,
            bias_after = bias_after.bias_detected,
            "source processed"
        );

        let passthrough_ids = passthrough.keys().cloned().collect();
        corrected_scores.extend(passthrough);

        Ok(SourceReport {
            source: source.to_owned(),
            sample,
            outliers: filtered.report,
            removed_ids: filtered.removed_ids,
            bias_before,
            correction,
            bias_after,
            passthrough_ids,
            corrected_scores,
        })
    }

    /// Partitions scores into the two compared groups, keeping an empty
    /// entry for a compared group with no scores.
    fn split(
        &self,
        scores: &BTreeMap<PersonId, f64>,
        groups: &BTreeMap<PersonId, Group>,
    ) -> Result<BTreeMap<Group, Vec<f64>>, AnalysisError> {
        let mut partition = partition_by_group(scores, groups)?;
        for group in self.config.compared_groups {
            partition.entry(group).or_default();
        }
        let compared = self.config.compared_groups.into_iter().collect::<BTreeSet<_>>();
        partition.retain(|group, _| compared.contains(group));
        Ok(partition)
    }
}
