//! Flat tabular views of a [`PipelineReport`]
//!
//! Report consumers (spreadsheets, dashboards, charting) want one row per
//! individual, group or ranking entry rather than the nested report. Each
//! row type serializes to a flat record, suitable for CSV.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    bias::BiasAnalysis,
    model::{Group, PersonId},
    pipeline::{PipelineReport, SourceReport},
};

/// One raw score and its outlier verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierRow {
    pub period: String,
    pub source: String,
    pub id: PersonId,
    pub group: Option<Group>,
    pub score: f64,
    pub z_score: f64,
    pub is_outlier: bool,
}

/// Statistics of one group at one stage of one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiasRow {
    pub period: String,
    pub source: String,
    /// `before` or `after` correction.
    pub stage: &'static str,
    pub group: Group,
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    pub mean_difference: f64,
    #[serde(serialize_with = "fairrank_stats::serde_float::serialize")]
    pub t_statistic: f64,
    pub p_value: f64,
    pub effect_size: f64,
    pub bias_detected: bool,
}

/// Filtered and final component score of one individual.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustmentRow {
    pub period: String,
    pub source: String,
    pub id: PersonId,
    pub group: Option<Group>,
    pub filtered_score: f64,
    pub corrected_score: f64,
    pub shift: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub period: String,
    pub position: usize,
    pub id: PersonId,
    pub group: Option<Group>,
    pub combined_score: f64,
    /// `name=score` pairs joined with `;`.
    pub components: String,
}

/// All flat tables of one report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportTables {
    pub outliers: Vec<OutlierRow>,
    pub bias: Vec<BiasRow>,
    pub adjustments: Vec<AdjustmentRow>,
    pub ranking: Vec<RankingRow>,
}

impl ReportTables {
    /// Flattens `report`, looking individuals' groups up in `groups`.
    #[must_use]
    pub fn new(report: &PipelineReport, groups: &BTreeMap<PersonId, Group>) -> Self {
        let mut tables = Self::default();
        for source in &report.sources {
            tables
                .outliers
                .extend(outlier_rows(&report.period, source, groups));
            tables.bias.extend(bias_rows(
                &report.period,
                &source.source,
                "before",
                &source.bias_before,
            ));
            tables.bias.extend(bias_rows(
                &report.period,
                &source.source,
                "after",
                &source.bias_after,
            ));
            tables
                .adjustments
                .extend(adjustment_rows(&report.period, source, groups));
        }
        tables.ranking = report
            .ranking
            .entries
            .iter()
            .map(|entry| RankingRow {
                period: report.period.clone(),
                position: entry.position,
                id: entry.id.clone(),
                group: groups.get(&entry.id).copied(),
                combined_score: entry.combined_score,
                components: format_components(&entry.components),
            })
            .collect();
        tables
    }
}

fn outlier_rows<'a>(
    period: &'a str,
    source: &'a SourceReport,
    groups: &'a BTreeMap<PersonId, Group>,
) -> impl Iterator<Item = OutlierRow> + 'a {
    source
        .sample
        .iter()
        .zip(&source.outliers.z_scores)
        .enumerate()
        .map(move |(i, ((id, score), &z_score))| OutlierRow {
            period: period.to_owned(),
            source: source.source.clone(),
            id: id.clone(),
            group: groups.get(id).copied(),
            score,
            z_score,
            is_outlier: source.outliers.is_outlier(i),
        })
}

fn bias_rows(
    period: &str,
    source: &str,
    stage: &'static str,
    analysis: &BiasAnalysis,
) -> [BiasRow; 2] {
    [&analysis.group_a, &analysis.group_b].map(|g| BiasRow {
        period: period.to_owned(),
        source: source.to_owned(),
        stage,
        group: g.group,
        count: g.stats.count,
        mean: g.stats.mean,
        std_dev: g.stats.std_dev,
        median: g.stats.median,
        min: g.stats.min,
        max: g.stats.max,
        q1: g.stats.q1,
        q3: g.stats.q3,
        mean_difference: analysis.mean_difference,
        t_statistic: analysis.t_statistic,
        p_value: analysis.p_value,
        effect_size: analysis.effect_size,
        bias_detected: analysis.bias_detected,
    })
}

fn adjustment_rows<'a>(
    period: &'a str,
    source: &'a SourceReport,
    groups: &'a BTreeMap<PersonId, Group>,
) -> impl Iterator<Item = AdjustmentRow> + 'a {
    let raw = source.sample.to_map();
    source
        .corrected_scores
        .iter()
        .filter_map(move |(id, &corrected_score)| {
            let filtered_score = *raw.get(id)?;
            Some(AdjustmentRow {
                period: period.to_owned(),
                source: source.source.clone(),
                id: id.clone(),
                group: groups.get(id).copied(),
                filtered_score,
                corrected_score,
                shift: corrected_score - filtered_score,
            })
        })
}

fn format_components(components: &BTreeMap<String, f64>) -> String {
    components
        .iter()
        .map(|(name, score)| format!("{name}={score:.4}"))
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::PipelineConfig,
        model::{EvaluationBatch, PersonRecord, source},
        pipeline::Pipeline,
    };

    fn report() -> (PipelineReport, BTreeMap<PersonId, Group>) {
        let people = [
            ("F1", Group::Female, 6.0, 5.0),
            ("F2", Group::Female, 7.0, 6.0),
            ("F3", Group::Female, 7.0, 6.5),
            ("F4", Group::Female, 8.0, 7.0),
            ("M1", Group::Male, 8.0, 7.0),
            ("M2", Group::Male, 9.0, 7.5),
            ("M3", Group::Male, 9.0, 8.0),
            ("M4", Group::Male, 10.0, 8.5),
            ("O1", Group::Other, 7.5, 7.0),
        ];
        let batch = EvaluationBatch {
            period: "2024-H1".into(),
            people: people
                .iter()
                .map(|(id, g, c, o)| {
                    PersonRecord::new(*id, *g)
                        .with_score(source::COMPETENCY, *c)
                        .with_score(source::OKR, *o)
                })
                .collect(),
        };
        let report = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(&batch)
            .unwrap();
        (report, batch.groups())
    }

    #[test]
    fn test_row_counts() {
        let (report, groups) = report();
        let tables = ReportTables::new(&report, &groups);
        assert_eq!(tables.outliers.len(), 18);
        assert_eq!(tables.bias.len(), 8);
        assert_eq!(tables.adjustments.len(), 18);
        assert_eq!(tables.ranking.len(), 9);
    }

    #[test]
    fn test_adjustment_rows() {
        let (report, groups) = report();
        let tables = ReportTables::new(&report, &groups);
        let f1 = tables
            .adjustments
            .iter()
            .find(|r| r.source == source::COMPETENCY && r.id.as_str() == "F1")
            .unwrap();
        assert_eq!(f1.filtered_score, 6.0);
        assert_eq!(f1.shift, 1.0);
        let other = tables
            .adjustments
            .iter()
            .find(|r| r.group == Some(Group::Other))
            .unwrap();
        assert_eq!(other.shift, 0.0);
    }

    #[test]
    fn test_bias_rows_have_both_stages() {
        let (report, groups) = report();
        let tables = ReportTables::new(&report, &groups);
        let competency = tables
            .bias
            .iter()
            .filter(|r| r.source == source::COMPETENCY)
            .collect::<Vec<_>>();
        assert_eq!(competency.len(), 4);
        assert!(competency[0].bias_detected);
        assert_eq!(competency[0].stage, "before");
        assert_eq!(competency[0].group, Group::Female);
        assert_eq!(competency[2].stage, "after");
        assert!(!competency[2].bias_detected);
    }

    #[test]
    fn test_components_format() {
        let components = BTreeMap::from([("competency".to_owned(), 7.0), ("okr".to_owned(), 8.25)]);
        assert_eq!(format_components(&components), "competency=7.0000;okr=8.2500");
        assert_eq!(format_components(&BTreeMap::new()), "");
    }
}
