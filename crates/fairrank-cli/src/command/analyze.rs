//! Bias pipeline command
//!
//! Runs outlier filtering, bias detection, correction and ranking over one
//! evaluation batch and writes the full report as JSON. With `--table-dir`,
//! the report is also flattened into CSV tables:
//!
//! - `outliers.csv`: one row per raw score with its z-score
//! - `bias.csv`: group statistics before and after correction
//! - `adjustments.csv`: filtered and corrected score per individual
//! - `ranking.csv`: final ranking

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use fairrank_analysis::{
    config::PipelineConfig,
    export::ReportTables,
    model::EvaluationBatch,
    pipeline::{Pipeline, PipelineReport},
};
use serde::Serialize;
use tracing::{debug, info};

use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct AnalyzeArg {
    /// Path to the evaluation batch JSON file
    #[arg(long)]
    input: PathBuf,
    /// Path to a pipeline configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the correction strength (0.0 to 1.0)
    #[arg(long)]
    strength: Option<f64>,
    /// Override the outlier threshold (standard deviations)
    #[arg(long)]
    outlier_threshold: Option<f64>,
    /// Number of top-ranked individuals to log
    #[arg(long, default_value_t = 10)]
    top: usize,
    /// Output file for the JSON report (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Directory to write CSV tables into
    #[arg(long)]
    table_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct AnalysisOutput<'a> {
    generated_at: DateTime<Utc>,
    config: &'a PipelineConfig,
    #[serde(flatten)]
    report: &'a PipelineReport,
}

pub(crate) fn run(arg: &AnalyzeArg) -> anyhow::Result<()> {
    let config = load_config(arg)?;
    let pipeline = Pipeline::new(config).context("Invalid pipeline configuration")?;
    for (name, weight) in pipeline.config().criteria.iter() {
        debug!(source = name, weight, "criterion weight");
    }

    let batch = util::read_batch_file(&arg.input)?;
    info!(
        input = %arg.input.display(),
        period = %batch.period,
        people = batch.people.len(),
        "loaded evaluation batch"
    );

    let report = pipeline
        .run(&batch)
        .with_context(|| format!("Pipeline failed for period {}", batch.period))?;
    log_report(&report, arg.top);

    if let Some(dir) = &arg.table_dir {
        write_tables(dir, &report, &batch)?;
    }

    let output = AnalysisOutput {
        generated_at: Utc::now(),
        config: pipeline.config(),
        report: &report,
    };
    Output::save_json(&output, arg.output.as_deref())?;
    Ok(())
}

fn load_config(arg: &AnalyzeArg) -> anyhow::Result<PipelineConfig> {
    let mut config = match &arg.config {
        Some(path) => util::read_json_file("pipeline configuration", path)?,
        None => PipelineConfig::default(),
    };
    if let Some(strength) = arg.strength {
        config.correction_strength = strength;
    }
    if let Some(threshold) = arg.outlier_threshold {
        config.outlier_threshold = threshold;
    }
    Ok(config)
}

fn log_report(report: &PipelineReport, top: usize) {
    for source in &report.sources {
        let before = &source.bias_before;
        let after = &source.bias_after;
        info!(
            source = %source.source,
            outliers = source.removed_ids.len(),
            difference = format_args!(
                "{:+.3} -> {:+.3}",
                before.mean_difference, after.mean_difference
            ),
            p_value = format_args!("{:.4} -> {:.4}", before.p_value, after.p_value),
            bias = format_args!("{} -> {}", before.bias_detected, after.bias_detected),
            "bias summary ({} - {})",
            before.group_a.group,
            before.group_b.group
        );
    }

    if let Some(summary) = report.ranking.summary() {
        info!(
            count = summary.count,
            max = summary.max,
            min = summary.min,
            mean = summary.mean,
            "ranking summary"
        );
    }
    for entry in report.ranking.top_n(top) {
        info!(
            position = entry.position,
            id = %entry.id,
            score = format_args!("{:.3}", entry.combined_score),
            "top ranked"
        );
    }
}

fn write_tables(
    dir: &Path,
    report: &PipelineReport,
    batch: &EvaluationBatch,
) -> anyhow::Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create table directory: {}", dir.display()))?;
    let tables = ReportTables::new(report, &batch.groups());
    util::write_csv(&dir.join("outliers.csv"), &tables.outliers)?;
    util::write_csv(&dir.join("bias.csv"), &tables.bias)?;
    util::write_csv(&dir.join("adjustments.csv"), &tables.adjustments)?;
    util::write_csv(&dir.join("ranking.csv"), &tables.ranking)?;
    info!(dir = %dir.display(), "wrote CSV tables");
    Ok(())
}
