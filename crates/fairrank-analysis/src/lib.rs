//! Detection and mitigation of group-based rating bias
//!
//! This crate turns one evaluation period's raw scores into a bias-adjusted
//! ranking of individuals.
//!
//! # Overview
//!
//! Four components form a linear pipeline; data only flows downstream:
//!
//! ```text
//! raw scores ─► outlier filter ─► bias detector ─► bias corrector ─► ranking engine
//!                 (outlier)          (bias)          (correction)       (ranking)
//! ```
//!
//! 1. **Outlier Filter** ([`outlier`]): removes values more than a threshold
//!    of standard deviations from the sample mean
//! 2. **Bias Detector** ([`bias`]): compares two groups' score distributions
//!    with Welch's t-test and a practical-size threshold
//! 3. **Bias Corrector** ([`correction`]): shifts each group toward a common
//!    target mean, keeping order and spread within the group
//! 4. **Ranking Engine** ([`ranking`]): combines corrected scores of several
//!    sources with weights and sorts them into a dense ranking
//!
//! [`pipeline::Pipeline`] runs all four stages for every evaluation source of
//! an [`model::EvaluationBatch`], configured by [`config::PipelineConfig`].
//! [`export`] flattens the resulting report into tables.
//!
//! # Design Properties
//!
//! - **Pure**: every stage returns a fresh result and never mutates its input
//! - **No partial results**: a stage either succeeds or returns an
//!   [`error::AnalysisError`]
//! - **Missing is not zero**: absent scores are skipped, and ranking weights
//!   are renormalized over the components an individual has
//!
//! # Examples
//!
//! ```
//! use fairrank_analysis::{bias, correction, model::{Group, PersonId}, outlier};
//!
//! let people = [
//!     ("F1", Group::Female, 6.0), ("F2", Group::Female, 7.0),
//!     ("F3", Group::Female, 7.0), ("F4", Group::Female, 8.0),
//!     ("M1", Group::Male, 8.0), ("M2", Group::Male, 9.0),
//!     ("M3", Group::Male, 9.0), ("M4", Group::Male, 10.0),
//! ];
//! let values = people.iter().map(|(_, _, s)| *s).collect::<Vec<_>>();
//! let report = outlier::detect(&values, outlier::DEFAULT_THRESHOLD)?;
//! assert!(report.outlier_indices.is_empty());
//!
//! let scores = people.iter().map(|(id, _, s)| (PersonId::new(*id), *s)).collect();
//! let groups = people.iter().map(|(id, g, _)| (PersonId::new(*id), *g)).collect();
//!
//! let analysis = bias::analyze(
//!     &bias::partition_by_group(&scores, &groups)?,
//!     bias::DEFAULT_BIAS_THRESHOLD,
//!     bias::DEFAULT_ALPHA,
//! )?;
//! assert!(analysis.bias_detected);
//!
//! let corrected = correction::apply(&scores, &groups, 1.0)?;
//! let after = bias::analyze(
//!     &bias::partition_by_group(&corrected.adjusted_scores, &groups)?,
//!     bias::DEFAULT_BIAS_THRESHOLD,
//!     bias::DEFAULT_ALPHA,
//! )?;
//! assert!(!after.bias_detected);
//! # Ok::<(), fairrank_analysis::error::AnalysisError>(())
//! ```

pub mod bias;
pub mod config;
pub mod correction;
pub mod error;
pub mod export;
pub mod model;
pub mod outlier;
pub mod pipeline;
pub mod ranking;
pub mod sample;
