//! Statistical building blocks for the fairrank pipeline.
//!
//! This crate is free of any evaluation-domain types. It provides:
//!
//! - **Descriptive statistics**: count, mean, median, sample variance, quartiles
//! - **Percentiles**: linear-interpolated percentiles over sorted data
//! - **Student-t distribution**: two-tailed tail probabilities for real degrees of freedom
//! - **Welch's t-test**: unequal-variance two-sample mean comparison
//! - **Effect size**: Cohen's d with pooled standard deviation
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Percentile computation
//! - [`distribution`]: Student-t tail probabilities and the special functions behind them
//! - [`ttest`]: Welch's two-sample t-test
//! - [`effect_size`]: Standardized mean differences
//! - [`serde_float`]: JSON-safe encoding of infinite statistics
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use fairrank_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert_eq!(stats.median, 3.0);
//! ```
//!
//! ## Comparing two samples
//!
//! ```
//! use fairrank_stats::ttest::WelchTTest;
//!
//! let a = [6.0, 7.0, 7.0, 8.0];
//! let b = [8.0, 9.0, 9.0, 10.0];
//! let test = WelchTTest::new(&a, &b).unwrap();
//! assert!(test.t_statistic < 0.0);
//! assert!(test.is_significant(0.05));
//! ```

pub mod descriptive;
pub mod distribution;
pub mod effect_size;
pub mod percentiles;
pub mod serde_float;
pub mod ttest;
