//! Synthetic evaluation batch generator
//!
//! Produces a population with a known male-favouring rating shift so that the
//! pipeline has something to detect. Each individual gets a latent ability
//! shared by all sources, so the sources are correlated the way real
//! evaluations are.

use std::path::PathBuf;

use clap::Args;
use fairrank_analysis::model::{EvaluationBatch, Group, PersonRecord, source};
use fairrank_stats::descriptive::DescriptiveStats;
use rand::{Rng, SeedableRng as _};
use rand_distr::{Distribution as _, Normal};
use rand_pcg::Pcg64;
use tracing::{debug, info};

use crate::util::Output;

/// Cumulative group shares: 45% female, 50% male, 3% other, 2% undisclosed.
const GROUP_SHARES: [(Group, f64); 4] = [
    (Group::Female, 0.45),
    (Group::Male, 0.95),
    (Group::Other, 0.98),
    (Group::Undisclosed, 1.0),
];

/// Mean and standard deviation of each source's ratings on the 0-10 scale,
/// in [`source::ALL`] order.
const SOURCE_PROFILES: [(f64, f64); 5] =
    [(6.8, 1.1), (7.0, 0.9), (6.4, 1.4), (6.0, 1.5), (5.8, 1.6)];

const ABILITY_STD: f64 = 0.7;
const MAX_SCORE: f64 = 10.0;

#[derive(Debug, Clone, Args)]
pub(crate) struct GenerateArg {
    /// Number of individuals
    #[arg(long, default_value_t = 200)]
    people: usize,
    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Mean score advantage given to the male group
    #[arg(long, default_value_t = 0.8)]
    bias: f64,
    /// Evaluation period label
    #[arg(long, default_value = "2024-H1")]
    period: String,
    /// Probability that a source did not evaluate an individual
    #[arg(long, default_value_t = 0.1)]
    missing_rate: f64,
    /// Output file path (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &GenerateArg) -> anyhow::Result<()> {
    anyhow::ensure!(arg.people > 0, "--people must be at least 1");
    anyhow::ensure!(arg.bias.is_finite(), "--bias must be finite");
    anyhow::ensure!(
        (0.0..=1.0).contains(&arg.missing_rate),
        "--missing-rate must lie in [0, 1]"
    );

    let mut rng = Pcg64::seed_from_u64(arg.seed);
    let batch = generate_batch(&mut rng, arg)?;
    log_summary(&batch);

    Output::save_json(&batch, arg.output.as_deref())?;
    Ok(())
}

fn generate_batch<R>(rng: &mut R, arg: &GenerateArg) -> anyhow::Result<EvaluationBatch>
where
    R: Rng,
{
    let ability = Normal::new(0.0, ABILITY_STD)?;
    let profiles = source::ALL
        .into_iter()
        .zip(SOURCE_PROFILES)
        .map(|(name, (mean, std))| -> anyhow::Result<_> { Ok((name, Normal::new(mean, std)?)) })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let people = (0..arg.people)
        .map(|i| {
            let group = pick_group(rng);
            let shift = ability.sample(rng) + if group == Group::Male { arg.bias } else { 0.0 };
            let mut record = PersonRecord::new(format!("P{:04}", i + 1), group);
            for (name, dist) in &profiles {
                if rng.random_bool(arg.missing_rate) {
                    record.scores.insert((*name).to_owned(), None);
                    continue;
                }
                let score = (dist.sample(rng) + shift).clamp(0.0, MAX_SCORE);
                record = record.with_score(name, (score * 100.0).round() / 100.0);
            }
            record
        })
        .collect();

    Ok(EvaluationBatch {
        period: arg.period.clone(),
        people,
    })
}

fn pick_group<R>(rng: &mut R) -> Group
where
    R: Rng,
{
    let roll = rng.random_range(0.0..1.0);
    GROUP_SHARES
        .iter()
        .find(|(_, cumulative)| roll < *cumulative)
        .map_or(Group::Undisclosed, |(group, _)| *group)
}

fn log_summary(batch: &EvaluationBatch) {
    let counts = Group::ALL
        .map(|group| (group, batch.people.iter().filter(|p| p.group == group).count()));
    info!(period = %batch.period, people = batch.people.len(), ?counts, "generated batch");

    for name in source::ALL {
        for group in [Group::Female, Group::Male] {
            let scores = batch
                .people
                .iter()
                .filter(|p| p.group == group)
                .filter_map(|p| p.score(name));
            if let Some(stats) = DescriptiveStats::new(scores) {
                debug!(
                    source = name,
                    %group,
                    count = stats.count,
                    mean = stats.mean,
                    std_dev = stats.std_dev,
                    "generated scores"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn arg(people: usize, bias: f64) -> GenerateArg {
        GenerateArg {
            people,
            seed: 1,
            bias,
            period: "test".into(),
            missing_rate: 0.1,
            output: None,
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let arg = arg(50, 0.8);
        let a = generate_batch(&mut Pcg64::seed_from_u64(7), &arg).unwrap();
        let b = generate_batch(&mut Pcg64::seed_from_u64(7), &arg).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.people.len(), 50);
        assert_eq!(a.people[0].id.as_str(), "P0001");
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_scores_stay_on_scale() {
        let batch = generate_batch(&mut Pcg64::seed_from_u64(3), &arg(300, 5.0)).unwrap();
        for person in &batch.people {
            for score in person.scores.values().flatten() {
                assert!((0.0..=MAX_SCORE).contains(score));
            }
        }
    }

    #[test]
    fn test_some_scores_are_missing() {
        let batch = generate_batch(&mut Pcg64::seed_from_u64(5), &arg(300, 0.0)).unwrap();
        let missing = batch
            .people
            .iter()
            .flat_map(|p| p.scores.values())
            .filter(|s| s.is_none())
            .count();
        // ~150 of 1500 expected
        assert!((60..300).contains(&missing), "missing = {missing}");
    }

    #[test]
    fn test_group_shares() {
        let mut rng = Pcg64::seed_from_u64(11);
        let mut counts = BTreeMap::<Group, usize>::new();
        for _ in 0..10_000 {
            *counts.entry(pick_group(&mut rng)).or_default() += 1;
        }
        let expected = [4200..4800, 4700..5300, 150..450, 80..350];
        for (group, range) in Group::ALL.into_iter().zip(expected) {
            assert!(range.contains(&counts[&group]), "{group}: {}", counts[&group]);
        }
    }
}
