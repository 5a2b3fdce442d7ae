use anyhow::{Result, ensure};
use serde::Serialize;
use std::collections::BTreeMap;

use mandate_game::numbers::ratio;
use mandate_game::{Stat, StatTable, StatVector};

use super::policy::GameplayStrategy;
use super::seeds::SeedInfo;
use super::simulation::{GameTester, SimulationPlan};

/// Outcome of one analysed run.
#[derive(Debug, Clone, Serialize)]
pub struct PlayabilityRecord {
    pub strategy: GameplayStrategy,
    pub seed_code: String,
    pub seed_value: u64,
    pub final_stats: StatVector,
    pub ending_bands: StatTable<usize>,
    pub bonus_triggered: bool,
    pub bonus_shown: bool,
}

/// Per-strategy aggregate over many runs.
#[derive(Debug, Clone, Serialize)]
pub struct PlayabilityAggregate {
    pub strategy: GameplayStrategy,
    pub iterations: usize,
    pub mean_approval: f64,
    pub std_approval: f64,
    /// Share of runs landing in each ending band, per stat.
    pub band_distribution: StatTable<Vec<f64>>,
    pub bonus_trigger_rate: f64,
    pub bonus_shown_rate: f64,
    /// Share of triggered runs that went on to show the bonus background.
    pub bonus_conversion_rate: f64,
}

/// Play every strategy over every seed `iterations` times.
///
/// # Errors
///
/// Returns an error if a run cannot be created or halts early.
pub fn run_playability_analysis(
    tester: &GameTester,
    seeds: &[SeedInfo],
    iterations: usize,
) -> Result<Vec<PlayabilityRecord>> {
    let iterations = iterations.max(1);
    let mut records =
        Vec::with_capacity(seeds.len() * GameplayStrategy::ALL.len() * iterations);

    for strategy in GameplayStrategy::ALL {
        let plan = SimulationPlan::new(strategy);
        for seed in seeds {
            for iteration in 0..iterations {
                let iteration_offset = u64::try_from(iteration).unwrap_or(0);
                let seed_value = seed.seed.wrapping_add(iteration_offset);
                let summary = tester.run_plan(&plan, seed_value)?;
                if let Some(err) = &summary.halted {
                    anyhow::bail!("{strategy} run for seed {seed_value} halted: {err}");
                }
                records.push(PlayabilityRecord {
                    strategy,
                    seed_code: summary.result.replay_token(),
                    seed_value,
                    final_stats: summary.result.final_stats,
                    ending_bands: summary.result.ending_bands,
                    bonus_triggered: summary.result.bonus_triggered,
                    bonus_shown: summary.result.bonus_shown,
                });
            }
        }
    }

    log::info!("playability analysis collected {} runs", records.len());
    Ok(records)
}

#[must_use]
pub fn aggregate_playability(
    records: &[PlayabilityRecord],
    band_counts: StatTable<usize>,
) -> Vec<PlayabilityAggregate> {
    let mut builders: BTreeMap<GameplayStrategy, AggregateBuilder> = BTreeMap::new();
    for record in records {
        builders
            .entry(record.strategy)
            .or_insert_with(|| AggregateBuilder::new(record.strategy, band_counts))
            .ingest(record);
    }
    builders
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

/// Invariants that must hold across the whole analysis.
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn validate_playability_targets(
    aggregates: &[PlayabilityAggregate],
    records: &[PlayabilityRecord],
) -> Result<()> {
    for record in records {
        ensure!(
            record.bonus_triggered || !record.bonus_shown,
            "{} seed {} showed the bonus without triggering it",
            record.strategy,
            record.seed_code
        );
    }
    for aggregate in aggregates {
        for (stat, shares) in aggregate.band_distribution.iter() {
            let total: f64 = shares.iter().sum();
            ensure!(
                aggregate.iterations == 0 || (total - 1.0).abs() < 1e-9,
                "{} {stat} band shares sum to {total}",
                aggregate.strategy
            );
        }
        ensure!(
            aggregate.bonus_shown_rate <= aggregate.bonus_trigger_rate,
            "{} shows the bonus more often than it triggers",
            aggregate.strategy
        );
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct AggregateBuilder {
    strategy: GameplayStrategy,
    approval: RunningStats,
    bands: StatTable<Vec<usize>>,
    runs: usize,
    bonus_triggered: usize,
    bonus_shown: usize,
}

impl AggregateBuilder {
    fn new(strategy: GameplayStrategy, band_counts: StatTable<usize>) -> Self {
        Self {
            strategy,
            approval: RunningStats::default(),
            bands: band_counts.map(|_, count| vec![0; (*count).max(1)]),
            runs: 0,
            bonus_triggered: 0,
            bonus_shown: 0,
        }
    }

    fn ingest(&mut self, record: &PlayabilityRecord) {
        self.runs += 1;
        self.approval.add(f64::from(record.final_stats.approval()));
        for stat in Stat::ORDER {
            let band = *record.ending_bands.get(stat);
            let slots = match stat {
                Stat::Approval => &mut self.bands.approval,
                Stat::Efficiency => &mut self.bands.efficiency,
                Stat::Environment => &mut self.bands.environment,
                Stat::Finance => &mut self.bands.finance,
            };
            if let Some(slot) = slots.get_mut(band) {
                *slot += 1;
            }
        }
        self.bonus_triggered += usize::from(record.bonus_triggered);
        self.bonus_shown += usize::from(record.bonus_shown);
    }

    fn finish(self) -> PlayabilityAggregate {
        let runs = self.runs;
        PlayabilityAggregate {
            strategy: self.strategy,
            iterations: runs,
            mean_approval: self.approval.mean(),
            std_approval: self.approval.std_dev(),
            band_distribution: self
                .bands
                .map(|_, counts| counts.iter().map(|count| ratio(*count, runs)).collect()),
            bonus_trigger_rate: ratio(self.bonus_triggered, runs),
            bonus_shown_rate: ratio(self.bonus_shown, runs),
            bonus_conversion_rate: ratio(self.bonus_shown, self.bonus_triggered),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn std_dev(&self) -> f64 {
        if self.count > 1 {
            (self.m2 / f64::from(self.count - 1)).sqrt()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::TesterAssets;
    use mandate_game::RunConfig;
    use std::sync::Arc;

    fn record(strategy: GameplayStrategy, approval_band: usize, shown: bool) -> PlayabilityRecord {
        PlayabilityRecord {
            strategy,
            seed_code: "MN-HARBOR42".to_string(),
            seed_value: 42,
            final_stats: StatVector::from_parts(60, 45, 53),
            ending_bands: StatTable {
                approval: approval_band,
                ..StatTable::uniform(1)
            },
            bonus_triggered: true,
            bonus_shown: shown,
        }
    }

    #[test]
    fn aggregates_band_shares_and_bonus_rates() {
        let records = vec![
            record(GameplayStrategy::Green, 0, false),
            record(GameplayStrategy::Green, 2, true),
            record(GameplayStrategy::Green, 2, false),
            record(GameplayStrategy::Growth, 1, false),
        ];
        let aggregates = aggregate_playability(&records, StatTable::uniform(3));
        assert_eq!(aggregates.len(), 2);
        let green = aggregates
            .iter()
            .find(|a| a.strategy == GameplayStrategy::Green)
            .unwrap();
        assert_eq!(green.iterations, 3);
        assert!((green.band_distribution.approval[2] - 2.0 / 3.0).abs() < 1e-9);
        assert!((green.bonus_conversion_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((green.mean_approval - 52.0).abs() < 1e-9);
        assert!(green.std_approval.abs() < 1e-9);
        validate_playability_targets(&aggregates, &records).unwrap();
    }

    #[test]
    fn bonus_without_trigger_is_rejected() {
        let mut bad = record(GameplayStrategy::Random, 0, true);
        bad.bonus_triggered = false;
        assert!(validate_playability_targets(&[], &[bad]).is_err());
    }

    #[test]
    fn analysis_covers_every_strategy() {
        let assets = Arc::new(TesterAssets::load_default().unwrap());
        let tester = GameTester::new(assets, RunConfig::default(), false);
        let records =
            run_playability_analysis(&tester, &[SeedInfo::from_numeric(3)], 2).unwrap();
        assert_eq!(records.len(), GameplayStrategy::ALL.len() * 2);
        let aggregates = aggregate_playability(&records, StatTable::uniform(3));
        assert_eq!(aggregates.len(), GameplayStrategy::ALL.len());
        validate_playability_targets(&aggregates, &records).unwrap();
    }
}
