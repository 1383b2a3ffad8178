//! Tournament batches.
//!
//! Battles share nothing, so a batch runs them in parallel with rayon, each
//! on its own single-threaded tokio runtime. Inside a battle everything
//! stays sequential.

use std::collections::BTreeSet;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use broadside_core::enums::{BattleOutcome, Side};
use broadside_core::events::EventPayload;
use broadside_core::setup::Scenario;
use broadside_core::types::ShipId;

use crate::battle::{run_battle, seat_all, start_engine, BattleRecord};
use crate::captain::DoctrineCaptain;
use crate::config::RunnerConfig;
use crate::error::{Result, RunnerError};

/// Scoring line for one battle of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSummary {
    pub seed: u64,
    pub outcome: Option<BattleOutcome>,
    pub winner: Option<Side>,
    pub checkpoints: u32,
    pub elapsed_s: f64,
    pub events: usize,
    pub alpha_losses: u32,
    pub beta_losses: u32,
}

impl BattleSummary {
    pub fn from_record(record: &BattleRecord) -> Self {
        let lost: BTreeSet<ShipId> = record
            .events
            .iter()
            .filter(|e| {
                matches!(
                    e.payload,
                    EventPayload::ShipDestroyed { .. } | EventPayload::ShipDisabled { .. }
                )
            })
            .filter_map(|e| e.target_ship())
            .collect();
        let losses = |side: Side| {
            record
                .roster
                .iter()
                .filter(|r| r.side == side && lost.contains(&r.id))
                .count() as u32
        };
        Self {
            seed: record.seed,
            outcome: record.outcome,
            winner: record.outcome.and_then(|o| o.winner()),
            checkpoints: record.checkpoints,
            elapsed_s: record.elapsed_s,
            events: record.events.len(),
            alpha_losses: losses(Side::Alpha),
            beta_losses: losses(Side::Beta),
        }
    }
}

/// Win/draw counts over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentTally {
    pub battles: usize,
    pub alpha_wins: usize,
    pub beta_wins: usize,
    pub draws: usize,
    pub unfinished: usize,
}

impl TournamentTally {
    pub fn from_summaries(summaries: &[BattleSummary]) -> Self {
        let mut tally = Self {
            battles: summaries.len(),
            ..Self::default()
        };
        for summary in summaries {
            match (summary.outcome, summary.winner) {
                (None, _) => tally.unfinished += 1,
                (Some(_), Some(Side::Alpha)) => tally.alpha_wins += 1,
                (Some(_), Some(Side::Beta)) => tally.beta_wins += 1,
                (Some(_), None) => tally.draws += 1,
            }
        }
        tally
    }
}

fn run_one(scenario: &Scenario, seed: u64, config: &RunnerConfig) -> Result<BattleSummary> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(RunnerError::Runtime)?;
    let engine = start_engine(scenario, seed)?;
    let mut seats = seat_all(&engine, |_| DoctrineCaptain);
    let record = runtime.block_on(run_battle(&scenario.name, engine, &mut seats, config))?;
    Ok(BattleSummary::from_record(&record))
}

/// Run one battle per seed with doctrine captains on every ship.
///
/// `threads == 0` uses rayon's default pool size. Results come back sorted
/// by seed.
pub fn run_tournament(
    scenario: &Scenario,
    seeds: &[u64],
    threads: usize,
    config: &RunnerConfig,
) -> Result<Vec<BattleSummary>> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let config = RunnerConfig {
        record_snapshots: false,
        ..config.clone()
    };
    let started = Instant::now();

    let mut summaries = pool.install(|| {
        seeds
            .par_iter()
            .map(|&seed| run_one(scenario, seed, &config))
            .collect::<Result<Vec<_>>>()
    })?;
    summaries.sort_by_key(|s| s.seed);

    let tally = TournamentTally::from_summaries(&summaries);
    tracing::info!(
        scenario = %scenario.name,
        battles = tally.battles,
        alpha_wins = tally.alpha_wins,
        beta_wins = tally.beta_wins,
        draws = tally.draws,
        secs = started.elapsed().as_secs_f64(),
        "tournament complete"
    );
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::load_scenario;

    fn short() -> RunnerConfig {
        RunnerConfig {
            max_checkpoints: 2,
            ..RunnerConfig::default()
        }
    }

    #[test]
    fn test_tournament_sorted_and_reproducible() {
        let scenario = load_scenario("duel").unwrap();
        let first = run_tournament(&scenario, &[3, 1, 2], 2, &short()).unwrap();
        let seeds: Vec<u64> = first.iter().map(|s| s.seed).collect();
        assert_eq!(seeds, vec![1, 2, 3]);

        let second = run_tournament(&scenario, &[2, 3, 1], 3, &short()).unwrap();
        assert_eq!(first, second, "Same seeds, same battles, any thread count");
    }

    #[test]
    fn test_tally_counts_outcomes() {
        let summary = |outcome: Option<BattleOutcome>| BattleSummary {
            seed: 0,
            outcome,
            winner: outcome.and_then(|o| o.winner()),
            checkpoints: 1,
            elapsed_s: 30.0,
            events: 0,
            alpha_losses: 0,
            beta_losses: 0,
        };
        let tally = TournamentTally::from_summaries(&[
            summary(Some(BattleOutcome::Surrender {
                surrendered: Side::Beta,
            })),
            summary(Some(BattleOutcome::MutualDraw)),
            summary(Some(BattleOutcome::FleetEliminated {
                winner: Some(Side::Beta),
            })),
            summary(None),
        ]);
        assert_eq!(tally.battles, 4);
        assert_eq!(tally.alpha_wins, 1);
        assert_eq!(tally.beta_wins, 1);
        assert_eq!(tally.draws, 1);
        assert_eq!(tally.unfinished, 1);
    }
}
