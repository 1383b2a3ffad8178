//! The battle loop: collect orders, run a checkpoint, repeat.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use broadside_core::catalog::Catalog;
use broadside_core::components::ShipState;
use broadside_core::enums::{BattleOutcome, Side};
use broadside_core::events::CombatEvent;
use broadside_core::setup::Scenario;
use broadside_core::state::BattleSnapshot;
use broadside_core::types::ShipId;
use broadside_sim::{scenario, BattleEngine};

use crate::captain::Captain;
use crate::collect::{collect_orders, Seat};
use crate::config::RunnerConfig;
use crate::error::{Result, RunnerError};

/// A ship as it started the battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: ShipId,
    pub name: String,
    pub class: String,
    pub side: Side,
}

/// Everything needed to replay and score a finished battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRecord {
    pub scenario: String,
    pub seed: u64,
    pub roster: Vec<RosterEntry>,
    /// `None` when the runner stopped at `max_checkpoints` first.
    pub outcome: Option<BattleOutcome>,
    pub checkpoints: u32,
    pub elapsed_s: f64,
    pub events: Vec<CombatEvent>,
    pub snapshots: Vec<BattleSnapshot>,
}

impl BattleRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?).map_err(|source| RunnerError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Resolve a built-in scenario name or a scenario JSON file.
pub fn load_scenario(name_or_path: &str) -> Result<Scenario> {
    if let Some(scenario) = scenario::by_name(name_or_path) {
        return Ok(scenario);
    }
    let path = Path::new(name_or_path);
    if !path.is_file() {
        return Err(RunnerError::UnknownScenario(name_or_path.to_string()));
    }
    let json = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Scenario::from_json_str(&json)?)
}

/// Start an engine for `scenario` on the standard catalog with `seed`.
pub fn start_engine(scenario: &Scenario, seed: u64) -> Result<BattleEngine> {
    let mut config = scenario.config.clone();
    config.seed = seed;
    Ok(BattleEngine::new(
        Arc::new(Catalog::standard()),
        config,
        scenario.setup.clone(),
    )?)
}

/// One seat per ship, captains made by `make`.
pub fn seat_all<C: Captain + 'static>(
    engine: &BattleEngine,
    mut make: impl FnMut(&ShipState) -> C,
) -> Vec<Seat> {
    engine
        .ships()
        .iter()
        .map(|ship| Seat::new(ship.id, make(ship)))
        .collect()
}

/// Drive `engine` to an outcome or to `config.max_checkpoints`.
pub async fn run_battle(
    scenario: &str,
    mut engine: BattleEngine,
    seats: &mut [Seat],
    config: &RunnerConfig,
) -> Result<BattleRecord> {
    let seed = engine.config().seed;
    let roster = engine
        .ships()
        .iter()
        .map(|s| RosterEntry {
            id: s.id,
            name: s.name.clone(),
            class: s.class.clone(),
            side: s.side,
        })
        .collect();
    let mut seen = 0u64;
    tracing::info!(scenario, seed, ships = engine.ships().len(), "battle start");

    while engine.outcome().is_none() && engine.checkpoint() < config.max_checkpoints {
        let snapshot = Arc::new(engine.snapshot());
        let events: Arc<[CombatEvent]> = engine.events_since(seen).into();
        seen = engine.events().len() as u64;

        let checkpoint = engine.checkpoint() + 1;
        let orders = collect_orders(
            seats,
            checkpoint,
            snapshot,
            events,
            config.order_timeout(),
        )
        .await;
        for (ship, set) in orders {
            engine.submit_orders(ship, set)?;
        }

        let report = engine.run_checkpoint()?;
        tracing::debug!(
            checkpoint = report.checkpoint,
            ticks = report.ticks_run,
            events = report.events_appended,
            "checkpoint done"
        );
    }

    let outcome = engine.outcome();
    match outcome {
        Some(outcome) => tracing::info!(scenario, seed, ?outcome, "battle over"),
        None => tracing::warn!(
            scenario,
            seed,
            checkpoints = engine.checkpoint(),
            "checkpoint cap reached without an outcome"
        ),
    }

    Ok(BattleRecord {
        scenario: scenario.to_string(),
        seed,
        roster,
        outcome,
        checkpoints: engine.checkpoint(),
        elapsed_s: engine.time().elapsed_secs,
        events: engine.events().to_vec(),
        snapshots: if config.record_snapshots {
            engine.snapshots().to_vec()
        } else {
            Vec::new()
        },
    })
}
