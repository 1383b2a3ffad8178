//! Victory check: surrender, agreed draw, fleet elimination and time limit.

use std::collections::BTreeSet;

use broadside_core::components::ShipState;
use broadside_core::config::BattleConfig;
use broadside_core::constants::{SCORE_HULL_WEIGHT, SCORE_RATIO_WEIGHT};
use broadside_core::enums::{BattleOutcome, ShipStatus, Side};

/// Tactical-advantage score used when the clock runs out.
///
/// Destroyed ships count with zero hull.
pub fn side_score(ships: &[ShipState], side: Side) -> f64 {
    let fleet: Vec<&ShipState> = ships.iter().filter(|s| s.side == side).collect();
    if fleet.is_empty() {
        return 0.0;
    }
    let dealt: f64 = fleet.iter().map(|s| s.tally.dealt_hp).sum();
    let taken: f64 = fleet.iter().map(|s| s.tally.taken_hp).sum();
    let ratio = dealt / taken.max(1.0);
    let hull_percent = fleet
        .iter()
        .map(|s| {
            if s.status == ShipStatus::Destroyed {
                0.0
            } else {
                s.structure.fraction() * 100.0
            }
        })
        .sum::<f64>()
        / fleet.len() as f64;
    ratio * SCORE_RATIO_WEIGHT + hull_percent * SCORE_HULL_WEIGHT
}

/// Decide whether the battle is over.
///
/// Checked in order: surrender, agreed draw, elimination, time limit.
pub fn evaluate(
    ships: &[ShipState],
    surrendered: &BTreeSet<Side>,
    draw_offers: &BTreeSet<Side>,
    elapsed_s: f64,
    config: &BattleConfig,
) -> Option<BattleOutcome> {
    match surrendered.len() {
        0 => {}
        1 => {
            let side = *surrendered.iter().next()?;
            return Some(BattleOutcome::Surrender { surrendered: side });
        }
        _ => return Some(BattleOutcome::MutualDraw),
    }

    if Side::ALL.iter().all(|side| draw_offers.contains(side)) {
        return Some(BattleOutcome::MutualDraw);
    }

    let fighting = |side: Side| {
        ships
            .iter()
            .any(|s| s.side == side && s.status == ShipStatus::Active)
    };
    match (fighting(Side::Alpha), fighting(Side::Beta)) {
        (true, true) => {}
        (true, false) => {
            return Some(BattleOutcome::FleetEliminated {
                winner: Some(Side::Alpha),
            })
        }
        (false, true) => {
            return Some(BattleOutcome::FleetEliminated {
                winner: Some(Side::Beta),
            })
        }
        (false, false) => return Some(BattleOutcome::FleetEliminated { winner: None }),
    }

    if elapsed_s + 1e-9 >= config.time_limit_s {
        let alpha_score = side_score(ships, Side::Alpha);
        let beta_score = side_score(ships, Side::Beta);
        let winner = if (alpha_score - beta_score).abs() < config.draw_score_margin {
            None
        } else if alpha_score > beta_score {
            Some(Side::Alpha)
        } else {
            Some(Side::Beta)
        };
        return Some(BattleOutcome::TimeLimitReached {
            winner,
            alpha_score,
            beta_score,
        });
    }
    None
}
