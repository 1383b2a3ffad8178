//! Built-in scenarios.
//!
//! Each scenario is a complete battle description over the standard
//! catalog: tuning plus starting placements.

use broadside_core::config::BattleConfig;
use broadside_core::enums::Side;
use broadside_core::setup::{BattleSetup, Scenario, ShipPlacement};
use broadside_core::types::Vec3;

/// Names accepted by [`by_name`].
pub const SCENARIOS: [&str; 3] = ["duel", "skirmish", "torpedo_run"];

/// Look up a built-in scenario.
pub fn by_name(name: &str) -> Option<Scenario> {
    match name {
        "duel" => Some(duel()),
        "skirmish" => Some(skirmish()),
        "torpedo_run" => Some(torpedo_run()),
        _ => None,
    }
}

fn ship(name: &str, class: &str, side: Side, position: Vec3, velocity: Vec3) -> ShipPlacement {
    ShipPlacement {
        name: name.to_string(),
        class: class.to_string(),
        side,
        position,
        velocity,
        facing: None,
    }
}

/// Duel: two destroyers 150 km apart, closing at 1 km/s.
pub fn duel() -> Scenario {
    Scenario {
        name: "duel".to_string(),
        config: BattleConfig::default(),
        setup: BattleSetup {
            ships: vec![
                ship(
                    "Resolute",
                    "destroyer",
                    Side::Alpha,
                    Vec3::ZERO,
                    Vec3::new(500.0, 0.0, 0.0),
                ),
                ship(
                    "Vigilant",
                    "destroyer",
                    Side::Beta,
                    Vec3::new(150_000.0, 0.0, 0.0),
                    Vec3::new(-500.0, 0.0, 0.0),
                ),
            ],
        },
    }
}

/// Skirmish: a cruiser and a corvette against two destroyers, offset so
/// that nobody starts nose-on.
pub fn skirmish() -> Scenario {
    Scenario {
        name: "skirmish".to_string(),
        config: BattleConfig {
            time_limit_s: 1200.0,
            ..BattleConfig::default()
        },
        setup: BattleSetup {
            ships: vec![
                ship(
                    "Dauntless",
                    "cruiser",
                    Side::Alpha,
                    Vec3::ZERO,
                    Vec3::new(300.0, 0.0, 0.0),
                ),
                ship(
                    "Swift",
                    "corvette",
                    Side::Alpha,
                    Vec3::new(0.0, 20_000.0, 5_000.0),
                    Vec3::new(400.0, 0.0, 0.0),
                ),
                ship(
                    "Harrier",
                    "destroyer",
                    Side::Beta,
                    Vec3::new(180_000.0, 30_000.0, 0.0),
                    Vec3::new(-400.0, 0.0, 0.0),
                ),
                ship(
                    "Talon",
                    "destroyer",
                    Side::Beta,
                    Vec3::new(180_000.0, -30_000.0, 0.0),
                    Vec3::new(-400.0, 0.0, 0.0),
                ),
            ],
        },
    }
}

/// Torpedo run: a destroyer engages a cruiser from beyond gun range.
pub fn torpedo_run() -> Scenario {
    Scenario {
        name: "torpedo_run".to_string(),
        config: BattleConfig {
            time_limit_s: 900.0,
            ..BattleConfig::default()
        },
        setup: BattleSetup {
            ships: vec![
                ship(
                    "Lancer",
                    "destroyer",
                    Side::Alpha,
                    Vec3::ZERO,
                    Vec3::ZERO,
                ),
                ship(
                    "Bastion",
                    "cruiser",
                    Side::Beta,
                    Vec3::new(600_000.0, 50_000.0, 0.0),
                    Vec3::new(-200.0, 0.0, 0.0),
                ),
            ],
        },
    }
}
