//! Battle setup: which ships start where.

use serde::{Deserialize, Serialize};

use crate::config::BattleConfig;
use crate::enums::Side;
use crate::error::{CombatError, Result};
use crate::types::Vec3;

/// Initial placement of one ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipPlacement {
    pub name: String,
    /// Ship class name in the catalog.
    pub class: String,
    pub side: Side,
    pub position: Vec3,
    #[serde(default)]
    pub velocity: Vec3,
    /// Initial nose direction; defaults to facing the enemy centroid.
    #[serde(default)]
    pub facing: Option<Vec3>,
}

/// All ships of a battle, in id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleSetup {
    pub ships: Vec<ShipPlacement>,
}

impl BattleSetup {
    /// Both sides must field at least one ship.
    pub fn validate(&self) -> Result<()> {
        for side in Side::ALL {
            if !self.ships.iter().any(|s| s.side == side) {
                return Err(CombatError::InvalidSetup(format!(
                    "side {side:?} has no ships"
                )));
            }
        }
        for ship in &self.ships {
            if !(ship.position.is_finite() && ship.velocity.is_finite()) {
                return Err(CombatError::InvalidSetup(format!(
                    "ship '{}' has a non-finite starting state",
                    ship.name
                )));
            }
        }
        Ok(())
    }
}

/// A named, self-contained battle description (scenario file format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub config: BattleConfig,
    pub setup: BattleSetup,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(json).map_err(|source| CombatError::Parse {
            what: "scenario",
            source,
        })?;
        scenario.config.validate()?;
        scenario.setup.validate()?;
        Ok(scenario)
    }
}
