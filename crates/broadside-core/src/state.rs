//! Snapshot views: the low-rate state trace exposed to replay and captains.
//!
//! This is the serialization boundary for downstream consumers; views are
//! flattened, self-contained, and carry no internal references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{ProjectileId, ShipId, Vec3};

/// One sampled frame of the battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub tick: u64,
    pub time_s: f64,
    pub ships: Vec<ShipView>,
    pub projectiles: Vec<ProjectileView>,
}

/// Remaining armor per zone (cm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmorView {
    pub nose: f64,
    pub lateral: f64,
    pub tail: f64,
}

/// Weapon summary for a ship view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponView {
    pub label: String,
    pub kind: WeaponKind,
    pub status: WeaponStatus,
    pub magazine: u32,
    pub cooldown_remaining_s: f64,
    pub range_m: f64,
}

/// Per-ship fields for replay and decision makers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipView {
    pub id: ShipId,
    pub name: String,
    pub class: String,
    pub side: Side,
    pub status: ShipStatus,
    pub position: Vec3,
    pub velocity: Vec3,
    pub forward: Vec3,
    /// Structural integrity (%).
    pub hull_percent: f64,
    pub armor: ArmorView,
    /// Module name → health (%).
    pub modules: BTreeMap<String, f64>,
    pub heat_percent: f64,
    pub mass_kg: f64,
    pub propellant_kg: f64,
    pub radiators_extended: bool,
    pub weapons: Vec<WeaponView>,
}

/// In-flight projectile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: ProjectileId,
    pub kind: ProjectileKind,
    pub source: ShipId,
    pub target: Option<ShipId>,
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass_kg: f64,
    /// Torpedoes only.
    pub condition: Option<TorpedoCondition>,
    pub fuel_fraction: Option<f64>,
}

impl BattleSnapshot {
    pub fn ship(&self, id: ShipId) -> Option<&ShipView> {
        self.ships.iter().find(|s| s.id == id)
    }
}
