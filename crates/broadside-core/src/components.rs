//! Battle state components.
//!
//! Ships live in the orchestrator's arena as `ShipState`; projectiles are
//! hecs entities built from `Projectile` + `Kinematics` (+ `Guidance` for
//! torpedoes). Game logic lives in systems, not here.

use serde::{Deserialize, Serialize};

use crate::catalog::{ArmorMaterial, ModuleSpec};
use crate::enums::*;
use crate::orders::OrderSet;
use crate::types::{ProjectileId, Quat, ShipId, Vec3};

/// Rigid-body state of a ship.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Quat,
    /// World-frame angular velocity (rad/s).
    pub angular_velocity: Vec3,
}

/// Mass budget. Total mass only ever decreases in combat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassState {
    pub dry_kg: f64,
    pub propellant_kg: f64,
    /// Rounds and torpedoes still aboard.
    pub ordnance_kg: f64,
}

impl MassState {
    pub fn total_kg(&self) -> f64 {
        self.dry_kg + self.propellant_kg + self.ordnance_kg
    }
}

/// Drive and attitude limits copied from the class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveLimits {
    pub max_thrust_n: f64,
    pub exhaust_velocity_m_s: f64,
    pub max_rcs_torque_nm: f64,
    pub max_turn_rate_rad_s: f64,
    /// Gimbal half-angle (rad).
    pub pivot_rad: f64,
    pub length_m: f64,
}

/// One armor zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmorZone {
    pub kind: ArmorZoneKind,
    pub thickness_cm: f64,
    pub initial_cm: f64,
}

/// The three armor zones of a ship and their material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorSet {
    pub material: ArmorMaterial,
    pub nose: ArmorZone,
    pub lateral: ArmorZone,
    pub tail: ArmorZone,
}

impl ArmorSet {
    pub fn zone(&self, kind: ArmorZoneKind) -> &ArmorZone {
        match kind {
            ArmorZoneKind::Nose => &self.nose,
            ArmorZoneKind::Lateral => &self.lateral,
            ArmorZoneKind::Tail => &self.tail,
        }
    }

    pub fn zone_mut(&mut self, kind: ArmorZoneKind) -> &mut ArmorZone {
        match kind {
            ArmorZoneKind::Nose => &mut self.nose,
            ArmorZoneKind::Lateral => &mut self.lateral,
            ArmorZoneKind::Tail => &mut self.tail,
        }
    }
}

/// A hull module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub kind: ModuleKind,
    pub max_hp: f64,
    pub hp: f64,
    pub critical: bool,
}

impl Module {
    pub fn destroyed(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn health_fraction(&self) -> f64 {
        if self.max_hp <= 0.0 {
            return 0.0;
        }
        (self.hp / self.max_hp).clamp(0.0, 1.0)
    }
}

/// Direction of travel through the module chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HullDirection {
    /// Toward the tail.
    Aft,
    /// Toward the nose.
    Fore,
}

/// Modules in hull order with explicit adjacency (arena indices).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleGraph {
    pub modules: Vec<Module>,
    /// Neighbour toward the nose.
    pub fore: Vec<Option<usize>>,
    /// Neighbour toward the tail.
    pub aft: Vec<Option<usize>>,
}

impl ModuleGraph {
    /// Build a linear nose-to-tail chain.
    pub fn linear(specs: &[ModuleSpec]) -> Self {
        let modules: Vec<Module> = specs
            .iter()
            .map(|spec| Module {
                name: spec.name.clone(),
                kind: spec.kind,
                max_hp: spec.hp,
                hp: spec.hp,
                critical: spec.critical,
            })
            .collect();
        let n = modules.len();
        let fore = (0..n).map(|i| i.checked_sub(1)).collect();
        let aft = (0..n).map(|i| (i + 1 < n).then_some(i + 1)).collect();
        Self { modules, fore, aft }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn neighbour(&self, index: usize, direction: HullDirection) -> Option<usize> {
        match direction {
            HullDirection::Aft => self.aft.get(index).copied().flatten(),
            HullDirection::Fore => self.fore.get(index).copied().flatten(),
        }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.name == name)
    }

    /// Mean health of all modules of a kind (1.0 when the ship has none).
    pub fn health_of(&self, kind: ModuleKind) -> f64 {
        let (sum, count) = self
            .modules
            .iter()
            .filter(|m| m.kind == kind)
            .fold((0.0, 0u32), |(s, c), m| (s + m.health_fraction(), c + 1));
        if count == 0 {
            1.0
        } else {
            sum / count as f64
        }
    }

    pub fn total_hp(&self) -> f64 {
        self.modules.iter().map(|m| m.hp.max(0.0)).sum()
    }
}

/// Structural integrity budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub max_hp: f64,
    pub hp: f64,
}

impl Structure {
    pub fn fraction(&self) -> f64 {
        if self.max_hp <= 0.0 {
            return 0.0;
        }
        (self.hp / self.max_hp).clamp(0.0, 1.0)
    }
}

/// Heat state of a ship.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalState {
    /// Heat currently held in the sink (J).
    pub heat_j: f64,
    pub sink_capacity_j: f64,
    pub radiators_extended: bool,
    /// 1.0 = intact radiators, 0.0 = shot away.
    pub radiator_integrity: f64,
    pub reactor_heat_w: f64,
    pub drive_heat_w_per_n: f64,
    pub radiator_extended_w: f64,
    pub radiator_retracted_w: f64,
    /// Highest band already announced.
    pub warned_band: HeatBand,
    /// Latched once the sink saturates.
    pub overheated: bool,
}

impl ThermalState {
    pub fn heat_percent(&self) -> f64 {
        if self.sink_capacity_j <= 0.0 {
            return 100.0;
        }
        self.heat_j / self.sink_capacity_j * 100.0
    }
}

/// Live state of one weapon mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponState {
    pub label: String,
    /// Template name in the catalog.
    pub weapon: String,
    pub kind: WeaponKind,
    /// Index of the module the mount sits on.
    pub module: usize,
    pub status: WeaponStatus,
    pub cooldown_remaining_s: f64,
    pub magazine: u32,
    pub target: Option<ShipId>,
    /// Spinal alignment/charge progress (s).
    pub charge_s: f64,
    /// Projectile a point-defense mount is currently lasing.
    pub tracking: Option<ProjectileId>,
}

/// Damage bookkeeping for time-limit scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageTally {
    pub dealt_hp: f64,
    pub taken_hp: f64,
}

/// Everything the orchestrator knows about one ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipState {
    pub id: ShipId,
    pub name: String,
    pub class: String,
    pub side: Side,
    pub status: ShipStatus,
    pub loss_cause: Option<LossCause>,
    pub body: RigidBody,
    pub mass: MassState,
    pub drive: DriveLimits,
    pub hit_radius_m: f64,
    pub armor: ArmorSet,
    pub modules: ModuleGraph,
    pub structure: Structure,
    pub thermal: ThermalState,
    pub weapons: Vec<WeaponState>,
    /// Standing orders for the current checkpoint.
    pub orders: OrderSet,
    /// Thrust delivered during the last tick (N), for drive heat.
    pub last_thrust_n: f64,
    pub tally: DamageTally,
}

impl ShipState {
    pub fn in_action(&self) -> bool {
        self.status.in_action()
    }
}

/// Common projectile data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: ProjectileId,
    pub kind: ProjectileKind,
    pub source: ShipId,
    pub side: Side,
    pub target: Option<ShipId>,
    /// Mount label that fired it.
    pub weapon: String,
    pub mass_kg: f64,
    pub launch_position: Vec3,
    pub age_s: f64,
    pub max_range_m: f64,
    /// Laser energy absorbed from point defense (J).
    pub pd_absorbed_j: f64,
}

/// Point-mass kinematics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Position at the start of the current tick (for swept hit tests).
    pub prev_position: Vec3,
}

/// Torpedo guidance state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guidance {
    /// Torpedo template name.
    pub torpedo: String,
    pub dry_mass_kg: f64,
    pub propellant_kg: f64,
    pub initial_propellant_kg: f64,
    /// Inside terminal range, homing with proportional navigation.
    pub terminal: bool,
    /// Out of fuel; no further correction.
    pub ballistic: bool,
    pub condition: TorpedoCondition,
    /// Laser energy absorbed from point defense (J).
    pub absorbed_j: f64,
}

impl Guidance {
    pub fn fuel_fraction(&self) -> f64 {
        if self.initial_propellant_kg <= 0.0 {
            return 0.0;
        }
        (self.propellant_kg / self.initial_propellant_kg).clamp(0.0, 1.0)
    }
}
