//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Which fleet a ship belongs to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Side {
    #[default]
    Alpha,
    Beta,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Alpha => Side::Beta,
            Side::Beta => Side::Alpha,
        }
    }

    pub const ALL: [Side; 2] = [Side::Alpha, Side::Beta];
}

/// Armor zones; each has its own thickness and degrades independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmorZoneKind {
    #[default]
    Nose,
    Lateral,
    Tail,
}

/// Damage type, selecting which armor half-value applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    /// Kinetic impact: slugs and torpedo penetrators.
    #[default]
    Baryonic,
    /// Directed energy: lasers.
    XRay,
}

/// Weapon mount category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Trainable kinetic mount with a wide arc.
    #[default]
    Turret,
    /// Hull-aligned kinetic weapon that charges before firing.
    Spinal,
    /// Point-defense laser.
    PointDefense,
    /// Guided torpedo launcher.
    TorpedoLauncher,
}

impl WeaponKind {
    pub fn is_kinetic(self) -> bool {
        matches!(self, WeaponKind::Turret | WeaponKind::Spinal)
    }
}

/// Weapon state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponStatus {
    #[default]
    Ready,
    CoolingDown,
    /// Spinal mount accumulating charge while aligned.
    Charging,
    /// Knocked out by a critical hit on its module.
    Disabled,
    /// Magazine exhausted. Terminal.
    Empty,
}

/// Maneuver directive from an order set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManeuverKind {
    Intercept,
    Evasive,
    Brake,
    /// Coast: no thrust, rotation nulled.
    #[default]
    Maintain,
    /// Hold the nose on a target without thrusting.
    Padlock,
    Heading,
    /// A maneuver name we do not know; sanitized to MAINTAIN.
    #[serde(other)]
    Unrecognized,
}

/// Weapons directive from an order set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireMode {
    #[default]
    HoldFire,
    FireAtWill,
    KineticOnly,
    TorpedoesOnly,
    /// A fire mode we do not know; sanitized to HOLD_FIRE.
    #[serde(other)]
    Unrecognized,
}

impl FireMode {
    pub fn allows_kinetic(self) -> bool {
        matches!(self, FireMode::FireAtWill | FireMode::KineticOnly)
    }

    pub fn allows_torpedoes(self) -> bool {
        matches!(self, FireMode::FireAtWill | FireMode::TorpedoesOnly)
    }

    /// Whether point defense may lase enemy ships (it always defends).
    pub fn allows_offensive_pd(self) -> bool {
        matches!(self, FireMode::FireAtWill)
    }
}

/// Projectile category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    #[default]
    Slug,
    Torpedo,
}

/// Torpedo seeker state. Exclusive: a torpedo is never both inert and detonated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TorpedoCondition {
    #[default]
    Guided,
    /// Electronics burnt out by point defense; flies ballistic.
    Inert,
    /// Warhead cooked off at safe range.
    Detonated,
}

/// Module role along the hull.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    Sensors,
    Bridge,
    Crew,
    Reactor,
    Weapons,
    FuelTank,
    Engine,
    Magazine,
    #[default]
    Structure,
}

/// Combat status of a ship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipStatus {
    #[default]
    Active,
    /// Out of action but intact (e.g. bridge lost).
    Disabled,
    Destroyed,
}

impl ShipStatus {
    pub fn in_action(self) -> bool {
        self == ShipStatus::Active
    }
}

/// Why a ship left the fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossCause {
    CriticalModule,
    StructuralFailure,
    ThermalOverload,
    Surrendered,
}

/// Orchestrator state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    AwaitingOrders,
    PhysicsAdvancing,
    ImpactResolution,
    ThermalUpdate,
    VictoryCheck,
    Ended(BattleOutcome),
}

/// Terminal battle result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BattleOutcome {
    /// One side has no ship in action. `winner` is `None` on mutual destruction.
    FleetEliminated { winner: Option<Side> },
    /// Resolved by tactical-advantage scoring.
    TimeLimitReached {
        winner: Option<Side>,
        alpha_score: f64,
        beta_score: f64,
    },
    MutualDraw,
    Surrender { surrendered: Side },
}

impl BattleOutcome {
    pub fn winner(&self) -> Option<Side> {
        match *self {
            BattleOutcome::FleetEliminated { winner } => winner,
            BattleOutcome::TimeLimitReached { winner, .. } => winner,
            BattleOutcome::MutualDraw => None,
            BattleOutcome::Surrender { surrendered } => Some(surrendered.opponent()),
        }
    }
}

/// Heat band reached by a ship's thermal state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum HeatBand {
    #[default]
    Nominal,
    Mild,
    Severe,
    Critical,
}
