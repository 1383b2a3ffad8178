//! Combat events: the append-only log consumed by scoring and replay.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::orders::OrderIssue;
use crate::types::{EntityRef, ProjectileId, ShipId, Vec3};

/// One immutable log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Position in the log, starting at 0.
    pub seq: u64,
    pub tick: u64,
    pub time_s: f64,
    pub actor: Option<EntityRef>,
    pub target: Option<EntityRef>,
    pub payload: EventPayload,
}

/// Type-specific event data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventPayload {
    BattleStarted {
        ships: u32,
        seed: u64,
    },
    CheckpointReached {
        checkpoint: u32,
    },
    OrderDefaulted {
        issue: OrderIssue,
    },
    /// No order arrived for this checkpoint.
    OrdersMissing,
    ManeuverChanged {
        kind: ManeuverKind,
        throttle: f64,
    },
    ProjectileLaunched {
        weapon: String,
        projectile: ProjectileId,
        mass_kg: f64,
        velocity: Vec3,
        aimed_hit: bool,
    },
    TorpedoLaunched {
        weapon: String,
        projectile: ProjectileId,
        mass_kg: f64,
    },
    ProjectileImpact {
        kind: ProjectileKind,
        position: Vec3,
        zone: ArmorZoneKind,
        relative_speed: f64,
        incident_j: f64,
        penetrating_j: f64,
        hp_damage: f64,
        armor_remaining_cm: f64,
    },
    /// Laser damage delivered to a ship by point defense.
    LaserHit {
        zone: ArmorZoneKind,
        incident_j: f64,
        penetrating_j: f64,
        hp_damage: f64,
        armor_remaining_cm: f64,
    },
    ProjectileExpired {
        kind: ProjectileKind,
    },
    ModuleDamaged {
        module: String,
        hp_damage: f64,
        hp_remaining: f64,
    },
    ModuleDestroyed {
        module: String,
        critical: bool,
    },
    CriticalHit {
        module: String,
        disabled_weapons: Vec<String>,
    },
    WeaponDepleted {
        weapon: String,
    },
    RadiatorsExtended,
    RadiatorsRetracted,
    RadiatorDamaged {
        integrity: f64,
    },
    ThermalWarning {
        band: HeatBand,
        heat_percent: f64,
    },
    ThermalCritical {
        heat_percent: f64,
    },
    PdEngaged {
        weapon: String,
        energy_j: f64,
    },
    PdTorpedoDisabled,
    PdTorpedoDestroyed,
    PdSlugDamaged {
        mass_remaining_kg: f64,
    },
    PdSlugDestroyed,
    TorpedoTerminal {
        range_m: f64,
    },
    TorpedoFuelExhausted,
    /// Degenerate physics input; the previous state was kept.
    PhysicsRejected {
        reason: String,
    },
    ShipDisabled {
        cause: LossCause,
    },
    ShipDestroyed {
        cause: LossCause,
    },
    Surrendered {
        side: Side,
    },
    DrawProposed {
        side: Side,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

impl EventPayload {
    /// Stable name of the event type.
    pub fn kind_name(&self) -> &'static str {
        match self {
            EventPayload::BattleStarted { .. } => "BattleStarted",
            EventPayload::CheckpointReached { .. } => "CheckpointReached",
            EventPayload::OrderDefaulted { .. } => "OrderDefaulted",
            EventPayload::OrdersMissing => "OrdersMissing",
            EventPayload::ManeuverChanged { .. } => "ManeuverChanged",
            EventPayload::ProjectileLaunched { .. } => "ProjectileLaunched",
            EventPayload::TorpedoLaunched { .. } => "TorpedoLaunched",
            EventPayload::ProjectileImpact { .. } => "ProjectileImpact",
            EventPayload::LaserHit { .. } => "LaserHit",
            EventPayload::ProjectileExpired { .. } => "ProjectileExpired",
            EventPayload::ModuleDamaged { .. } => "ModuleDamaged",
            EventPayload::ModuleDestroyed { .. } => "ModuleDestroyed",
            EventPayload::CriticalHit { .. } => "CriticalHit",
            EventPayload::WeaponDepleted { .. } => "WeaponDepleted",
            EventPayload::RadiatorsExtended => "RadiatorsExtended",
            EventPayload::RadiatorsRetracted => "RadiatorsRetracted",
            EventPayload::RadiatorDamaged { .. } => "RadiatorDamaged",
            EventPayload::ThermalWarning { .. } => "ThermalWarning",
            EventPayload::ThermalCritical { .. } => "ThermalCritical",
            EventPayload::PdEngaged { .. } => "PdEngaged",
            EventPayload::PdTorpedoDisabled => "PdTorpedoDisabled",
            EventPayload::PdTorpedoDestroyed => "PdTorpedoDestroyed",
            EventPayload::PdSlugDamaged { .. } => "PdSlugDamaged",
            EventPayload::PdSlugDestroyed => "PdSlugDestroyed",
            EventPayload::TorpedoTerminal { .. } => "TorpedoTerminal",
            EventPayload::TorpedoFuelExhausted => "TorpedoFuelExhausted",
            EventPayload::PhysicsRejected { .. } => "PhysicsRejected",
            EventPayload::ShipDisabled { .. } => "ShipDisabled",
            EventPayload::ShipDestroyed { .. } => "ShipDestroyed",
            EventPayload::Surrendered { .. } => "Surrendered",
            EventPayload::DrawProposed { .. } => "DrawProposed",
            EventPayload::BattleEnded { .. } => "BattleEnded",
        }
    }
}

impl CombatEvent {
    pub fn kind_name(&self) -> &'static str {
        self.payload.kind_name()
    }

    /// The ship this event was raised by, if any.
    pub fn actor_ship(&self) -> Option<ShipId> {
        match self.actor {
            Some(EntityRef::Ship(id)) => Some(id),
            _ => None,
        }
    }

    /// The ship this event happened to, if any.
    pub fn target_ship(&self) -> Option<ShipId> {
        match self.target {
            Some(EntityRef::Ship(id)) => Some(id),
            _ => None,
        }
    }
}

/// Event staged by a system before the orchestrator stamps it into the log.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
    pub actor: Option<EntityRef>,
    pub target: Option<EntityRef>,
    pub payload: EventPayload,
}

impl PendingEvent {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            actor: None,
            target: None,
            payload,
        }
    }

    pub fn by(mut self, actor: impl Into<EntityRef>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn on(mut self, target: impl Into<EntityRef>) -> Self {
        self.target = Some(target.into());
        self
    }
}

impl From<ShipId> for EntityRef {
    fn from(id: ShipId) -> Self {
        EntityRef::Ship(id)
    }
}

impl From<ProjectileId> for EntityRef {
    fn from(id: ProjectileId) -> Self {
        EntityRef::Projectile(id)
    }
}

/// Append-only event log. Entries can be read but never changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<CombatEvent>,
}

impl EventLog {
    /// Stamp and append a staged event. Returns its sequence number.
    pub fn push(&mut self, tick: u64, time_s: f64, event: PendingEvent) -> u64 {
        let seq = self.events.len() as u64;
        self.events.push(CombatEvent {
            seq,
            tick,
            time_s,
            actor: event.actor,
            target: event.target,
            payload: event.payload,
        });
        seq
    }

    pub fn as_slice(&self) -> &[CombatEvent] {
        &self.events
    }

    /// Events with sequence number `>= seq`.
    pub fn since(&self, seq: u64) -> &[CombatEvent] {
        let start = (seq as usize).min(self.events.len());
        &self.events[start..]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Time of the last entry (0 for an empty log).
    pub fn last_time(&self) -> f64 {
        self.events.last().map_or(0.0, |e| e.time_s)
    }
}
