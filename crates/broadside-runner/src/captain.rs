//! Decision-layer interface.
//!
//! A captain commands one ship. At every checkpoint it gets a view of the
//! battle and may answer with an order set; no answer means the engine's
//! defaults (MAINTAIN, HOLD_FIRE, radiators retracted).

use std::sync::Arc;

use async_trait::async_trait;

use broadside_core::enums::{FireMode, ManeuverKind, WeaponKind, WeaponStatus};
use broadside_core::events::CombatEvent;
use broadside_core::orders::OrderSet;
use broadside_core::state::{BattleSnapshot, ShipView};
use broadside_core::types::ShipId;

/// Heat level at which the doctrine captain extends radiators.
pub const RADIATOR_HEAT_PERCENT: f64 = 50.0;
/// Closing speed above which the doctrine captain brakes inside `BRAKE_RANGE_M`.
const BRAKE_CLOSING_M_S: f64 = 3_000.0;
const BRAKE_RANGE_M: f64 = 60_000.0;

/// What a captain sees at a checkpoint.
#[derive(Debug, Clone)]
pub struct CaptainView {
    /// Ship this captain commands.
    pub ship: ShipId,
    /// Checkpoint the orders will apply to (1-based).
    pub checkpoint: u32,
    pub snapshot: Arc<BattleSnapshot>,
    /// Events logged since the previous checkpoint.
    pub events: Arc<[CombatEvent]>,
}

impl CaptainView {
    pub fn own_ship(&self) -> Option<&ShipView> {
        self.snapshot.ship(self.ship)
    }
}

#[async_trait]
pub trait Captain: Send {
    fn name(&self) -> &str;

    /// Orders for the next checkpoint, or `None` to accept the defaults.
    async fn orders(&mut self, view: &CaptainView) -> Option<OrderSet>;
}

/// Never answers; the ship coasts with weapons held.
#[derive(Debug, Default)]
pub struct HoldCaptain;

#[async_trait]
impl Captain for HoldCaptain {
    fn name(&self) -> &str {
        "hold"
    }

    async fn orders(&mut self, _view: &CaptainView) -> Option<OrderSet> {
        None
    }
}

/// Plays back a fixed list of order sets, one per checkpoint.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCaptain {
    script: Vec<OrderSet>,
}

impl ScriptedCaptain {
    pub fn new(script: Vec<OrderSet>) -> Self {
        Self { script }
    }
}

#[async_trait]
impl Captain for ScriptedCaptain {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn orders(&mut self, view: &CaptainView) -> Option<OrderSet> {
        let index = view.checkpoint.checked_sub(1)? as usize;
        self.script.get(index).cloned()
    }
}

/// Rule-based captain: close on the nearest enemy, fire once inside weapon
/// reach, keep the heat down.
#[derive(Debug, Clone, Default)]
pub struct DoctrineCaptain;

#[async_trait]
impl Captain for DoctrineCaptain {
    fn name(&self) -> &str {
        "doctrine"
    }

    async fn orders(&mut self, view: &CaptainView) -> Option<OrderSet> {
        let me = view.own_ship()?;
        if !me.status.in_action() {
            return None;
        }
        Some(doctrine_orders(me, &view.snapshot))
    }
}

/// Longest range among mounts that can still shoot at ships.
fn weapon_reach(ship: &ShipView) -> f64 {
    ship.weapons
        .iter()
        .filter(|w| w.kind != WeaponKind::PointDefense)
        .filter(|w| !matches!(w.status, WeaponStatus::Empty | WeaponStatus::Disabled))
        .map(|w| w.range_m)
        .fold(0.0, f64::max)
}

pub fn doctrine_orders(me: &ShipView, snapshot: &BattleSnapshot) -> OrderSet {
    let mut orders = OrderSet {
        radiators_extended: me.heat_percent >= RADIATOR_HEAT_PERCENT,
        ..OrderSet::default()
    };

    let enemy = snapshot
        .ships
        .iter()
        .filter(|s| s.side != me.side && s.status.in_action())
        .min_by(|a, b| {
            let da = a.position.distance_squared(me.position);
            let db = b.position.distance_squared(me.position);
            da.total_cmp(&db).then(a.id.cmp(&b.id))
        });
    let Some(enemy) = enemy else {
        return orders;
    };

    let offset = enemy.position - me.position;
    let range = offset.length();
    let closing = if range > 0.0 {
        -(enemy.velocity - me.velocity).dot(offset / range)
    } else {
        0.0
    };
    let reach = weapon_reach(me);

    if closing > BRAKE_CLOSING_M_S && range < BRAKE_RANGE_M {
        orders.maneuver = ManeuverKind::Brake;
        orders.throttle = 1.0;
    } else if range > reach {
        orders.maneuver = ManeuverKind::Intercept;
        orders.throttle = 1.0;
        orders.maneuver_target = Some(enemy.id);
    } else {
        orders.maneuver = ManeuverKind::Padlock;
        orders.maneuver_target = Some(enemy.id);
    }

    if range <= reach {
        orders.fire_mode = FireMode::FireAtWill;
        orders.weapons_target = Some(enemy.id);
    }
    orders
}
