//! Module damage propagation, critical hits and loss of combat viability.
//!
//! Hull modules form a linear chain. Damage enters at the module under the
//! struck zone and overflows along the hit axis until it is absorbed or runs
//! off the end of the hull.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use broadside_core::components::{HullDirection, ModuleGraph, ShipState};
use broadside_core::config::BattleConfig;
use broadside_core::constants::RADIATOR_HP;
use broadside_core::enums::*;
use broadside_core::events::{EventPayload, PendingEvent};
use broadside_core::types::{ShipId, Vec3};

/// Where damage enters the module chain and which way it travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitLocation {
    pub zone: ArmorZoneKind,
    pub entry: usize,
    pub direction: HullDirection,
}

/// Damage absorbed by one module during a propagation walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleHit {
    pub index: usize,
    pub hp_damage: f64,
    pub destroyed_now: bool,
}

/// Map a hit to its entry module.
///
/// Nose hits enter at the first module travelling aft, tail hits at the last
/// travelling fore. Lateral hits enter at the module whose axial slot holds
/// the impact point and travel with the projectile's axial motion.
pub fn locate_hit(
    ship: &ShipState,
    zone: ArmorZoneKind,
    impact_point: Vec3,
    relative_velocity: Vec3,
) -> HitLocation {
    let n = ship.modules.len();
    let last = n.saturating_sub(1);
    match zone {
        ArmorZoneKind::Nose => HitLocation {
            zone,
            entry: 0,
            direction: HullDirection::Aft,
        },
        ArmorZoneKind::Tail => HitLocation {
            zone,
            entry: last,
            direction: HullDirection::Fore,
        },
        ArmorZoneKind::Lateral => {
            let nose = broadside_core::types::forward(ship.body.orientation);
            let axial = (impact_point - ship.body.position).dot(nose);
            let length = ship.drive.length_m.max(1.0);
            let slot = ((0.5 - axial / length) * n as f64).floor();
            let entry = if slot.is_finite() {
                (slot.max(0.0) as usize).min(last)
            } else {
                0
            };
            let direction = if relative_velocity.dot(nose) > 0.0 {
                HullDirection::Fore
            } else {
                HullDirection::Aft
            };
            HitLocation {
                zone,
                entry,
                direction,
            }
        }
    }
}

/// Walk `hp_damage` through the chain from `entry`.
///
/// Destroyed modules pass damage straight through. The walk visits each
/// module at most once; damage left at the end of the hull is discarded.
pub fn propagate(
    graph: &mut ModuleGraph,
    entry: usize,
    direction: HullDirection,
    hp_damage: f64,
) -> Vec<ModuleHit> {
    let mut hits = Vec::new();
    let mut remaining = hp_damage.max(0.0);
    let mut current = (entry < graph.len()).then_some(entry);

    for _ in 0..graph.len() {
        let Some(index) = current else { break };
        if remaining <= 0.0 {
            break;
        }
        let module = &mut graph.modules[index];
        if !module.destroyed() {
            let absorbed = remaining.min(module.hp);
            module.hp -= absorbed;
            remaining -= absorbed;
            hits.push(ModuleHit {
                index,
                hp_damage: absorbed,
                destroyed_now: module.destroyed(),
            });
        }
        current = graph.neighbour(index, direction);
    }
    hits
}

/// Take a ship out of action. Destroyed is final; disabled may still be destroyed.
pub fn knock_out(
    ship: &mut ShipState,
    status: ShipStatus,
    cause: LossCause,
    events: &mut Vec<PendingEvent>,
) {
    let escalates = match (ship.status, status) {
        (ShipStatus::Destroyed, _) => false,
        (ShipStatus::Active, ShipStatus::Disabled | ShipStatus::Destroyed) => true,
        (ShipStatus::Disabled, ShipStatus::Destroyed) => true,
        _ => false,
    };
    if !escalates {
        return;
    }
    ship.status = status;
    ship.loss_cause = Some(cause);
    let payload = if status == ShipStatus::Destroyed {
        tracing::info!(ship = %ship.id, name = %ship.name, ?cause, "ship destroyed");
        EventPayload::ShipDestroyed { cause }
    } else {
        tracing::info!(ship = %ship.id, name = %ship.name, ?cause, "ship disabled");
        EventPayload::ShipDisabled { cause }
    };
    events.push(PendingEvent::new(payload).on(ship.id));
}

/// Disable every working mount on a module. Returns the labels disabled.
fn disable_mounts(ship: &mut ShipState, module: usize) -> Vec<String> {
    ship.weapons
        .iter_mut()
        .filter(|w| w.module == module)
        .filter(|w| !matches!(w.status, WeaponStatus::Disabled | WeaponStatus::Empty))
        .map(|w| {
            w.status = WeaponStatus::Disabled;
            w.tracking = None;
            w.charge_s = 0.0;
            w.label.clone()
        })
        .collect()
}

/// Apply penetrating damage to a ship: module walk, critical hits,
/// structure loss, and any resulting loss of the ship.
///
/// Returns the HP of damage dealt.
pub fn apply_hit(
    ship: &mut ShipState,
    location: HitLocation,
    hp_damage: f64,
    attacker: Option<ShipId>,
    config: &BattleConfig,
    rng: &mut ChaCha8Rng,
    events: &mut Vec<PendingEvent>,
) -> f64 {
    if hp_damage <= 0.0 || ship.status == ShipStatus::Destroyed {
        return 0.0;
    }
    let id = ship.id;
    let stamp = |payload: EventPayload| {
        let event = PendingEvent::new(payload).on(id);
        match attacker {
            Some(a) => event.by(a),
            None => event,
        }
    };

    let hits = propagate(&mut ship.modules, location.entry, location.direction, hp_damage);
    let mut lost: Option<(ShipStatus, LossCause)> = None;

    for hit in hits {
        let (name, hp_remaining, max_hp, critical, kind) = {
            let m = &ship.modules.modules[hit.index];
            (m.name.clone(), m.hp, m.max_hp, m.critical, m.kind)
        };
        events.push(stamp(EventPayload::ModuleDamaged {
            module: name.clone(),
            hp_damage: hit.hp_damage,
            hp_remaining,
        }));

        if hit.destroyed_now {
            disable_mounts(ship, hit.index);
            events.push(stamp(EventPayload::ModuleDestroyed {
                module: name.clone(),
                critical,
            }));
            tracing::debug!(ship = %id, module = %name, "module destroyed");
            if critical {
                let status = if kind == ModuleKind::Bridge {
                    ShipStatus::Disabled
                } else {
                    ShipStatus::Destroyed
                };
                lost = match lost {
                    Some((ShipStatus::Destroyed, c)) => Some((ShipStatus::Destroyed, c)),
                    _ => Some((status, LossCause::CriticalModule)),
                };
            }
            continue;
        }

        let ratio = if max_hp > 0.0 { hit.hp_damage / max_hp } else { 0.0 };
        if rng.gen_bool(config.crit.chance(ratio)) {
            let disabled = disable_mounts(ship, hit.index);
            if !disabled.is_empty() {
                tracing::debug!(ship = %id, module = %name, ?disabled, "critical hit");
                events.push(stamp(EventPayload::CriticalHit {
                    module: name,
                    disabled_weapons: disabled,
                }));
            }
        }
    }

    ship.structure.hp -= hp_damage;
    if ship.structure.hp < ship.structure.max_hp * config.structural_threshold {
        lost = Some((ShipStatus::Destroyed, LossCause::StructuralFailure));
    }

    if let Some((status, cause)) = lost {
        knock_out(ship, status, cause, events);
    }
    hp_damage
}

/// Roll for radiator damage on a lateral or tail hit.
pub fn roll_radiator_hit(
    ship: &mut ShipState,
    zone: ArmorZoneKind,
    hp_damage: f64,
    config: &BattleConfig,
    rng: &mut ChaCha8Rng,
) -> Option<PendingEvent> {
    if zone == ArmorZoneKind::Nose || hp_damage <= 0.0 {
        return None;
    }
    let chance = if ship.thermal.radiators_extended {
        config.radiator_hit_chance_extended
    } else {
        config.radiator_hit_chance_retracted
    };
    if !rng.gen_bool(chance.clamp(0.0, 1.0)) {
        return None;
    }
    let thermal = &mut ship.thermal;
    thermal.radiator_integrity = (thermal.radiator_integrity - hp_damage / RADIATOR_HP).max(0.0);
    Some(
        PendingEvent::new(EventPayload::RadiatorDamaged {
            integrity: thermal.radiator_integrity,
        })
        .on(ship.id),
    )
}
