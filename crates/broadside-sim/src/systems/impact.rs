//! Impact system: swept hit detection and damage resolution.
//!
//! Every projectile is tested against every enemy hull over the whole tick,
//! so fast rounds cannot tunnel through a ship between samples. Point-defense
//! laser shots on ships are resolved here too, after projectile impacts.

use hecs::{Entity, World};
use rand_chacha::ChaCha8Rng;

use broadside_core::catalog::Catalog;
use broadside_core::components::{Guidance, Kinematics, Projectile, ShipState};
use broadside_core::config::BattleConfig;
use broadside_core::enums::*;
use broadside_core::events::{EventPayload, PendingEvent};
use broadside_core::types::{ProjectileId, ShipId, Vec3};

use super::armor::{classify_impact, resolve_impact, DamageResult, ImpactGeometry, WeaponEffect};
use super::damage::{apply_hit, locate_hit, roll_radiator_hit};
use super::point_defense::LaserShot;

/// Earliest fraction of the tick at which a relative path enters a sphere.
///
/// `r0` is the start offset from the sphere centre and `d` the relative
/// displacement over the tick.
pub fn sweep_entry(r0: Vec3, d: Vec3, radius: f64) -> Option<f64> {
    let c = r0.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let a = d.length_squared();
    if a <= f64::EPSILON {
        return None;
    }
    let b = r0.dot(d);
    if b >= 0.0 {
        return None;
    }
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / a;
    (t <= 1.0).then_some(t)
}

/// A projectile that reached a hull this tick.
#[derive(Debug, Clone)]
struct Strike {
    entity: Entity,
    projectile: ProjectileId,
    kind: ProjectileKind,
    source: ShipId,
    target: ShipId,
    mass_kg: f64,
    warhead_j: f64,
    point: Vec3,
    relative_velocity: Vec3,
}

/// What one hit did to a ship.
#[derive(Debug, Clone, Copy)]
pub struct HitReport {
    pub geometry: ImpactGeometry,
    pub damage: DamageResult,
    /// HP actually applied (zero once the ship was already destroyed).
    pub dealt_hp: f64,
}

/// Armor, module walk and radiator roll for one hit on `ship`.
///
/// `announce` receives the armor result and must return the event that
/// describes the hit; it is logged before any module damage.
#[allow(clippy::too_many_arguments)]
pub fn strike_ship(
    ship: &mut ShipState,
    attacker: ShipId,
    effect: WeaponEffect,
    travel: Vec3,
    point: Vec3,
    config: &BattleConfig,
    rng: &mut ChaCha8Rng,
    events: &mut Vec<PendingEvent>,
    announce: impl FnOnce(ImpactGeometry, &DamageResult) -> PendingEvent,
) -> HitReport {
    let geometry = classify_impact(ship.body.orientation, travel);
    let damage = resolve_impact(effect, &mut ship.armor, geometry, config);
    events.push(announce(geometry, &damage));

    let location = locate_hit(ship, geometry.zone, point, travel);
    let dealt_hp = apply_hit(
        ship,
        location,
        damage.hp_damage,
        Some(attacker),
        config,
        rng,
        events,
    );
    if let Some(event) = roll_radiator_hit(ship, geometry.zone, damage.hp_damage, config, rng) {
        events.push(event.by(attacker));
    }
    HitReport {
        geometry,
        damage,
        dealt_hp,
    }
}

fn credit(ships: &mut [ShipState], attacker: ShipId, target: ShipId, hp: f64) {
    if hp <= 0.0 {
        return;
    }
    if let Some(ship) = ships.get_mut(target.index()) {
        ship.tally.taken_hp += hp;
    }
    if let Some(ship) = ships.get_mut(attacker.index()) {
        ship.tally.dealt_hp += hp;
    }
}

/// Find which hull, if any, each projectile reaches this tick.
fn detect(
    world: &mut World,
    ships: &[ShipState],
    prev_positions: &[Vec3],
    catalog: &Catalog,
) -> Vec<Strike> {
    let mut strikes = Vec::new();
    for (entity, (projectile, kin, guidance)) in
        world.query_mut::<(&Projectile, &Kinematics, Option<&Guidance>)>()
    {
        let spec = guidance.and_then(|g| catalog.torpedoes.get(&g.torpedo));
        if let Some(spec) = spec {
            let travelled = kin.position.distance(projectile.launch_position);
            if travelled < spec.arming_distance_m {
                continue;
            }
        }

        let mut best: Option<(f64, &ShipState)> = None;
        for ship in ships {
            if ship.side == projectile.side || ship.status == ShipStatus::Destroyed {
                continue;
            }
            let ship_prev = prev_positions
                .get(ship.id.index())
                .copied()
                .unwrap_or(ship.body.position);
            let r0 = kin.prev_position - ship_prev;
            let d = (kin.position - kin.prev_position) - (ship.body.position - ship_prev);
            let Some(t) = sweep_entry(r0, d, ship.hit_radius_m) else {
                continue;
            };
            // Ships are visited in id order, so ties keep the lower id.
            if best.map_or(true, |(best_t, _)| t < best_t) {
                best = Some((t, ship));
            }
        }

        if let Some((t, ship)) = best {
            let ship_prev = prev_positions
                .get(ship.id.index())
                .copied()
                .unwrap_or(ship.body.position);
            let r0 = kin.prev_position - ship_prev;
            let d = (kin.position - kin.prev_position) - (ship.body.position - ship_prev);
            let warhead_j = match (guidance, spec) {
                (Some(g), Some(spec)) if g.condition == TorpedoCondition::Guided => {
                    spec.warhead_yield_j
                }
                _ => 0.0,
            };
            strikes.push(Strike {
                entity,
                projectile: projectile.id,
                kind: projectile.kind,
                source: projectile.source,
                target: ship.id,
                mass_kg: projectile.mass_kg,
                warhead_j,
                point: ship.body.position + r0 + d * t,
                relative_velocity: kin.velocity - ship.body.velocity,
            });
        }
    }
    strikes.sort_by_key(|s| s.projectile);
    strikes
}

/// Resolve this tick's projectile impacts, then point-defense laser shots.
#[allow(clippy::too_many_arguments)]
pub fn run(
    world: &mut World,
    ships: &mut [ShipState],
    prev_positions: &[Vec3],
    laser_shots: &[LaserShot],
    catalog: &Catalog,
    config: &BattleConfig,
    rng: &mut ChaCha8Rng,
    events: &mut Vec<PendingEvent>,
    despawn_buffer: &mut Vec<Entity>,
) {
    for strike in detect(world, ships, prev_positions, catalog) {
        despawn_buffer.push(strike.entity);
        let Some(ship) = ships.get_mut(strike.target.index()) else {
            continue;
        };
        if ship.status == ShipStatus::Destroyed {
            continue;
        }
        let effect = WeaponEffect::kinetic(strike.mass_kg, strike.relative_velocity, strike.warhead_j);
        let relative_speed = strike.relative_velocity.length();
        let report = strike_ship(
            ship,
            strike.source,
            effect,
            strike.relative_velocity,
            strike.point,
            config,
            rng,
            events,
            |geometry, damage| {
                PendingEvent::new(EventPayload::ProjectileImpact {
                    kind: strike.kind,
                    position: strike.point,
                    zone: geometry.zone,
                    relative_speed,
                    incident_j: damage.incident_j,
                    penetrating_j: damage.penetrating_j,
                    hp_damage: damage.hp_damage,
                    armor_remaining_cm: damage.remaining_cm,
                })
                .by(strike.source)
                .on(strike.target)
            },
        );
        tracing::debug!(
            projectile = %strike.projectile,
            ship = %strike.target,
            zone = ?report.geometry.zone,
            hp = report.dealt_hp,
            "impact"
        );
        credit(ships, strike.source, strike.target, report.dealt_hp);
    }

    for shot in laser_shots {
        let Some(origin) = ships.get(shot.shooter.index()).map(|s| s.body.position) else {
            continue;
        };
        let Some(ship) = ships.get_mut(shot.target.index()) else {
            continue;
        };
        if ship.status == ShipStatus::Destroyed {
            continue;
        }
        let travel = ship.body.position - origin;
        let point = ship.body.position - travel.normalize_or_zero() * ship.hit_radius_m;
        let report = strike_ship(
            ship,
            shot.shooter,
            WeaponEffect::laser(shot.energy_j),
            travel,
            point,
            config,
            rng,
            events,
            |geometry, damage| {
                PendingEvent::new(EventPayload::LaserHit {
                    zone: geometry.zone,
                    incident_j: damage.incident_j,
                    penetrating_j: damage.penetrating_j,
                    hp_damage: damage.hp_damage,
                    armor_remaining_cm: damage.remaining_cm,
                })
                .by(shot.shooter)
                .on(shot.target)
            },
        );
        credit(ships, shot.shooter, shot.target, report.dealt_hp);
    }

    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
}
