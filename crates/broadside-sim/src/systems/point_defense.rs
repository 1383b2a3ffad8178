//! Point defense system: threat prioritization and laser engagement.
//!
//! Each PD mount picks the best-scoring incoming enemy projectile and burns
//! it for one tick. A guided torpedo goes Inert when absorbed energy crosses
//! its electronics threshold and Detonated when it crosses the warhead
//! threshold, whichever comes first; an inert one can still cook off. The
//! state only moves forward. Slugs lose mass until vaporized. With nothing
//! inbound and FIRE_AT_WILL set, a mount lases the ship's weapons target
//! instead.

use std::f64::consts::PI;

use hecs::{Entity, World};

use broadside_core::catalog::{Catalog, LaserSpec};
use broadside_core::components::{Guidance, Kinematics, Projectile, ShipState};
use broadside_core::config::BattleConfig;
use broadside_core::constants::*;
use broadside_core::enums::*;
use broadside_core::events::{EventPayload, PendingEvent};
use broadside_core::types::{ProjectileId, ShipId, Vec3};

use super::fire_control::select_target;
use super::thermal;
use crate::guidance::closest_approach;

/// Laser energy a PD mount puts on a ship this tick, resolved with impacts.
#[derive(Debug, Clone, PartialEq)]
pub struct LaserShot {
    pub shooter: ShipId,
    pub weapon: String,
    pub target: ShipId,
    pub energy_j: f64,
}

/// Energy delivered onto a target of the laser's reference cross-section
/// at `range_m` during one tick.
///
/// The diffraction-limited spot grows linearly with range; once it is wider
/// than the target only the overlapping fraction couples.
pub fn delivered_energy(laser: &LaserSpec, range_m: f64, dt: f64) -> f64 {
    let aperture = laser.aperture_m.max(f64::EPSILON);
    let spot_d = laser.wavelength_m / aperture * range_m.max(0.0);
    let spot_area = PI * 0.25 * spot_d * spot_d;
    let coupling = if spot_area <= laser.target_cross_section_m2 {
        1.0
    } else {
        laser.target_cross_section_m2 / spot_area
    };
    laser.power_w * dt * coupling
}

/// Working copy of a projectile for one PD pass.
#[derive(Debug, Clone)]
struct Contact {
    entity: Entity,
    id: ProjectileId,
    side: Side,
    position: Vec3,
    velocity: Vec3,
    mass_kg: f64,
    condition: Option<TorpedoCondition>,
    absorbed_j: f64,
    electronics_threshold_j: f64,
    warhead_threshold_j: f64,
    warhead_yield_j: f64,
    removed: bool,
    touched: bool,
}

impl Contact {
    fn weight(&self) -> f64 {
        match self.condition {
            Some(TorpedoCondition::Guided) => PD_WEIGHT_GUIDED,
            Some(_) => PD_WEIGHT_INERT,
            None => PD_WEIGHT_SLUG,
        }
    }

    /// Energy still needed to take this contact out of the fight.
    fn kill_energy_j(&self) -> f64 {
        match self.condition {
            Some(TorpedoCondition::Guided) => (self
                .electronics_threshold_j
                .min(self.warhead_threshold_j)
                - self.absorbed_j)
                .max(0.0),
            Some(_) => (self.warhead_threshold_j - self.absorbed_j).max(0.0),
            None => self.mass_kg * SLUG_HEAT_OF_VAPORIZATION,
        }
    }
}

/// A scored threat against one ship.
#[derive(Debug, Clone, Copy)]
struct Threat {
    contact: usize,
    id: ProjectileId,
    score: f64,
}

fn collect_contacts(world: &mut World, catalog: &Catalog) -> Vec<Contact> {
    let mut contacts: Vec<Contact> = world
        .query_mut::<(&Projectile, &Kinematics, Option<&Guidance>)>()
        .into_iter()
        .filter(|(_, (_, _, g))| g.map_or(true, |g| g.condition != TorpedoCondition::Detonated))
        .map(|(entity, (p, kin, guidance))| {
            let spec = guidance.and_then(|g| catalog.torpedoes.get(&g.torpedo));
            Contact {
                entity,
                id: p.id,
                side: p.side,
                position: kin.position,
                velocity: kin.velocity,
                mass_kg: p.mass_kg,
                condition: guidance.map(|g| g.condition),
                absorbed_j: guidance.map_or(p.pd_absorbed_j, |g| g.absorbed_j),
                electronics_threshold_j: spec.map_or(0.0, |s| s.electronics_threshold_j),
                warhead_threshold_j: spec.map_or(0.0, |s| s.warhead_threshold_j),
                warhead_yield_j: spec.map_or(0.0, |s| s.warhead_yield_j),
                removed: false,
                touched: false,
            }
        })
        .collect();
    contacts.sort_by_key(|c| c.id);
    contacts
}

/// Threats against `ship` that `laser` could engage, best first.
fn rank_threats(
    ship: &ShipState,
    contacts: &[Contact],
    laser: &LaserSpec,
    range_m: f64,
    config: &BattleConfig,
    dt: f64,
) -> Vec<Threat> {
    let margin = config.pd_threat_margin_radii * ship.hit_radius_m;
    let mut threats: Vec<Threat> = contacts
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.removed && c.side != ship.side)
        .filter_map(|(index, c)| {
            let rel_pos = c.position - ship.body.position;
            let rel_vel = c.velocity - ship.body.velocity;
            let range = rel_pos.length();
            if range > range_m || rel_pos.dot(rel_vel) >= 0.0 {
                return None;
            }
            let (tti, miss) = closest_approach(rel_pos, rel_vel);
            if miss >= margin {
                return None;
            }
            let potential = 0.5 * c.mass_kg * rel_vel.length_squared()
                + if c.condition == Some(TorpedoCondition::Guided) {
                    c.warhead_yield_j
                } else {
                    0.0
                };
            let mut score = c.weight() * potential / tti.max(PD_MIN_TTI_SECS);
            let deliverable = delivered_energy(laser, range, dt) / dt * tti;
            if deliverable < c.kill_energy_j() {
                score *= PD_UNKILLABLE_PENALTY;
            }
            Some(Threat {
                contact: index,
                id: c.id,
                score,
            })
        })
        .collect();
    threats.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
    threats
}

/// Deliver `energy_j` to a contact and report what happened.
fn burn(contact: &mut Contact, energy_j: f64) -> Option<EventPayload> {
    contact.touched = true;
    let first_touch = contact.absorbed_j <= 0.0;
    contact.absorbed_j += energy_j;
    match contact.condition {
        // Cook-off is checked first: a delivery past both thresholds
        // detonates the warhead rather than leaving an inert body.
        Some(TorpedoCondition::Guided | TorpedoCondition::Inert)
            if contact.absorbed_j >= contact.warhead_threshold_j =>
        {
            contact.condition = Some(TorpedoCondition::Detonated);
            contact.removed = true;
            Some(EventPayload::PdTorpedoDestroyed)
        }
        Some(TorpedoCondition::Guided) => {
            (contact.absorbed_j >= contact.electronics_threshold_j).then(|| {
                contact.condition = Some(TorpedoCondition::Inert);
                EventPayload::PdTorpedoDisabled
            })
        }
        Some(TorpedoCondition::Inert) => None,
        Some(TorpedoCondition::Detonated) => None,
        None => {
            contact.mass_kg -= energy_j / SLUG_HEAT_OF_VAPORIZATION;
            if contact.mass_kg <= 1e-9 {
                contact.mass_kg = 0.0;
                contact.removed = true;
                Some(EventPayload::PdSlugDestroyed)
            } else if first_touch {
                Some(EventPayload::PdSlugDamaged {
                    mass_remaining_kg: contact.mass_kg,
                })
            } else {
                None
            }
        }
    }
}

/// Copy PD results back into the world and queue destroyed projectiles.
fn write_back(world: &mut World, contacts: &[Contact], despawn_buffer: &mut Vec<Entity>) {
    for contact in contacts.iter().filter(|c| c.touched) {
        if contact.removed {
            despawn_buffer.push(contact.entity);
            continue;
        }
        if let Ok(mut projectile) = world.get::<&mut Projectile>(contact.entity) {
            projectile.mass_kg = contact.mass_kg;
            projectile.pd_absorbed_j = contact.absorbed_j;
        }
        if let Ok(mut guidance) = world.get::<&mut Guidance>(contact.entity) {
            guidance.absorbed_j = contact.absorbed_j;
            if let Some(condition) = contact.condition {
                guidance.condition = condition;
                if condition != TorpedoCondition::Guided {
                    guidance.ballistic = true;
                }
            }
        }
    }
}

/// Run point defense for every ship in ascending id order.
///
/// Returns laser shots on enemy ships for the impact phase.
#[allow(clippy::too_many_arguments)]
pub fn run(
    world: &mut World,
    ships: &mut [ShipState],
    catalog: &Catalog,
    config: &BattleConfig,
    dt: f64,
    events: &mut Vec<PendingEvent>,
    despawn_buffer: &mut Vec<Entity>,
) -> Vec<LaserShot> {
    let mut contacts = collect_contacts(world, catalog);
    let mut shots = Vec::new();

    for index in 0..ships.len() {
        if !ships[index].in_action() {
            for weapon in &mut ships[index].weapons {
                weapon.tracking = None;
            }
            continue;
        }
        let offensive_target = select_target(&ships[index], ships)
            .filter(|_| ships[index].orders.fire_mode.allows_offensive_pd())
            .and_then(|id| ships.get(id.index()))
            .map(|t| (t.id, t.body.position));

        let ship = &mut ships[index];
        let mut engaged: Vec<ProjectileId> = Vec::new();

        for mount in 0..ship.weapons.len() {
            let Some(spec) = catalog.weapons.get(&ship.weapons[mount].weapon) else {
                continue;
            };
            let Some(laser) = spec.laser.as_ref().filter(|_| spec.kind == WeaponKind::PointDefense)
            else {
                continue;
            };
            if ship.weapons[mount].status == WeaponStatus::Disabled {
                ship.weapons[mount].tracking = None;
                continue;
            }

            let threats = rank_threats(ship, &contacts, laser, spec.range_m, config, dt);
            let pick = threats
                .iter()
                .find(|t| !engaged.contains(&t.id))
                .or_else(|| threats.first())
                .copied();

            if let Some(threat) = pick {
                let contact = &mut contacts[threat.contact];
                let range = contact.position.distance(ship.body.position);
                let energy = delivered_energy(laser, range, dt);
                engaged.push(threat.id);

                let label = ship.weapons[mount].label.clone();
                if ship.weapons[mount].tracking != Some(threat.id) {
                    ship.weapons[mount].tracking = Some(threat.id);
                    events.push(
                        PendingEvent::new(EventPayload::PdEngaged {
                            weapon: label,
                            energy_j: energy,
                        })
                        .by(ship.id)
                        .on(threat.id),
                    );
                }
                thermal::add_heat(ship, laser.heat_per_second_j * dt);

                if let Some(outcome) = burn(contact, energy) {
                    tracing::debug!(
                        ship = %ship.id,
                        projectile = %contact.id,
                        event = outcome.kind_name(),
                        "point defense result"
                    );
                    events.push(PendingEvent::new(outcome).by(ship.id).on(contact.id));
                }
                continue;
            }

            ship.weapons[mount].tracking = None;
            let Some((target, position)) = offensive_target else {
                continue;
            };
            let range = position.distance(ship.body.position);
            if range > spec.range_m {
                continue;
            }
            thermal::add_heat(ship, laser.heat_per_second_j * dt);
            shots.push(LaserShot {
                shooter: ship.id,
                weapon: ship.weapons[mount].label.clone(),
                target,
                energy_j: delivered_energy(laser, range, dt),
            });
        }
    }

    write_back(world, &contacts, despawn_buffer);
    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
    shots
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadside_core::setup::ShipPlacement;
    use proptest::prelude::*;

    use crate::world_setup::build_ship;

    fn laser() -> LaserSpec {
        Catalog::standard().weapons["PD Laser"].laser.clone().unwrap()
    }

    fn defender() -> ShipState {
        let placement = ShipPlacement {
            name: "Defender".to_string(),
            class: "corvette".to_string(),
            side: Side::Alpha,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            facing: Some(Vec3::X),
        };
        build_ship(ShipId(0), &placement, &Catalog::standard()).unwrap()
    }

    fn spawn_slug(world: &mut World, id: u64, x: f64, mass_kg: f64) -> Entity {
        world.spawn((
            Projectile {
                id: ProjectileId(id),
                kind: ProjectileKind::Slug,
                source: ShipId(1),
                side: Side::Beta,
                target: Some(ShipId(0)),
                weapon: "Coilgun Battery".to_string(),
                mass_kg,
                launch_position: Vec3::new(x, 0.0, 0.0),
                age_s: 0.0,
                max_range_m: 200_000.0,
                pd_absorbed_j: 0.0,
            },
            Kinematics {
                position: Vec3::new(x, 0.0, 0.0),
                velocity: Vec3::new(-1000.0, 0.0, 0.0),
                prev_position: Vec3::new(x, 0.0, 0.0),
            },
        ))
    }

    fn spawn_torpedo(world: &mut World, id: u64, x: f64) -> Entity {
        let catalog = Catalog::standard();
        let spec = &catalog.torpedoes["Trident"];
        world.spawn((
            Projectile {
                id: ProjectileId(id),
                kind: ProjectileKind::Torpedo,
                source: ShipId(1),
                side: Side::Beta,
                target: Some(ShipId(0)),
                weapon: "Torpedo Launcher".to_string(),
                mass_kg: spec.mass_kg,
                launch_position: Vec3::new(x, 0.0, 0.0),
                age_s: 0.0,
                max_range_m: 1_500_000.0,
                pd_absorbed_j: 0.0,
            },
            Kinematics {
                position: Vec3::new(x, 0.0, 0.0),
                velocity: Vec3::new(-2000.0, 0.0, 0.0),
                prev_position: Vec3::new(x, 0.0, 0.0),
            },
            Guidance {
                torpedo: "Trident".to_string(),
                dry_mass_kg: spec.dry_mass_kg(),
                propellant_kg: spec.propellant_kg(),
                initial_propellant_kg: spec.propellant_kg(),
                terminal: false,
                ballistic: false,
                condition: TorpedoCondition::Guided,
                absorbed_j: 0.0,
            },
        ))
    }

    fn pass(world: &mut World, ships: &mut [ShipState], events: &mut Vec<PendingEvent>) {
        pass_with(&Catalog::standard(), world, ships, events);
    }

    fn pass_with(
        catalog: &Catalog,
        world: &mut World,
        ships: &mut [ShipState],
        events: &mut Vec<PendingEvent>,
    ) {
        let config = BattleConfig::default();
        let mut buffer = Vec::new();
        run(world, ships, catalog, &config, DT, events, &mut buffer);
    }

    fn torpedo_contact(electronics_threshold_j: f64, warhead_threshold_j: f64) -> Contact {
        Contact {
            entity: Entity::DANGLING,
            id: ProjectileId(1),
            side: Side::Beta,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            mass_kg: 1600.0,
            condition: Some(TorpedoCondition::Guided),
            absorbed_j: 0.0,
            electronics_threshold_j,
            warhead_threshold_j,
            warhead_yield_j: 0.0,
            removed: false,
            touched: false,
        }
    }

    fn count(events: &[PendingEvent], payload: EventPayload) -> usize {
        events.iter().filter(|e| e.payload == payload).count()
    }

    #[test]
    fn test_delivered_energy_falls_off_with_range() {
        let laser = laser();
        let close = delivered_energy(&laser, 1_000.0, DT);
        assert!((close - 5.0e5).abs() < 1e-6, "Spot smaller than target: full power");
        let far = delivered_energy(&laser, 100_000.0, DT);
        // spot_d = 0.2 m at 100 km: area 0.0314 m² < 1 m², still fully coupled.
        assert!((far - 5.0e5).abs() < 1e-6);
        let very_far = delivered_energy(&laser, 10_000_000.0, DT);
        assert!(very_far < close, "Diffraction spreads the spot at long range");
    }

    #[test]
    fn test_torpedo_disabled_then_destroyed() {
        // A hardened warhead: one 0.5 MJ tick fries the seeker but no more.
        let mut catalog = Catalog::standard();
        catalog.torpedoes.get_mut("Trident").unwrap().warhead_threshold_j = 8.0e5;
        let mut world = World::new();
        let mut ships = vec![defender()];
        let torpedo = spawn_torpedo(&mut world, 1, 50_000.0);
        let mut events = Vec::new();

        pass_with(&catalog, &mut world, &mut ships, &mut events);
        {
            let guidance = world.get::<&Guidance>(torpedo).unwrap();
            assert_eq!(guidance.condition, TorpedoCondition::Inert);
            assert!(guidance.ballistic, "Fried seeker leaves a ballistic body");
        }
        assert_eq!(count(&events, EventPayload::PdTorpedoDisabled), 1);
        assert_eq!(count(&events, EventPayload::PdTorpedoDestroyed), 0);

        pass_with(&catalog, &mut world, &mut ships, &mut events);
        assert!(world.get::<&Guidance>(torpedo).is_err(), "Warhead cook-off removes it");
        assert_eq!(count(&events, EventPayload::PdTorpedoDestroyed), 1);
        assert_eq!(count(&events, EventPayload::PdTorpedoDisabled), 1);
    }

    #[test]
    fn test_delivery_past_both_thresholds_detonates() {
        let mut world = World::new();
        let mut ships = vec![defender()];
        let torpedo = spawn_torpedo(&mut world, 1, 50_000.0);
        let mut events = Vec::new();

        // 0.5 MJ in one tick is past both the 10 kJ and 100 kJ thresholds.
        pass(&mut world, &mut ships, &mut events);
        assert!(world.get::<&Guidance>(torpedo).is_err());
        assert_eq!(count(&events, EventPayload::PdTorpedoDestroyed), 1);
        assert_eq!(
            count(&events, EventPayload::PdTorpedoDisabled),
            0,
            "A detonated torpedo is never also reported disabled"
        );
    }

    #[test]
    fn test_warhead_below_electronics_threshold_cooks_off() {
        let mut contact = torpedo_contact(1.0e4, 5.0e3);
        assert_eq!(burn(&mut contact, 6.0e3), Some(EventPayload::PdTorpedoDestroyed));
        assert_eq!(contact.condition, Some(TorpedoCondition::Detonated));
        assert!(contact.removed);
    }

    #[test]
    fn test_heavy_slug_survives_one_mount() {
        let mut world = World::new();
        let mut ships = vec![defender()];
        let slug = spawn_slug(&mut world, 1, 20_000.0, 88.0);
        let mut events = Vec::new();
        for _ in 0..10 {
            pass(&mut world, &mut ships, &mut events);
        }
        let projectile = world.get::<&Projectile>(slug).unwrap();
        // 10 ticks × 0.5 MJ / 30 MJ/kg ≈ 0.17 kg removed.
        assert!((projectile.mass_kg - (88.0 - 5.0e6 / 3.0e7)).abs() < 1e-6);
        let damaged = events
            .iter()
            .filter(|e| matches!(e.payload, EventPayload::PdSlugDamaged { .. }))
            .count();
        assert_eq!(damaged, 1, "Damage is announced once per slug");
    }

    #[test]
    fn test_light_slug_vaporized() {
        let mut world = World::new();
        let mut ships = vec![defender()];
        let slug = spawn_slug(&mut world, 1, 20_000.0, 0.01);
        let mut events = Vec::new();
        pass(&mut world, &mut ships, &mut events);
        assert!(world.get::<&Projectile>(slug).is_err());
        assert!(events.iter().any(|e| e.payload == EventPayload::PdSlugDestroyed));
    }

    #[test]
    fn test_guided_torpedo_preferred_over_slug() {
        let mut world = World::new();
        let mut ships = vec![defender()];
        spawn_slug(&mut world, 1, 10_000.0, 5.0);
        spawn_torpedo(&mut world, 2, 30_000.0);
        let mut events = Vec::new();
        pass(&mut world, &mut ships, &mut events);
        let engaged: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.payload, EventPayload::PdEngaged { .. }))
            .map(|e| e.target)
            .collect();
        assert_eq!(engaged, vec![Some(ProjectileId(2).into())]);
    }

    #[test]
    fn test_receding_projectile_ignored() {
        let mut world = World::new();
        let mut ships = vec![defender()];
        let slug = spawn_slug(&mut world, 1, 20_000.0, 0.01);
        world.get::<&mut Kinematics>(slug).unwrap().velocity = Vec3::new(1000.0, 0.0, 0.0);
        let mut events = Vec::new();
        pass(&mut world, &mut ships, &mut events);
        assert!(events.is_empty(), "No threat, HOLD_FIRE: PD stays quiet");
    }

    #[test]
    fn test_fire_at_will_lases_ship() {
        let catalog = Catalog::standard();
        let mut ships = vec![defender()];
        let enemy = ShipPlacement {
            name: "Enemy".to_string(),
            class: "corvette".to_string(),
            side: Side::Beta,
            position: Vec3::new(50_000.0, 0.0, 0.0),
            velocity: Vec3::ZERO,
            facing: Some(-Vec3::X),
        };
        ships.push(build_ship(ShipId(1), &enemy, &catalog).unwrap());
        ships[0].orders.fire_mode = FireMode::FireAtWill;
        let mut world = World::new();
        let mut events = Vec::new();
        let mut buffer = Vec::new();
        let shots = run(
            &mut world,
            &mut ships,
            &catalog,
            &BattleConfig::default(),
            DT,
            &mut events,
            &mut buffer,
        );
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].target, ShipId(1));
    }

    proptest! {
        #[test]
        fn prop_torpedo_state_is_exclusive_and_forward(
            first in 1.0f64..1.0e6,
            second in 0.0f64..1.0e6,
            electronics in 1.0f64..5.0e5,
            warhead in 1.0f64..5.0e5,
        ) {
            let mut contact = torpedo_contact(electronics, warhead);
            let outcome = burn(&mut contact, first);
            if first >= warhead {
                prop_assert_eq!(outcome, Some(EventPayload::PdTorpedoDestroyed));
                prop_assert_eq!(contact.condition, Some(TorpedoCondition::Detonated));
                prop_assert!(contact.removed);
            } else if first >= electronics {
                prop_assert_eq!(outcome, Some(EventPayload::PdTorpedoDisabled));
                prop_assert_eq!(contact.condition, Some(TorpedoCondition::Inert));
                prop_assert!(!contact.removed);
            } else {
                prop_assert_eq!(outcome, None);
                prop_assert_eq!(contact.condition, Some(TorpedoCondition::Guided));
            }

            let before = contact.condition;
            let outcome = burn(&mut contact, second);
            prop_assert!(outcome != Some(EventPayload::PdTorpedoDisabled) || before == Some(TorpedoCondition::Guided));
            if before != Some(TorpedoCondition::Guided) {
                prop_assert!(contact.condition != Some(TorpedoCondition::Guided), "No way back to guided");
            }
        }
    }
}
