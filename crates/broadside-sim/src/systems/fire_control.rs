//! Fire control system: cooldowns, target selection, arc/range gating,
//! spinal charge, salvo launch and torpedo launch.

use hecs::World;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use broadside_core::catalog::{Catalog, WeaponSpec};
use broadside_core::components::{Guidance, Kinematics, Projectile, ShipState, WeaponState};
use broadside_core::config::BattleConfig;
use broadside_core::constants::*;
use broadside_core::enums::*;
use broadside_core::events::{EventPayload, PendingEvent};
use broadside_core::types::{forward, ProjectileId, Quat, ShipId, Vec3};

use super::thermal;
use crate::guidance::calculate_lead_pip;

/// What fire control needs to know about a target.
#[derive(Debug, Clone, Copy)]
struct TargetTrack {
    id: ShipId,
    position: Vec3,
    velocity: Vec3,
    hit_radius_m: f64,
}

impl TargetTrack {
    fn of(ship: &ShipState) -> Self {
        Self {
            id: ship.id,
            position: ship.body.position,
            velocity: ship.body.velocity,
            hit_radius_m: ship.hit_radius_m,
        }
    }
}

/// Per-round hit probability.
pub fn hit_chance(range_m: f64, max_range_m: f64, heat_percent: f64, config: &BattleConfig) -> f64 {
    let ratio = if max_range_m > 0.0 {
        (range_m / max_range_m).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let falloff = 1.0 - 0.5 * ratio * ratio;
    (config.base_hit_chance * falloff * thermal::accuracy_multiplier(heat_percent, config))
        .clamp(0.0, 1.0)
}

/// Weapons target for a ship: its ordered target if still fighting, else the
/// nearest enemy in action.
pub fn select_target(ship: &ShipState, ships: &[ShipState]) -> Option<ShipId> {
    let ordered = ship
        .orders
        .weapons_target
        .and_then(|id| ships.get(id.index()))
        .filter(|t| t.in_action() && t.side != ship.side);
    ordered
        .or_else(|| super::maneuver::nearest_enemy(ship, ships))
        .map(|t| t.id)
}

/// Count down cooldowns. Mounts whose timer runs out come back to Ready.
pub fn tick_cooldowns(ships: &mut [ShipState], dt: f64) {
    for weapon in ships.iter_mut().flat_map(|s| s.weapons.iter_mut()) {
        if weapon.status == WeaponStatus::CoolingDown {
            weapon.cooldown_remaining_s -= dt;
            if weapon.cooldown_remaining_s <= 1e-9 {
                weapon.cooldown_remaining_s = 0.0;
                weapon.status = WeaponStatus::Ready;
            }
        }
    }
}

/// Launch state shared by every mount this tick.
pub struct Armory<'a> {
    pub world: &'a mut World,
    pub catalog: &'a Catalog,
    pub config: &'a BattleConfig,
    pub rng: &'a mut ChaCha8Rng,
    pub next_projectile_id: &'a mut u64,
    pub events: &'a mut Vec<PendingEvent>,
}

impl Armory<'_> {
    fn allocate_id(&mut self) -> ProjectileId {
        let id = ProjectileId(*self.next_projectile_id);
        *self.next_projectile_id += 1;
        id
    }
}

/// Run fire control for every ship in ascending id order.
pub fn run(ships: &mut [ShipState], armory: &mut Armory<'_>, dt: f64) {
    tick_cooldowns(ships, dt);

    for index in 0..ships.len() {
        if !ships[index].in_action() {
            continue;
        }
        let target = select_target(&ships[index], ships)
            .and_then(|id| ships.get(id.index()))
            .map(TargetTrack::of);

        let shooter = &mut ships[index];
        for mount in 0..shooter.weapons.len() {
            let Some(spec) = armory.catalog.weapons.get(&shooter.weapons[mount].weapon) else {
                continue;
            };
            if spec.kind == WeaponKind::PointDefense {
                continue;
            }
            engage(shooter, mount, spec, target, armory, dt);
        }
    }
}

/// Drop any spinal charge and leave the Charging state.
fn reset_charge(weapon: &mut WeaponState) {
    weapon.charge_s = 0.0;
    if weapon.status == WeaponStatus::Charging {
        weapon.status = WeaponStatus::Ready;
    }
}

fn engage(
    shooter: &mut ShipState,
    mount: usize,
    spec: &WeaponSpec,
    target: Option<TargetTrack>,
    armory: &mut Armory<'_>,
    dt: f64,
) {
    let weapon = &mut shooter.weapons[mount];
    if matches!(
        weapon.status,
        WeaponStatus::Disabled | WeaponStatus::Empty | WeaponStatus::CoolingDown
    ) {
        return;
    }
    if weapon.magazine == 0 {
        weapon.status = WeaponStatus::Empty;
        return;
    }

    let mode = shooter.orders.fire_mode;
    let allowed = match spec.kind {
        WeaponKind::Turret | WeaponKind::Spinal => mode.allows_kinetic(),
        WeaponKind::TorpedoLauncher => mode.allows_torpedoes(),
        WeaponKind::PointDefense => false,
    };
    let Some(target) = target.filter(|_| allowed) else {
        weapon.target = None;
        reset_charge(weapon);
        return;
    };
    weapon.target = Some(target.id);

    let rel_pos = target.position - shooter.body.position;
    let range = rel_pos.length();
    if range > spec.range_m || range < 1.0 {
        reset_charge(weapon);
        return;
    }

    // Aim point in the shooter's frame.
    let (aim, _tti) = if spec.kind.is_kinetic() {
        calculate_lead_pip(
            rel_pos,
            target.velocity - shooter.body.velocity,
            spec.muzzle_velocity_m_s,
        )
    } else {
        (rel_pos, 0.0)
    };
    let nose = forward(shooter.body.orientation);
    let half_arc = (spec.pivot_arc_deg * 0.5).to_radians();
    if nose.angle_between(aim) > half_arc + 1e-12 {
        reset_charge(weapon);
        return;
    }

    if spec.kind == WeaponKind::Spinal && spec.charge_time_s > 0.0 {
        weapon.status = WeaponStatus::Charging;
        weapon.charge_s += dt;
        if weapon.charge_s + 1e-9 < spec.charge_time_s {
            return;
        }
        weapon.charge_s = 0.0;
    }

    let rounds = spec.salvo_size.min(weapon.magazine);
    if rounds == 0 {
        return;
    }
    let label = weapon.label.clone();
    let p_hit = hit_chance(range, spec.range_m, shooter.thermal.heat_percent(), armory.config);

    for _ in 0..rounds {
        if spec.kind == WeaponKind::TorpedoLauncher {
            launch_torpedo(shooter, &label, spec, target, aim, armory);
        } else {
            fire_round(shooter, &label, spec, target, aim, p_hit, armory);
        }
    }

    // Bookkeeping for the whole salvo.
    let reactor = shooter.modules.health_of(ModuleKind::Reactor);
    let cooldown = spec.cooldown_s / reactor.max(MIN_REACTOR_EFFECTIVENESS);
    thermal::add_heat(shooter, spec.heat_per_round_j * rounds as f64);
    shooter.mass.ordnance_kg =
        (shooter.mass.ordnance_kg - spec.round_mass_kg * rounds as f64).max(0.0);

    let id = shooter.id;
    let weapon = &mut shooter.weapons[mount];
    weapon.magazine -= rounds;
    weapon.cooldown_remaining_s = cooldown;
    weapon.status = if cooldown > 0.0 {
        WeaponStatus::CoolingDown
    } else {
        WeaponStatus::Ready
    };
    if weapon.magazine == 0 {
        weapon.status = WeaponStatus::Empty;
        tracing::debug!(ship = %id, weapon = %label, "magazine empty");
        armory.events.push(
            PendingEvent::new(EventPayload::WeaponDepleted { weapon: label }).by(id),
        );
    }
}

/// Deliberate miss: push the aim point a few hit radii off the target along
/// a random perpendicular.
fn miss_offset(aim: Vec3, hit_radius_m: f64, rng: &mut ChaCha8Rng) -> Vec3 {
    let axis = aim.normalize_or_zero();
    if axis == Vec3::ZERO {
        return aim;
    }
    let spin = rng.gen_range(0.0..std::f64::consts::TAU);
    let radii = rng.gen_range(MISS_OFFSET_MIN_RADII..MISS_OFFSET_MAX_RADII);
    let perp = Quat::from_axis_angle(axis, spin) * axis.any_orthonormal_vector();
    aim + perp * (radii * hit_radius_m)
}

fn fire_round(
    shooter: &ShipState,
    label: &str,
    spec: &WeaponSpec,
    target: TargetTrack,
    aim: Vec3,
    p_hit: f64,
    armory: &mut Armory<'_>,
) {
    let aimed_hit = armory.rng.gen_bool(p_hit);
    let point = if aimed_hit {
        aim
    } else {
        miss_offset(aim, target.hit_radius_m, armory.rng)
    };
    let direction = point.normalize_or_zero();
    let velocity = shooter.body.velocity + direction * spec.muzzle_velocity_m_s;

    let id = armory.allocate_id();
    armory.world.spawn((
        Projectile {
            id,
            kind: ProjectileKind::Slug,
            source: shooter.id,
            side: shooter.side,
            target: Some(target.id),
            weapon: label.to_string(),
            mass_kg: spec.round_mass_kg,
            launch_position: shooter.body.position,
            age_s: 0.0,
            max_range_m: spec.range_m,
            pd_absorbed_j: 0.0,
        },
        Kinematics {
            position: shooter.body.position,
            velocity,
            prev_position: shooter.body.position,
        },
    ));

    tracing::debug!(ship = %shooter.id, projectile = %id, weapon = label, aimed_hit, "round fired");
    armory.events.push(
        PendingEvent::new(EventPayload::ProjectileLaunched {
            weapon: label.to_string(),
            projectile: id,
            mass_kg: spec.round_mass_kg,
            velocity,
            aimed_hit,
        })
        .by(shooter.id)
        .on(target.id),
    );
}

fn launch_torpedo(
    shooter: &ShipState,
    label: &str,
    spec: &WeaponSpec,
    target: TargetTrack,
    aim: Vec3,
    armory: &mut Armory<'_>,
) {
    let Some(torpedo) = spec
        .torpedo
        .as_ref()
        .and_then(|name| armory.catalog.torpedoes.get(name).map(|t| (name, t)))
    else {
        return;
    };
    let (name, torpedo_spec) = torpedo;
    let velocity = shooter.body.velocity + aim.normalize_or_zero() * spec.muzzle_velocity_m_s;

    let id = armory.allocate_id();
    armory.world.spawn((
        Projectile {
            id,
            kind: ProjectileKind::Torpedo,
            source: shooter.id,
            side: shooter.side,
            target: Some(target.id),
            weapon: label.to_string(),
            mass_kg: torpedo_spec.mass_kg,
            launch_position: shooter.body.position,
            age_s: 0.0,
            max_range_m: spec.range_m,
            pd_absorbed_j: 0.0,
        },
        Kinematics {
            position: shooter.body.position,
            velocity,
            prev_position: shooter.body.position,
        },
        Guidance {
            torpedo: name.clone(),
            dry_mass_kg: torpedo_spec.dry_mass_kg(),
            propellant_kg: torpedo_spec.propellant_kg(),
            initial_propellant_kg: torpedo_spec.propellant_kg(),
            terminal: false,
            ballistic: false,
            condition: TorpedoCondition::Guided,
            absorbed_j: 0.0,
        },
    ));

    tracing::debug!(ship = %shooter.id, projectile = %id, weapon = label, "torpedo launched");
    armory.events.push(
        PendingEvent::new(EventPayload::TorpedoLaunched {
            weapon: label.to_string(),
            projectile: id,
            mass_kg: torpedo_spec.mass_kg,
        })
        .by(shooter.id)
        .on(target.id),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use broadside_core::setup::ShipPlacement;

    use crate::world_setup::build_ship;

    fn duel(range: f64) -> (Catalog, Vec<ShipState>) {
        let catalog = Catalog::standard();
        let place = |name: &str, class: &str, side, x: f64, facing: Vec3| ShipPlacement {
            name: name.to_string(),
            class: class.to_string(),
            side,
            position: Vec3::new(x, 0.0, 0.0),
            velocity: Vec3::ZERO,
            facing: Some(facing),
        };
        let ships = vec![
            build_ship(ShipId(0), &place("A", "destroyer", Side::Alpha, 0.0, Vec3::X), &catalog)
                .unwrap(),
            build_ship(ShipId(1), &place("B", "corvette", Side::Beta, range, -Vec3::X), &catalog)
                .unwrap(),
        ];
        (catalog, ships)
    }

    struct Harness {
        world: World,
        rng: ChaCha8Rng,
        next_id: u64,
        events: Vec<PendingEvent>,
        config: BattleConfig,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                world: World::new(),
                rng: ChaCha8Rng::seed_from_u64(7),
                next_id: 1,
                events: Vec::new(),
                config: BattleConfig::default(),
            }
        }

        fn step(&mut self, catalog: &Catalog, ships: &mut [ShipState]) {
            let mut armory = Armory {
                world: &mut self.world,
                catalog,
                config: &self.config,
                rng: &mut self.rng,
                next_projectile_id: &mut self.next_id,
                events: &mut self.events,
            };
            run(ships, &mut armory, DT);
        }

        fn launches(&self) -> usize {
            self.events
                .iter()
                .filter(|e| {
                    matches!(
                        e.payload,
                        EventPayload::ProjectileLaunched { .. } | EventPayload::TorpedoLaunched { .. }
                    )
                })
                .count()
        }
    }

    fn mount<'a>(ship: &'a ShipState, label: &str) -> &'a WeaponState {
        ship.weapons.iter().find(|w| w.label == label).unwrap()
    }

    #[test]
    fn test_hold_fire_never_fires() {
        let (catalog, mut ships) = duel(50_000.0);
        let mut h = Harness::new();
        for _ in 0..100 {
            h.step(&catalog, &mut ships);
        }
        assert_eq!(h.launches(), 0);
    }

    #[test]
    fn test_salvo_decrements_magazine_and_mass() {
        let (catalog, mut ships) = duel(50_000.0);
        ships[0].orders.fire_mode = FireMode::KineticOnly;
        let mass_before = ships[0].mass.total_kg();
        let heat_before = ships[0].thermal.heat_j;
        let mut h = Harness::new();
        h.step(&catalog, &mut ships);

        let coilgun = mount(&ships[0], "Coilgun Battery");
        assert_eq!(coilgun.magazine, 395);
        assert_eq!(coilgun.status, WeaponStatus::CoolingDown);
        assert!((mass_before - ships[0].mass.total_kg() - 25.0).abs() < 1e-6);
        assert!((ships[0].thermal.heat_j - heat_before - 5e8).abs() < 1e-3);
        assert_eq!(h.launches(), 5, "Spinal is still charging");
    }

    #[test]
    fn test_cooldown_blocks_refire() {
        let (catalog, mut ships) = duel(50_000.0);
        ships[0].orders.fire_mode = FireMode::KineticOnly;
        let mut h = Harness::new();
        // 5 s cooldown = 50 ticks; the spinal needs 100 ticks of charge.
        for _ in 0..50 {
            h.step(&catalog, &mut ships);
        }
        assert_eq!(h.launches(), 5);
        h.step(&catalog, &mut ships);
        assert_eq!(h.launches(), 10, "Ready again after the cooldown");
    }

    #[test]
    fn test_empty_magazine_never_fires() {
        let (catalog, mut ships) = duel(50_000.0);
        ships[0].orders.fire_mode = FireMode::FireAtWill;
        for w in &mut ships[0].weapons {
            w.magazine = 0;
        }
        let mut h = Harness::new();
        for _ in 0..200 {
            h.step(&catalog, &mut ships);
        }
        assert_eq!(h.launches(), 0);
        assert_eq!(mount(&ships[0], "Coilgun Battery").status, WeaponStatus::Empty);
    }

    #[test]
    fn test_last_rounds_deplete_weapon() {
        let (catalog, mut ships) = duel(50_000.0);
        ships[0].orders.fire_mode = FireMode::KineticOnly;
        let coilgun = ships[0].weapons.iter_mut().find(|w| w.label == "Coilgun Battery").unwrap();
        coilgun.magazine = 3;
        let mut h = Harness::new();
        h.step(&catalog, &mut ships);
        assert_eq!(h.launches(), 3, "Partial salvo with what is left");
        assert_eq!(mount(&ships[0], "Coilgun Battery").status, WeaponStatus::Empty);
        assert!(h
            .events
            .iter()
            .any(|e| matches!(e.payload, EventPayload::WeaponDepleted { .. })));
    }

    #[test]
    fn test_spinal_charges_only_when_aligned() {
        let (catalog, mut ships) = duel(50_000.0);
        ships[0].orders.fire_mode = FireMode::KineticOnly;
        let mut h = Harness::new();
        for _ in 0..100 {
            h.step(&catalog, &mut ships);
        }
        let spinal_shots = h
            .events
            .iter()
            .filter(|e| matches!(&e.payload, EventPayload::ProjectileLaunched { weapon, .. } if weapon == "Spinal Coiler"))
            .count();
        assert_eq!(spinal_shots, 1, "Fires once charge completes");

        // Turn the shooter away: charge never builds.
        let (catalog, mut ships) = duel(50_000.0);
        ships[0].orders.fire_mode = FireMode::KineticOnly;
        ships[0].body.orientation = Quat::from_rotation_z(0.5);
        let mut h = Harness::new();
        for _ in 0..200 {
            h.step(&catalog, &mut ships);
        }
        assert_eq!(mount(&ships[0], "Spinal Coiler").charge_s, 0.0);
    }

    #[test]
    fn test_torpedoes_need_torpedo_mode() {
        let (catalog, mut ships) = duel(600_000.0);
        ships[0].orders.fire_mode = FireMode::KineticOnly;
        let mut h = Harness::new();
        h.step(&catalog, &mut ships);
        assert_eq!(h.launches(), 0, "Only the torpedo launcher reaches 600 km");

        ships[0].orders.fire_mode = FireMode::TorpedoesOnly;
        let before = ships[0].mass.ordnance_kg;
        h.step(&catalog, &mut ships);
        assert_eq!(h.launches(), 1);
        assert!((before - ships[0].mass.ordnance_kg - 1600.0).abs() < 1e-6);
        let mut q = h.world.query::<&Guidance>();
        assert_eq!(q.iter().count(), 1);
    }

    #[test]
    fn test_hit_chance_falls_with_range_and_heat() {
        let config = BattleConfig::default();
        let close = hit_chance(0.0, 200_000.0, 0.0, &config);
        let far = hit_chance(200_000.0, 200_000.0, 0.0, &config);
        let hot = hit_chance(0.0, 200_000.0, 95.0, &config);
        assert!((close - 0.9).abs() < 1e-12);
        assert!((far - 0.45).abs() < 1e-12);
        assert!((hot - 0.09).abs() < 1e-12);
    }
}
