//! Maneuver controller: turns a ship's standing maneuver order into a drive
//! and RCS command for the physics step.

use std::f64::consts::FRAC_PI_2;

use broadside_core::components::ShipState;
use broadside_core::config::BattleConfig;
use broadside_core::constants::{
    ATTITUDE_GAIN, BRAKE_STOP_SPEED, INTERCEPT_MAX_LOOKAHEAD_SECS, INTERCEPT_MIN_CLOSING,
};
use broadside_core::enums::{ManeuverKind, ModuleKind};
use broadside_core::types::{clip_to_cone, forward, Quat, ShipId, Vec3};

use super::physics::{moment_of_inertia, ThrustCommand};

/// What the maneuver wants before attitude limits.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Steering {
    /// `None` holds attitude (null rotation).
    direction: Option<Vec3>,
    throttle: f64,
    /// Upper bound on thrust, used by BRAKE to avoid overshooting zero.
    thrust_cap_n: f64,
}

impl Steering {
    fn hold() -> Self {
        Self {
            direction: None,
            throttle: 0.0,
            thrust_cap_n: f64::INFINITY,
        }
    }

    fn toward(direction: Vec3, throttle: f64) -> Self {
        let direction = direction.normalize_or_zero();
        Self {
            direction: (direction != Vec3::ZERO).then_some(direction),
            throttle,
            thrust_cap_n: f64::INFINITY,
        }
    }
}

fn live_target(ships: &[ShipState], id: Option<ShipId>) -> Option<&ShipState> {
    id.and_then(|id| ships.get(id.index()))
        .filter(|t| t.in_action())
}

/// Nearest enemy still in action (lowest id on ties).
pub fn nearest_enemy<'a>(ship: &ShipState, ships: &'a [ShipState]) -> Option<&'a ShipState> {
    ships
        .iter()
        .filter(|other| other.side != ship.side && other.in_action())
        .min_by(|a, b| {
            let da = a.body.position.distance_squared(ship.body.position);
            let db = b.body.position.distance_squared(ship.body.position);
            da.total_cmp(&db).then(a.id.cmp(&b.id))
        })
}

/// Aim direction for closing on a moving target.
pub fn intercept_direction(ship: &ShipState, target: &ShipState) -> Vec3 {
    let rel_pos = target.body.position - ship.body.position;
    let rel_vel = target.body.velocity - ship.body.velocity;
    let range = rel_pos.length();
    if range < 1.0 {
        return -rel_vel;
    }
    let closing = -rel_vel.dot(rel_pos / range);
    let t_go = (range / closing.max(INTERCEPT_MIN_CLOSING)).min(INTERCEPT_MAX_LOOKAHEAD_SECS);
    rel_pos + rel_vel * t_go
}

/// Jink direction perpendicular to the line of sight, stepping 90° about it
/// every `period_s`.
pub fn evasive_direction(los: Vec3, elapsed_s: f64, period_s: f64) -> Vec3 {
    let los = los.normalize_or_zero();
    if los == Vec3::ZERO {
        return Vec3::ZERO;
    }
    let mut perp = los.cross(Vec3::Z);
    if perp.length_squared() < 1e-12 {
        perp = los.any_orthonormal_vector();
    }
    let step = (elapsed_s / period_s.max(f64::EPSILON)).floor();
    Quat::from_axis_angle(los, step * FRAC_PI_2) * perp.normalize()
}

fn steering(
    ship: &ShipState,
    ships: &[ShipState],
    elapsed_s: f64,
    config: &BattleConfig,
    dt: f64,
) -> Steering {
    let orders = &ship.orders;
    match orders.maneuver {
        ManeuverKind::Maintain | ManeuverKind::Unrecognized => Steering::hold(),
        ManeuverKind::Intercept => match live_target(ships, orders.maneuver_target) {
            Some(target) => Steering::toward(intercept_direction(ship, target), orders.throttle),
            None => Steering::hold(),
        },
        ManeuverKind::Padlock => match live_target(ships, orders.maneuver_target) {
            Some(target) => Steering::toward(target.body.position - ship.body.position, 0.0),
            None => Steering::hold(),
        },
        ManeuverKind::Evasive => {
            let threat = live_target(ships, orders.maneuver_target)
                .or_else(|| nearest_enemy(ship, ships));
            match threat {
                Some(enemy) => {
                    let los = enemy.body.position - ship.body.position;
                    Steering::toward(
                        evasive_direction(los, elapsed_s, config.evasive_jink_period_s),
                        orders.throttle,
                    )
                }
                None => Steering::hold(),
            }
        }
        ManeuverKind::Brake => {
            let speed = ship.body.velocity.length();
            if speed < BRAKE_STOP_SPEED {
                return Steering::hold();
            }
            Steering {
                thrust_cap_n: ship.mass.total_kg() * speed / dt,
                ..Steering::toward(-ship.body.velocity, orders.throttle)
            }
        }
        ManeuverKind::Heading => match orders.heading {
            Some(heading) => Steering::toward(heading, orders.throttle),
            None => Steering::hold(),
        },
    }
}

/// RCS torque that drives the nose toward `desired` (or nulls rotation).
fn attitude_torque(ship: &ShipState, desired: Option<Vec3>, dt: f64) -> Vec3 {
    let drive = &ship.drive;
    let target_rate = match desired {
        None => Vec3::ZERO,
        Some(dir) => {
            let nose = forward(ship.body.orientation);
            let angle = nose.angle_between(dir);
            let mut axis = nose.cross(dir);
            if axis.length_squared() < 1e-18 {
                axis = if angle > FRAC_PI_2 {
                    nose.any_orthonormal_vector()
                } else {
                    Vec3::ZERO
                };
            }
            let rate = (angle * ATTITUDE_GAIN).min(drive.max_turn_rate_rad_s);
            axis.normalize_or_zero() * rate
        }
    };
    let inertia = moment_of_inertia(ship.mass.total_kg(), drive.length_m.max(1.0));
    let torque = (target_rate - ship.body.angular_velocity) * inertia / dt;
    crate::guidance::clip_magnitude(torque, drive.max_rcs_torque_nm)
}

/// Drive and RCS command for one ship.
pub fn command_for(
    ship: &ShipState,
    ships: &[ShipState],
    elapsed_s: f64,
    config: &BattleConfig,
    dt: f64,
) -> ThrustCommand {
    if !ship.in_action() {
        return ThrustCommand::COAST;
    }
    let steer = steering(ship, ships, elapsed_s, config, dt);
    let torque_nm = attitude_torque(ship, steer.direction, dt);

    let Some(direction) = steer.direction else {
        return ThrustCommand {
            torque_nm,
            ..ThrustCommand::COAST
        };
    };
    let engine_health = ship.modules.health_of(ModuleKind::Engine);
    let thrust_n = (steer.throttle.clamp(0.0, 1.0) * ship.drive.max_thrust_n * engine_health)
        .min(steer.thrust_cap_n);
    ThrustCommand {
        direction: clip_to_cone(forward(ship.body.orientation), direction, ship.drive.pivot_rad),
        thrust_n,
        torque_nm,
    }
}

/// Compute commands for every ship, indexed like `ships`.
pub fn run(
    ships: &[ShipState],
    elapsed_s: f64,
    config: &BattleConfig,
    dt: f64,
    commands: &mut Vec<ThrustCommand>,
) {
    commands.clear();
    commands.extend(
        ships
            .iter()
            .map(|ship| command_for(ship, ships, elapsed_s, config, dt)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadside_core::catalog::Catalog;
    use broadside_core::constants::DT;
    use broadside_core::enums::Side;
    use broadside_core::setup::ShipPlacement;

    use crate::world_setup::build_ship;

    fn pair() -> Vec<ShipState> {
        let catalog = Catalog::standard();
        let place = |name: &str, side, x: f64| ShipPlacement {
            name: name.to_string(),
            class: "corvette".to_string(),
            side,
            position: Vec3::new(x, 0.0, 0.0),
            velocity: Vec3::ZERO,
            facing: Some(Vec3::X),
        };
        vec![
            build_ship(ShipId(0), &place("A", Side::Alpha, 0.0), &catalog).unwrap(),
            build_ship(ShipId(1), &place("B", Side::Beta, 100_000.0), &catalog).unwrap(),
        ]
    }

    #[test]
    fn test_maintain_coasts_and_nulls_rotation() {
        let mut ships = pair();
        ships[0].body.angular_velocity = Vec3::new(0.0, 0.0, 0.05);
        let cmd = command_for(&ships[0], &ships, 0.0, &BattleConfig::default(), DT);
        assert_eq!(cmd.thrust_n, 0.0);
        assert!(cmd.torque_nm.z < 0.0, "RCS opposes the spin");
    }

    #[test]
    fn test_intercept_thrusts_toward_target() {
        let mut ships = pair();
        ships[0].orders.maneuver = ManeuverKind::Intercept;
        ships[0].orders.throttle = 1.0;
        ships[0].orders.maneuver_target = Some(ShipId(1));
        let cmd = command_for(&ships[0], &ships, 0.0, &BattleConfig::default(), DT);
        assert!((cmd.thrust_n - ships[0].drive.max_thrust_n).abs() < 1e-6);
        assert!(cmd.direction.x > 0.99, "Thrust along +X: {:?}", cmd.direction);
    }

    #[test]
    fn test_thrust_clipped_to_pivot_cone() {
        let mut ships = pair();
        ships[0].orders.maneuver = ManeuverKind::Heading;
        ships[0].orders.throttle = 1.0;
        ships[0].orders.heading = Some(Vec3::Y);
        let cmd = command_for(&ships[0], &ships, 0.0, &BattleConfig::default(), DT);
        let off_axis = Vec3::X.angle_between(cmd.direction);
        assert!(
            (off_axis - ships[0].drive.pivot_rad).abs() < 1e-9,
            "Drive gimbal limit: {off_axis}"
        );
    }

    #[test]
    fn test_brake_stops_below_threshold() {
        let mut ships = pair();
        ships[0].orders.maneuver = ManeuverKind::Brake;
        ships[0].orders.throttle = 1.0;
        ships[0].body.velocity = Vec3::new(0.5, 0.0, 0.0);
        let cmd = command_for(&ships[0], &ships, 0.0, &BattleConfig::default(), DT);
        assert_eq!(cmd.thrust_n, 0.0);

        ships[0].body.velocity = Vec3::new(-2.0, 0.0, 0.0);
        let cmd = command_for(&ships[0], &ships, 0.0, &BattleConfig::default(), DT);
        let cap = ships[0].mass.total_kg() * 2.0 / DT;
        assert!(cmd.thrust_n <= cap + 1e-6, "Brake never overshoots zero");
    }

    #[test]
    fn test_evasive_jinks_perpendicular_to_los() {
        let los = Vec3::new(1.0, 0.0, 0.0);
        let first = evasive_direction(los, 0.0, 8.0);
        let second = evasive_direction(los, 8.5, 8.0);
        assert!(first.dot(los).abs() < 1e-12);
        assert!(second.dot(los).abs() < 1e-12);
        assert!(first.dot(second).abs() < 1e-12, "Quarter turn each period");
    }

    #[test]
    fn test_engine_damage_scales_thrust() {
        let mut ships = pair();
        let engine = ships[0].modules.index_of("Main Engine Assembly").unwrap();
        ships[0].modules.modules[engine].hp *= 0.5;
        ships[0].orders.maneuver = ManeuverKind::Heading;
        ships[0].orders.throttle = 1.0;
        ships[0].orders.heading = Some(Vec3::X);
        let cmd = command_for(&ships[0], &ships, 0.0, &BattleConfig::default(), DT);
        assert!((cmd.thrust_n - ships[0].drive.max_thrust_n * 0.5).abs() < 1e-3);
    }
}
