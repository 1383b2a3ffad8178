//! Rigid-body integrator for ships and point-mass integrator for projectiles.
//!
//! Semi-implicit Euler: velocity from acceleration first, then position from
//! the updated velocity. Mass flow follows the rocket equation.

use hecs::World;
use thiserror::Error;

use broadside_core::components::{DriveLimits, Kinematics, MassState, Projectile, RigidBody, ShipState};
use broadside_core::error::EngineFault;
use broadside_core::events::{EventPayload, PendingEvent};
use broadside_core::types::{integrate_orientation, is_finite_vec, Vec3};

/// Drive and RCS command for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThrustCommand {
    /// World-frame thrust direction (unit or zero).
    pub direction: Vec3,
    pub thrust_n: f64,
    /// World-frame RCS torque (N·m).
    pub torque_nm: Vec3,
}

impl ThrustCommand {
    /// No thrust, no torque.
    pub const COAST: ThrustCommand = ThrustCommand {
        direction: Vec3::ZERO,
        thrust_n: 0.0,
        torque_nm: Vec3::ZERO,
    };
}

/// Result of a successful step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub body: RigidBody,
    pub mass: MassState,
    pub propellant_burned_kg: f64,
    pub delivered_thrust_n: f64,
}

/// Degenerate input or output; the caller keeps the previous state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsRejection {
    #[error("mass {0} kg is not a usable positive value")]
    DegenerateMass(f64),
    #[error("non-finite {0} in step input")]
    NonFiniteInput(&'static str),
    #[error("step produced a non-finite state")]
    NonFiniteResult,
}

/// Moment of inertia of a uniform rod about its centre.
pub fn moment_of_inertia(mass_kg: f64, length_m: f64) -> f64 {
    mass_kg * length_m * length_m / 12.0
}

/// Advance one ship body by `dt`.
pub fn integrate(
    body: &RigidBody,
    mass: &MassState,
    drive: &DriveLimits,
    command: &ThrustCommand,
    dt: f64,
) -> Result<StepOutcome, PhysicsRejection> {
    let m = mass.total_kg();
    if !(m.is_finite() && m > 0.0) {
        return Err(PhysicsRejection::DegenerateMass(m));
    }
    if !(is_finite_vec(body.position) && is_finite_vec(body.velocity)) {
        return Err(PhysicsRejection::NonFiniteInput("body state"));
    }
    if !(is_finite_vec(command.direction)
        && command.thrust_n.is_finite()
        && is_finite_vec(command.torque_nm))
    {
        return Err(PhysicsRejection::NonFiniteInput("command"));
    }

    // Rocket-equation mass flow, limited by what is left in the tanks.
    let requested_n = command.thrust_n.clamp(0.0, drive.max_thrust_n);
    let direction = command.direction.normalize_or_zero();
    let wanted_kg = if drive.exhaust_velocity_m_s > 0.0 {
        requested_n / drive.exhaust_velocity_m_s * dt
    } else {
        0.0
    };
    let burned_kg = wanted_kg.min(mass.propellant_kg.max(0.0));
    let delivered_n = if wanted_kg > 0.0 && direction != Vec3::ZERO {
        requested_n * burned_kg / wanted_kg
    } else {
        0.0
    };
    let burned_kg = if delivered_n > 0.0 { burned_kg } else { 0.0 };

    let accel = direction * (delivered_n / m);
    let velocity = body.velocity + accel * dt;
    let position = body.position + velocity * dt;

    // Attitude: isotropic rod inertia, torque and rate limits.
    let inertia = moment_of_inertia(m, drive.length_m.max(1.0));
    let torque = clip(command.torque_nm, drive.max_rcs_torque_nm);
    let angular_velocity = clip(
        body.angular_velocity + torque / inertia * dt,
        drive.max_turn_rate_rad_s,
    );
    let orientation = integrate_orientation(body.orientation, angular_velocity, dt);

    let next = RigidBody {
        position,
        velocity,
        orientation,
        angular_velocity,
    };
    if !(is_finite_vec(next.position)
        && is_finite_vec(next.velocity)
        && is_finite_vec(next.angular_velocity)
        && next.orientation.is_finite())
    {
        return Err(PhysicsRejection::NonFiniteResult);
    }

    Ok(StepOutcome {
        body: next,
        mass: MassState {
            propellant_kg: mass.propellant_kg - burned_kg,
            ..*mass
        },
        propellant_burned_kg: burned_kg,
        delivered_thrust_n: delivered_n,
    })
}

fn clip(v: Vec3, max: f64) -> Vec3 {
    crate::guidance::clip_magnitude(v, max.max(0.0))
}

/// Step every ship with its command. Ships out of action coast.
///
/// A rejected step keeps the ship's previous state and raises a warning
/// event. Negative mass is an engine fault.
pub fn run(
    ships: &mut [ShipState],
    commands: &[ThrustCommand],
    tick: u64,
    dt: f64,
    events: &mut Vec<PendingEvent>,
) -> Result<(), EngineFault> {
    for (ship, command) in ships.iter_mut().zip(commands) {
        let total = ship.mass.total_kg();
        if total < 0.0 || ship.mass.propellant_kg < 0.0 || ship.mass.ordnance_kg < 0.0 {
            return Err(EngineFault::NegativeMass {
                tick,
                ship: ship.id,
                mass_kg: total,
            });
        }

        let command = if ship.in_action() {
            *command
        } else {
            ThrustCommand::COAST
        };
        match integrate(&ship.body, &ship.mass, &ship.drive, &command, dt) {
            Ok(outcome) => {
                ship.body = outcome.body;
                ship.mass = outcome.mass;
                ship.last_thrust_n = outcome.delivered_thrust_n;
            }
            Err(rejection) => {
                tracing::warn!(tick, ship = %ship.id, %rejection, "physics step rejected");
                ship.last_thrust_n = 0.0;
                events.push(
                    PendingEvent::new(EventPayload::PhysicsRejected {
                        reason: rejection.to_string(),
                    })
                    .on(ship.id),
                );
            }
        }
    }
    Ok(())
}

/// Move every projectile along its velocity and age it.
pub fn advance_projectiles(world: &mut World, dt: f64) {
    for (_entity, (projectile, kin)) in world.query_mut::<(&mut Projectile, &mut Kinematics)>() {
        kin.prev_position = kin.position;
        kin.position += kin.velocity * dt;
        projectile.age_s += dt;
    }
}
