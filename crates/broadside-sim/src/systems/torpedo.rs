//! Torpedo guidance system.
//!
//! Midcourse torpedoes fly a collision course toward their target; inside
//! terminal range they switch to proportional navigation. Acceleration is
//! limited by `thrust / mass` and paid for in propellant. A torpedo with dry
//! tanks is ballistic for the rest of its flight.

use hecs::World;

use broadside_core::catalog::Catalog;
use broadside_core::components::{Guidance, Kinematics, Projectile, ShipState};
use broadside_core::enums::TorpedoCondition;
use broadside_core::events::{EventPayload, PendingEvent};
use broadside_core::types::{ShipId, Vec3};

use crate::guidance;

/// Nearest in-action ship not on `side`'s team.
fn nearest_enemy_of(
    ships: &[ShipState],
    side: broadside_core::enums::Side,
    position: Vec3,
) -> Option<ShipId> {
    ships
        .iter()
        .filter(|s| s.side != side && s.in_action())
        .min_by(|a, b| {
            let da = a.body.position.distance_squared(position);
            let db = b.body.position.distance_squared(position);
            da.total_cmp(&db).then(a.id.cmp(&b.id))
        })
        .map(|s| s.id)
}

/// Steer and burn every guided torpedo for one tick.
pub fn run(
    world: &mut World,
    ships: &[ShipState],
    catalog: &Catalog,
    dt: f64,
    events: &mut Vec<PendingEvent>,
) {
    let mut torpedoes: Vec<_> = world
        .query_mut::<(&mut Projectile, &mut Kinematics, &mut Guidance)>()
        .into_iter()
        .collect();
    torpedoes.sort_by_key(|(_, (p, _, _))| p.id);

    for (_entity, (projectile, kin, guide)) in torpedoes {
        if guide.condition != TorpedoCondition::Guided || guide.ballistic {
            continue;
        }
        let Some(spec) = catalog.torpedoes.get(&guide.torpedo) else {
            continue;
        };

        // Lost target: take the nearest enemy still fighting.
        let target_live = projectile
            .target
            .and_then(|id| ships.get(id.index()))
            .is_some_and(|t| t.in_action());
        if !target_live {
            projectile.target = nearest_enemy_of(ships, projectile.side, kin.position);
        }
        let Some(target) = projectile.target.and_then(|id| ships.get(id.index())) else {
            continue;
        };

        let range = kin.position.distance(target.body.position);
        if !guide.terminal && range <= spec.terminal_range_m {
            guide.terminal = true;
            tracing::debug!(projectile = %projectile.id, target = %target.id, range, "torpedo terminal");
            events.push(
                PendingEvent::new(EventPayload::TorpedoTerminal { range_m: range })
                    .by(projectile.id)
                    .on(target.id),
            );
        }

        let mass = guide.dry_mass_kg + guide.propellant_kg;
        if mass <= 0.0 {
            continue;
        }
        let max_accel = spec.thrust_n / mass;
        let mut accel = if guide.terminal {
            guidance::proportional_navigation(
                kin.position,
                kin.velocity,
                target.body.position,
                target.body.velocity,
                spec.navigation_constant,
                max_accel,
            )
        } else {
            guidance::collision_course(
                kin.position,
                kin.velocity,
                target.body.position,
                target.body.velocity,
                max_accel,
                dt,
            )
        };

        let mut burn = mass * accel.length() / spec.exhaust_velocity_m_s * dt;
        if burn > guide.propellant_kg {
            accel *= guide.propellant_kg / burn;
            burn = guide.propellant_kg;
        }
        kin.velocity += accel * dt;
        guide.propellant_kg = (guide.propellant_kg - burn).max(0.0);
        projectile.mass_kg = guide.dry_mass_kg + guide.propellant_kg;

        if guide.propellant_kg <= 0.0 {
            guide.ballistic = true;
            tracing::debug!(projectile = %projectile.id, "torpedo out of propellant");
            events.push(PendingEvent::new(EventPayload::TorpedoFuelExhausted).by(projectile.id));
        }
    }
}
