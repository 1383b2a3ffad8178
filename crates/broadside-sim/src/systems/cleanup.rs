//! Cleanup system: removes projectiles that can no longer matter.

use hecs::{Entity, World};

use broadside_core::catalog::Catalog;
use broadside_core::components::{Guidance, Kinematics, Projectile, ShipState};
use broadside_core::constants::SLUG_MAX_FLIGHT_SECS;
use broadside_core::enums::{ProjectileKind, TorpedoCondition};
use broadside_core::events::{EventPayload, PendingEvent};

/// A slug is spent once it is moving away from every enemy ship and is
/// more than twice its weapon range from each of them.
fn slug_spent(projectile: &Projectile, kin: &Kinematics, ships: &[ShipState]) -> bool {
    let reach = projectile.max_range_m * 2.0;
    ships
        .iter()
        .filter(|s| s.side != projectile.side && s.in_action())
        .all(|ship| {
            let rel_pos = kin.position - ship.body.position;
            let rel_vel = kin.velocity - ship.body.velocity;
            rel_pos.dot(rel_vel) > 0.0 && rel_pos.length() > reach
        })
}

/// Remove expired projectiles.
/// Uses a pre-allocated buffer to avoid per-tick allocation.
pub fn run(
    world: &mut World,
    ships: &[ShipState],
    catalog: &Catalog,
    events: &mut Vec<PendingEvent>,
    despawn_buffer: &mut Vec<Entity>,
) {
    despawn_buffer.clear();
    let mut expired = Vec::new();

    for (entity, (projectile, kin, guidance)) in
        world.query_mut::<(&Projectile, &Kinematics, Option<&Guidance>)>()
    {
        let done = match (projectile.kind, guidance) {
            (_, Some(g)) if g.condition == TorpedoCondition::Detonated => true,
            (_, Some(g)) => catalog
                .torpedoes
                .get(&g.torpedo)
                .map_or(true, |spec| projectile.age_s > spec.lifetime_s),
            (ProjectileKind::Slug, None) => {
                projectile.age_s > SLUG_MAX_FLIGHT_SECS || slug_spent(projectile, kin, ships)
            }
            (ProjectileKind::Torpedo, None) => projectile.age_s > SLUG_MAX_FLIGHT_SECS,
        };
        if done {
            despawn_buffer.push(entity);
            expired.push((projectile.id, projectile.kind));
        }
    }

    expired.sort_by_key(|(id, _)| *id);
    for (id, kind) in expired {
        tracing::debug!(projectile = %id, ?kind, "projectile expired");
        events.push(PendingEvent::new(EventPayload::ProjectileExpired { kind }).on(id));
    }

    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadside_core::enums::Side;
    use broadside_core::setup::ShipPlacement;
    use broadside_core::types::{ProjectileId, ShipId, Vec3};

    use crate::world_setup::build_ship;

    fn enemy() -> Vec<ShipState> {
        let placement = ShipPlacement {
            name: "Enemy".to_string(),
            class: "corvette".to_string(),
            side: Side::Beta,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            facing: None,
        };
        vec![build_ship(ShipId(0), &placement, &Catalog::standard()).unwrap()]
    }

    fn slug(world: &mut World, x: f64, vx: f64, age_s: f64) -> Entity {
        world.spawn((
            Projectile {
                id: ProjectileId(1),
                kind: ProjectileKind::Slug,
                source: ShipId(1),
                side: Side::Alpha,
                target: Some(ShipId(0)),
                weapon: "Coilgun Battery".to_string(),
                mass_kg: 5.0,
                launch_position: Vec3::ZERO,
                age_s,
                max_range_m: 200_000.0,
                pd_absorbed_j: 0.0,
            },
            Kinematics {
                position: Vec3::new(x, 0.0, 0.0),
                velocity: Vec3::new(vx, 0.0, 0.0),
                prev_position: Vec3::new(x, 0.0, 0.0),
            },
        ))
    }

    fn sweep(world: &mut World, ships: &[ShipState]) -> Vec<PendingEvent> {
        let mut events = Vec::new();
        let mut buffer = Vec::new();
        run(world, ships, &Catalog::standard(), &mut events, &mut buffer);
        events
    }

    #[test]
    fn test_receding_slug_beyond_reach_expires() {
        let ships = enemy();
        let mut world = World::new();
        let gone = slug(&mut world, 500_000.0, 10_000.0, 50.0);
        let events = sweep(&mut world, &ships);
        assert!(world.get::<&Projectile>(gone).is_err());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload.kind_name(), "ProjectileExpired");
    }

    #[test]
    fn test_inbound_slug_survives() {
        let ships = enemy();
        let mut world = World::new();
        let inbound = slug(&mut world, 500_000.0, -10_000.0, 50.0);
        let near = slug(&mut world, 100_000.0, 10_000.0, 50.0);
        assert!(sweep(&mut world, &ships).is_empty());
        assert!(world.get::<&Projectile>(inbound).is_ok(), "Still closing");
        assert!(world.get::<&Projectile>(near).is_ok(), "Inside twice the range");
    }

    #[test]
    fn test_old_slug_expires() {
        let ships = enemy();
        let mut world = World::new();
        let old = slug(&mut world, 10_000.0, -10_000.0, SLUG_MAX_FLIGHT_SECS + 0.1);
        sweep(&mut world, &ships);
        assert!(world.get::<&Projectile>(old).is_err());
    }
}
