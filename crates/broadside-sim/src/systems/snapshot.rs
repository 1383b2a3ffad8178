//! Snapshot system: builds the flattened state trace from the world.

use std::collections::BTreeMap;

use hecs::World;

use broadside_core::catalog::Catalog;
use broadside_core::components::{Guidance, Kinematics, Projectile, ShipState};
use broadside_core::state::{ArmorView, BattleSnapshot, ProjectileView, ShipView, WeaponView};
use broadside_core::types::{forward, SimTime};

fn ship_view(ship: &ShipState, catalog: &Catalog) -> ShipView {
    let modules: BTreeMap<String, f64> = ship
        .modules
        .modules
        .iter()
        .map(|m| (m.name.clone(), m.health_fraction() * 100.0))
        .collect();

    let weapons = ship
        .weapons
        .iter()
        .map(|w| WeaponView {
            label: w.label.clone(),
            kind: w.kind,
            status: w.status,
            magazine: w.magazine,
            cooldown_remaining_s: w.cooldown_remaining_s,
            range_m: catalog.weapons.get(&w.weapon).map_or(0.0, |spec| spec.range_m),
        })
        .collect();

    ShipView {
        id: ship.id,
        name: ship.name.clone(),
        class: ship.class.clone(),
        side: ship.side,
        status: ship.status,
        position: ship.body.position,
        velocity: ship.body.velocity,
        forward: forward(ship.body.orientation),
        hull_percent: ship.structure.fraction() * 100.0,
        armor: ArmorView {
            nose: ship.armor.nose.thickness_cm,
            lateral: ship.armor.lateral.thickness_cm,
            tail: ship.armor.tail.thickness_cm,
        },
        modules,
        heat_percent: ship.thermal.heat_percent(),
        mass_kg: ship.mass.total_kg(),
        propellant_kg: ship.mass.propellant_kg,
        radiators_extended: ship.thermal.radiators_extended,
        weapons,
    }
}

/// Build a snapshot of the current state.
pub fn build_snapshot(
    world: &World,
    ships: &[ShipState],
    catalog: &Catalog,
    time: &SimTime,
) -> BattleSnapshot {
    let mut projectiles: Vec<ProjectileView> = world
        .query::<(&Projectile, &Kinematics, Option<&Guidance>)>()
        .iter()
        .map(|(_, (p, kin, guidance))| ProjectileView {
            id: p.id,
            kind: p.kind,
            source: p.source,
            target: p.target,
            position: kin.position,
            velocity: kin.velocity,
            mass_kg: p.mass_kg,
            condition: guidance.map(|g| g.condition),
            fuel_fraction: guidance.map(Guidance::fuel_fraction),
        })
        .collect();
    projectiles.sort_by_key(|p| p.id);

    BattleSnapshot {
        tick: time.tick,
        time_s: time.elapsed_secs,
        ships: ships.iter().map(|s| ship_view(s, catalog)).collect(),
        projectiles,
    }
}
