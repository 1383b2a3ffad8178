//! Ship construction from catalog templates and battle placements.
//!
//! Ships are built into the orchestrator's arena; projectiles are spawned
//! into the hecs world by fire control.

use broadside_core::catalog::Catalog;
use broadside_core::components::*;
use broadside_core::enums::*;
use broadside_core::error::{CombatError, Result};
use broadside_core::orders::OrderSet;
use broadside_core::setup::{BattleSetup, ShipPlacement};
use broadside_core::types::{facing, ShipId, Vec3};

/// Nose direction for a placement without an explicit facing: toward the
/// centroid of the opposing side.
pub fn default_facing(setup: &BattleSetup, index: usize) -> Vec3 {
    let Some(ship) = setup.ships.get(index) else {
        return Vec3::X;
    };
    if let Some(dir) = ship.facing.filter(|d| d.length_squared() > 0.0) {
        return dir;
    }
    let enemies: Vec<Vec3> = setup
        .ships
        .iter()
        .filter(|s| s.side != ship.side)
        .map(|s| s.position)
        .collect();
    if enemies.is_empty() {
        return Vec3::X;
    }
    let centroid = enemies.iter().copied().sum::<Vec3>() / enemies.len() as f64;
    let dir = centroid - ship.position;
    if dir.length_squared() > 0.0 {
        dir
    } else {
        Vec3::X
    }
}

/// Build a ship from its class template.
pub fn build_ship(id: ShipId, placement: &ShipPlacement, catalog: &Catalog) -> Result<ShipState> {
    let class = catalog.class(&placement.class)?;
    let material = catalog
        .materials
        .get(&class.armor_material)
        .cloned()
        .ok_or_else(|| CombatError::UnknownMaterial {
            class: placement.class.clone(),
            material: class.armor_material.clone(),
        })?;

    let modules = ModuleGraph::linear(&class.modules);

    let mut weapons = Vec::with_capacity(class.weapons.len());
    let mut ordnance_kg = 0.0;
    for mount in &class.weapons {
        let spec = catalog
            .weapons
            .get(&mount.weapon)
            .ok_or_else(|| CombatError::UnknownWeapon {
                class: placement.class.clone(),
                weapon: mount.weapon.clone(),
            })?;
        let module = modules
            .index_of(&mount.module)
            .ok_or_else(|| CombatError::UnknownMountModule {
                class: placement.class.clone(),
                weapon: mount.weapon.clone(),
                module: mount.module.clone(),
            })?;
        ordnance_kg += spec.magazine as f64 * spec.round_mass_kg;
        let status = if spec.kind != WeaponKind::PointDefense && spec.magazine == 0 {
            WeaponStatus::Empty
        } else {
            WeaponStatus::Ready
        };
        weapons.push(WeaponState {
            label: mount.label.clone(),
            weapon: mount.weapon.clone(),
            kind: spec.kind,
            module,
            status,
            cooldown_remaining_s: 0.0,
            magazine: spec.magazine,
            target: None,
            charge_s: 0.0,
            tracking: None,
        });
    }

    let zone = |kind, thickness_cm: f64| ArmorZone {
        kind,
        thickness_cm,
        initial_cm: thickness_cm,
    };
    let nose = placement.facing.unwrap_or(Vec3::X);

    Ok(ShipState {
        id,
        name: placement.name.clone(),
        class: placement.class.clone(),
        side: placement.side,
        status: ShipStatus::Active,
        loss_cause: None,
        body: RigidBody {
            position: placement.position,
            velocity: placement.velocity,
            orientation: facing(nose),
            angular_velocity: Vec3::ZERO,
        },
        mass: MassState {
            dry_kg: class.dry_mass_kg,
            propellant_kg: class.propellant_kg,
            ordnance_kg,
        },
        drive: DriveLimits {
            max_thrust_n: class.max_thrust_n,
            exhaust_velocity_m_s: class.exhaust_velocity_m_s,
            max_rcs_torque_nm: class.max_rcs_torque_nm,
            max_turn_rate_rad_s: class.max_turn_rate_rad_s,
            pivot_rad: class.drive_pivot_deg.to_radians(),
            length_m: class.length_m,
        },
        hit_radius_m: class.hit_radius_m,
        armor: ArmorSet {
            material,
            nose: zone(ArmorZoneKind::Nose, class.armor.nose_cm),
            lateral: zone(ArmorZoneKind::Lateral, class.armor.lateral_cm),
            tail: zone(ArmorZoneKind::Tail, class.armor.tail_cm),
        },
        modules,
        structure: Structure {
            max_hp: class.structure_hp,
            hp: class.structure_hp,
        },
        thermal: ThermalState {
            heat_j: 0.0,
            sink_capacity_j: class.heat_sink_j,
            radiators_extended: false,
            radiator_integrity: 1.0,
            reactor_heat_w: class.reactor_heat_w,
            drive_heat_w_per_n: class.drive_heat_w_per_n,
            radiator_extended_w: class.radiator_extended_w,
            radiator_retracted_w: class.radiator_retracted_w,
            warned_band: HeatBand::Nominal,
            overheated: false,
        },
        weapons,
        orders: OrderSet::default(),
        last_thrust_n: 0.0,
        tally: DamageTally::default(),
    })
}

/// Build every ship of a setup, ids in placement order.
pub fn build_fleet(setup: &BattleSetup, catalog: &Catalog) -> Result<Vec<ShipState>> {
    setup
        .ships
        .iter()
        .enumerate()
        .map(|(index, placement)| {
            let placement = ShipPlacement {
                facing: Some(default_facing(setup, index)),
                ..placement.clone()
            };
            build_ship(ShipId(index as u32), &placement, catalog)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadside_core::types::forward;

    fn placement(name: &str, side: Side, x: f64) -> ShipPlacement {
        ShipPlacement {
            name: name.to_string(),
            class: "destroyer".to_string(),
            side,
            position: Vec3::new(x, 0.0, 0.0),
            velocity: Vec3::ZERO,
            facing: None,
        }
    }

    #[test]
    fn test_destroyer_loadout() {
        let ship = build_ship(ShipId(3), &placement("D", Side::Alpha, 0.0), &Catalog::standard())
            .unwrap();
        assert_eq!(ship.id, ShipId(3));
        assert_eq!(ship.weapons.len(), 5);
        assert_eq!(ship.modules.len(), 9);
        // 400×5 + 30×88 + 8×1600
        assert!((ship.mass.ordnance_kg - 17_440.0).abs() < 1e-9);
        let aft_pd = ship.weapons.iter().find(|w| w.label == "PD Laser Aft").unwrap();
        assert_eq!(aft_pd.module, 7, "Mounted on the fuel tank");
        assert!(ship.weapons.iter().all(|w| w.status == WeaponStatus::Ready));
        assert!(!ship.thermal.radiators_extended, "Radiators start retracted");
    }

    #[test]
    fn test_unknown_class_rejected() {
        let mut p = placement("X", Side::Alpha, 0.0);
        p.class = "battleship".to_string();
        assert!(matches!(
            build_ship(ShipId(0), &p, &Catalog::standard()),
            Err(CombatError::UnknownShipClass(_))
        ));
    }

    #[test]
    fn test_fleet_faces_enemy_centroid() {
        let setup = BattleSetup {
            ships: vec![
                placement("A", Side::Alpha, 0.0),
                placement("B", Side::Beta, 100_000.0),
            ],
        };
        let fleet = build_fleet(&setup, &Catalog::standard()).unwrap();
        assert!(forward(fleet[0].body.orientation).x > 0.999);
        assert!(forward(fleet[1].body.orientation).x < -0.999);
        assert_eq!(fleet[1].id, ShipId(1));
    }
}
