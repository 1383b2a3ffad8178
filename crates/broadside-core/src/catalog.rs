//! Static ship, weapon and armor templates.
//!
//! A `Catalog` is loaded once before a battle, validated, shared behind an
//! `Arc`, and never mutated. Battles copy what they need into per-ship state.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::enums::{DamageType, ModuleKind, WeaponKind};
use crate::error::{CombatError, Result};

/// Armor material constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorMaterial {
    /// Thickness that halves kinetic damage (cm).
    pub baryonic_half_value_cm: f64,
    /// Thickness that halves directed-energy damage (cm).
    pub xray_half_value_cm: f64,
    pub density_kg_m3: f64,
    /// Energy to vaporize one kilogram (J/kg); drives ablation.
    pub heat_of_vaporization_j_kg: f64,
}

impl ArmorMaterial {
    pub fn half_value_cm(&self, damage_type: DamageType) -> f64 {
        match damage_type {
            DamageType::Baryonic => self.baryonic_half_value_cm,
            DamageType::XRay => self.xray_half_value_cm,
        }
    }
}

/// Point-defense laser optics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserSpec {
    pub power_w: f64,
    pub aperture_m: f64,
    pub wavelength_m: f64,
    /// Cross-section of a typical incoming projectile (m²).
    pub target_cross_section_m2: f64,
    /// Waste heat while firing (W).
    pub heat_per_second_j: f64,
}

/// Weapon template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponSpec {
    pub kind: WeaponKind,
    /// Rounds per salvo.
    pub salvo_size: u32,
    pub round_mass_kg: f64,
    pub muzzle_velocity_m_s: f64,
    pub cooldown_s: f64,
    /// Rounds carried (torpedoes for launchers, 0 for lasers).
    pub magazine: u32,
    /// Full width of the firing arc about the nose (degrees).
    pub pivot_arc_deg: f64,
    pub range_m: f64,
    /// Heat added per round fired, hit or miss (J).
    pub heat_per_round_j: f64,
    /// Spinal charge time (s); zero for other mounts.
    #[serde(default)]
    pub charge_time_s: f64,
    #[serde(default)]
    pub laser: Option<LaserSpec>,
    /// Torpedo template name for launchers.
    #[serde(default)]
    pub torpedo: Option<String>,
}

/// Torpedo template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorpedoSpec {
    /// Wet mass (kg).
    pub mass_kg: f64,
    pub propellant_fraction: f64,
    pub exhaust_velocity_m_s: f64,
    pub thrust_n: f64,
    /// Explosive yield added to kinetic energy on impact (J).
    pub warhead_yield_j: f64,
    /// Range at which terminal homing begins.
    pub terminal_range_m: f64,
    pub navigation_constant: f64,
    /// Distance from launch before the torpedo can hit anything.
    pub arming_distance_m: f64,
    /// Absorbed laser energy that burns out the seeker.
    pub electronics_threshold_j: f64,
    /// Absorbed laser energy that cooks off the warhead.
    pub warhead_threshold_j: f64,
    pub lifetime_s: f64,
}

impl TorpedoSpec {
    pub fn propellant_kg(&self) -> f64 {
        self.mass_kg * self.propellant_fraction
    }

    pub fn dry_mass_kg(&self) -> f64 {
        self.mass_kg - self.propellant_kg()
    }

    /// Tsiolkovsky delta-v budget (m/s).
    pub fn delta_v(&self) -> f64 {
        let dry = self.dry_mass_kg();
        if dry <= 0.0 {
            return 0.0;
        }
        self.exhaust_velocity_m_s * (self.mass_kg / dry).ln()
    }
}

/// One module slot along the hull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    pub kind: ModuleKind,
    pub hp: f64,
    /// Losing a critical module takes the ship out of the fight.
    #[serde(default)]
    pub critical: bool,
}

/// A weapon installed on a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountSpec {
    /// Unique name of this mount on the ship.
    pub label: String,
    pub weapon: String,
    pub module: String,
}

/// Armor thickness per zone at battle start (cm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmorLayout {
    pub nose_cm: f64,
    pub lateral_cm: f64,
    pub tail_cm: f64,
}

/// Ship class template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipClass {
    pub length_m: f64,
    /// Sphere radius used for hit detection.
    pub hit_radius_m: f64,
    pub dry_mass_kg: f64,
    pub propellant_kg: f64,
    pub exhaust_velocity_m_s: f64,
    pub max_thrust_n: f64,
    pub max_rcs_torque_nm: f64,
    pub max_turn_rate_rad_s: f64,
    /// Drive gimbal half-angle (degrees).
    pub drive_pivot_deg: f64,
    /// Structural integrity budget (HP).
    pub structure_hp: f64,
    pub armor: ArmorLayout,
    pub armor_material: String,
    /// Modules ordered nose to tail.
    pub modules: Vec<ModuleSpec>,
    pub weapons: Vec<MountSpec>,
    pub heat_sink_j: f64,
    /// Reactor baseline heat (W).
    pub reactor_heat_w: f64,
    /// Drive waste heat per newton of thrust (W/N).
    pub drive_heat_w_per_n: f64,
    pub radiator_extended_w: f64,
    pub radiator_retracted_w: f64,
}

/// Immutable template tables for one battle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub materials: BTreeMap<String, ArmorMaterial>,
    pub weapons: BTreeMap<String, WeaponSpec>,
    pub torpedoes: BTreeMap<String, TorpedoSpec>,
    pub ship_classes: BTreeMap<String, ShipClass>,
}

impl Catalog {
    /// Parse and validate a catalog from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(json).map_err(|source| CombatError::Parse {
            what: "catalog",
            source,
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read, parse and validate a catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CombatError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn class(&self, name: &str) -> Result<&ShipClass> {
        self.ship_classes
            .get(name)
            .ok_or_else(|| CombatError::UnknownShipClass(name.to_string()))
    }

    /// Check every cross reference a battle will rely on.
    pub fn validate(&self) -> Result<()> {
        for (name, torpedo) in &self.torpedoes {
            let invalid = |reason: &str| CombatError::InvalidTorpedo {
                torpedo: name.clone(),
                reason: reason.to_string(),
            };
            if !(torpedo.mass_kg > 0.0) {
                return Err(invalid("mass must be positive"));
            }
            if !(torpedo.exhaust_velocity_m_s > 0.0) {
                return Err(invalid("exhaust velocity must be positive"));
            }
            if !(torpedo.electronics_threshold_j > 0.0 && torpedo.warhead_threshold_j > 0.0) {
                return Err(invalid("point-defense thresholds must be positive"));
            }
        }

        for (weapon_name, weapon) in &self.weapons {
            if weapon.kind == WeaponKind::PointDefense && weapon.laser.is_none() {
                return Err(CombatError::InvalidCatalog(format!(
                    "point-defense weapon '{weapon_name}' has no laser optics"
                )));
            }
            if weapon.kind == WeaponKind::TorpedoLauncher {
                let torpedo = weapon.torpedo.clone().unwrap_or_default();
                let Some(spec) = self.torpedoes.get(&torpedo) else {
                    return Err(CombatError::UnknownTorpedo {
                        weapon: weapon_name.clone(),
                        torpedo,
                    });
                };
                // Magazine mass is booked in rounds; launches subtract the torpedo.
                if (weapon.round_mass_kg - spec.mass_kg).abs() > 1e-6 {
                    return Err(CombatError::LauncherMassMismatch {
                        weapon: weapon_name.clone(),
                        torpedo,
                        round_mass_kg: weapon.round_mass_kg,
                        torpedo_mass_kg: spec.mass_kg,
                    });
                }
            }
        }

        for (class_name, class) in &self.ship_classes {
            if !self.materials.contains_key(&class.armor_material) {
                return Err(CombatError::UnknownMaterial {
                    class: class_name.clone(),
                    material: class.armor_material.clone(),
                });
            }
            if class.modules.is_empty() {
                return Err(CombatError::InvalidCatalog(format!(
                    "class '{class_name}' has no modules"
                )));
            }
            if !class.modules.iter().any(|m| m.critical) {
                return Err(CombatError::InvalidCatalog(format!(
                    "class '{class_name}' has no critical module"
                )));
            }
            if class.dry_mass_kg <= 0.0 || class.exhaust_velocity_m_s <= 0.0 {
                return Err(CombatError::InvalidCatalog(format!(
                    "class '{class_name}' needs positive dry mass and exhaust velocity"
                )));
            }
            if !(class.heat_sink_j > 0.0) {
                return Err(CombatError::InvalidHeatSink {
                    class: class_name.clone(),
                    heat_sink_j: class.heat_sink_j,
                });
            }
            for mount in &class.weapons {
                if !self.weapons.contains_key(&mount.weapon) {
                    return Err(CombatError::UnknownWeapon {
                        class: class_name.clone(),
                        weapon: mount.weapon.clone(),
                    });
                }
                if !class.modules.iter().any(|m| m.name == mount.module) {
                    return Err(CombatError::UnknownMountModule {
                        class: class_name.clone(),
                        weapon: mount.weapon.clone(),
                        module: mount.module.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Built-in catalog: three ship classes and their weapons.
    pub fn standard() -> Self {
        let mut materials = BTreeMap::new();
        materials.insert(
            "steel".to_string(),
            ArmorMaterial {
                baryonic_half_value_cm: 7.5,
                xray_half_value_cm: 2.0,
                density_kg_m3: 7850.0,
                heat_of_vaporization_j_kg: 6.8e6,
            },
        );
        materials.insert(
            "titanium".to_string(),
            ArmorMaterial {
                baryonic_half_value_cm: 10.5,
                xray_half_value_cm: 3.0,
                density_kg_m3: 4820.0,
                heat_of_vaporization_j_kg: 8.9e6,
            },
        );
        materials.insert(
            "composite".to_string(),
            ArmorMaterial {
                baryonic_half_value_cm: 72.0,
                xray_half_value_cm: 5.0,
                density_kg_m3: 1930.0,
                heat_of_vaporization_j_kg: 1.2e7,
            },
        );

        let mut weapons = BTreeMap::new();
        weapons.insert(
            "Coilgun Battery".to_string(),
            WeaponSpec {
                kind: WeaponKind::Turret,
                salvo_size: 5,
                round_mass_kg: 5.0,
                muzzle_velocity_m_s: 10_000.0,
                cooldown_s: 5.0,
                magazine: 400,
                pivot_arc_deg: 360.0,
                range_m: 200_000.0,
                heat_per_round_j: 1.0e8,
                charge_time_s: 0.0,
                laser: None,
                torpedo: None,
            },
        );
        weapons.insert(
            "Spinal Coiler".to_string(),
            WeaponSpec {
                kind: WeaponKind::Spinal,
                salvo_size: 1,
                round_mass_kg: 88.0,
                muzzle_velocity_m_s: 20_000.0,
                cooldown_s: 30.0,
                magazine: 30,
                pivot_arc_deg: 2.0,
                range_m: 500_000.0,
                heat_per_round_j: 2.0e9,
                charge_time_s: 10.0,
                laser: None,
                torpedo: None,
            },
        );
        weapons.insert(
            "PD Laser".to_string(),
            WeaponSpec {
                kind: WeaponKind::PointDefense,
                salvo_size: 0,
                round_mass_kg: 0.0,
                muzzle_velocity_m_s: 0.0,
                cooldown_s: 0.0,
                magazine: 0,
                pivot_arc_deg: 360.0,
                range_m: 100_000.0,
                heat_per_round_j: 0.0,
                charge_time_s: 0.0,
                laser: Some(LaserSpec {
                    power_w: 5.0e6,
                    aperture_m: 0.5,
                    wavelength_m: 1.0e-6,
                    target_cross_section_m2: 1.0,
                    heat_per_second_j: 2.0e7,
                }),
                torpedo: None,
            },
        );
        weapons.insert(
            "Torpedo Launcher".to_string(),
            WeaponSpec {
                kind: WeaponKind::TorpedoLauncher,
                salvo_size: 1,
                round_mass_kg: 1600.0,
                muzzle_velocity_m_s: 100.0,
                cooldown_s: 20.0,
                magazine: 8,
                pivot_arc_deg: 180.0,
                range_m: 1_500_000.0,
                heat_per_round_j: 5.0e7,
                charge_time_s: 0.0,
                laser: None,
                torpedo: Some("Trident".to_string()),
            },
        );

        let mut torpedoes = BTreeMap::new();
        torpedoes.insert(
            "Trident".to_string(),
            TorpedoSpec {
                mass_kg: 1600.0,
                propellant_fraction: 0.7,
                exhaust_velocity_m_s: 50_000.0,
                thrust_n: 1600.0 * 98.1,
                warhead_yield_j: 0.0,
                terminal_range_m: 10_000.0,
                navigation_constant: 3.0,
                arming_distance_m: 500.0,
                electronics_threshold_j: 1.0e4,
                warhead_threshold_j: 1.0e5,
                lifetime_s: 900.0,
            },
        );

        let mut ship_classes = BTreeMap::new();
        ship_classes.insert("corvette".to_string(), corvette());
        ship_classes.insert("destroyer".to_string(), destroyer());
        ship_classes.insert("cruiser".to_string(), cruiser());

        Catalog {
            materials,
            weapons,
            torpedoes,
            ship_classes,
        }
    }
}

fn module(name: &str, kind: ModuleKind, hp: f64) -> ModuleSpec {
    ModuleSpec {
        name: name.to_string(),
        kind,
        hp,
        critical: matches!(kind, ModuleKind::Bridge | ModuleKind::Reactor),
    }
}

fn mount(label: &str, weapon: &str, module: &str) -> MountSpec {
    MountSpec {
        label: label.to_string(),
        weapon: weapon.to_string(),
        module: module.to_string(),
    }
}

fn corvette() -> ShipClass {
    ShipClass {
        length_m: 65.0,
        hit_radius_m: 20.0,
        dry_mass_kg: 1_895_000.0,
        propellant_kg: 95_000.0,
        exhaust_velocity_m_s: 10_256_000.0,
        max_thrust_n: 58_560_000.0,
        max_rcs_torque_nm: 3.5e7,
        max_turn_rate_rad_s: 0.2,
        drive_pivot_deg: 3.0,
        structure_hp: 600.0,
        armor: ArmorLayout {
            nose_cm: 40.0,
            lateral_cm: 15.0,
            tail_cm: 20.0,
        },
        armor_material: "titanium".to_string(),
        modules: vec![
            module("Sensors", ModuleKind::Sensors, 40.0),
            module("Command Bridge", ModuleKind::Bridge, 80.0),
            module("Coilgun Battery", ModuleKind::Weapons, 80.0),
            module("Main Reactor", ModuleKind::Reactor, 100.0),
            module("Fuel Tank", ModuleKind::FuelTank, 80.0),
            module("Main Engine Assembly", ModuleKind::Engine, 100.0),
        ],
        weapons: vec![
            mount("Coilgun Battery", "Coilgun Battery", "Coilgun Battery"),
            mount("PD Laser", "PD Laser", "Sensors"),
        ],
        heat_sink_j: 3.0e11,
        reactor_heat_w: 1.0e6,
        drive_heat_w_per_n: 10.0,
        radiator_extended_w: 4.0e8,
        radiator_retracted_w: 4.0e7,
    }
}

fn destroyer() -> ShipClass {
    ShipClass {
        length_m: 125.0,
        hit_radius_m: 35.0,
        dry_mass_kg: 2_700_000.0,
        propellant_kg: 150_000.0,
        exhaust_velocity_m_s: 10_256_000.0,
        max_thrust_n: 58_560_000.0,
        max_rcs_torque_nm: 1.5e8,
        max_turn_rate_rad_s: 0.15,
        drive_pivot_deg: 3.0,
        structure_hp: 900.0,
        armor: ArmorLayout {
            nose_cm: 50.0,
            lateral_cm: 20.0,
            tail_cm: 25.0,
        },
        armor_material: "steel".to_string(),
        modules: vec![
            module("Primary Sensor Array", ModuleKind::Sensors, 50.0),
            module("Spinal Coiler Mount", ModuleKind::Weapons, 120.0),
            module("Command Bridge", ModuleKind::Bridge, 120.0),
            module("Crew Quarters", ModuleKind::Crew, 80.0),
            module("Main Reactor", ModuleKind::Reactor, 150.0),
            module("Coilgun Battery", ModuleKind::Weapons, 100.0),
            module("Torpedo Magazine", ModuleKind::Magazine, 80.0),
            module("Main Fuel Tank", ModuleKind::FuelTank, 120.0),
            module("Main Engine Assembly", ModuleKind::Engine, 150.0),
        ],
        weapons: vec![
            mount("Spinal Coiler", "Spinal Coiler", "Spinal Coiler Mount"),
            mount("Coilgun Battery", "Coilgun Battery", "Coilgun Battery"),
            mount("PD Laser Fore", "PD Laser", "Primary Sensor Array"),
            mount("PD Laser Aft", "PD Laser", "Main Fuel Tank"),
            mount("Torpedo Launcher", "Torpedo Launcher", "Torpedo Magazine"),
        ],
        heat_sink_j: 5.25e11,
        reactor_heat_w: 1.0e6,
        drive_heat_w_per_n: 10.0,
        radiator_extended_w: 5.0e8,
        radiator_retracted_w: 5.0e7,
    }
}

fn cruiser() -> ShipClass {
    ShipClass {
        length_m: 200.0,
        hit_radius_m: 55.0,
        dry_mass_kg: 4_500_000.0,
        propellant_kg: 250_000.0,
        exhaust_velocity_m_s: 10_256_000.0,
        max_thrust_n: 87_840_000.0,
        max_rcs_torque_nm: 4.7e8,
        max_turn_rate_rad_s: 0.1,
        drive_pivot_deg: 3.0,
        structure_hp: 1500.0,
        armor: ArmorLayout {
            nose_cm: 150.0,
            lateral_cm: 60.0,
            tail_cm: 80.0,
        },
        armor_material: "composite".to_string(),
        modules: vec![
            module("Primary Sensor Array", ModuleKind::Sensors, 60.0),
            module("Spinal Coiler Mount", ModuleKind::Weapons, 160.0),
            module("Forward Battery", ModuleKind::Weapons, 120.0),
            module("Command Bridge", ModuleKind::Bridge, 160.0),
            module("Crew Quarters", ModuleKind::Crew, 100.0),
            module("Main Reactor", ModuleKind::Reactor, 200.0),
            module("Aft Battery", ModuleKind::Weapons, 120.0),
            module("Torpedo Magazine", ModuleKind::Magazine, 100.0),
            module("Main Fuel Tank", ModuleKind::FuelTank, 160.0),
            module("Main Engine Assembly", ModuleKind::Engine, 200.0),
        ],
        weapons: vec![
            mount("Spinal Coiler", "Spinal Coiler", "Spinal Coiler Mount"),
            mount("Forward Coilgun", "Coilgun Battery", "Forward Battery"),
            mount("Aft Coilgun", "Coilgun Battery", "Aft Battery"),
            mount("PD Laser Fore", "PD Laser", "Primary Sensor Array"),
            mount("PD Laser Mid", "PD Laser", "Crew Quarters"),
            mount("PD Laser Aft", "PD Laser", "Main Fuel Tank"),
            mount("Torpedo Launcher", "Torpedo Launcher", "Torpedo Magazine"),
        ],
        heat_sink_j: 9.0e11,
        reactor_heat_w: 2.0e6,
        drive_heat_w_per_n: 10.0,
        radiator_extended_w: 8.0e8,
        radiator_retracted_w: 8.0e7,
    }
}
