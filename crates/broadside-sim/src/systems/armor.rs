//! Armor model: half-value penetration, obliquity, and zone-local ablation.

use serde::{Deserialize, Serialize};

use broadside_core::components::ArmorSet;
use broadside_core::config::BattleConfig;
use broadside_core::constants::{END_ZONE_HALF_ANGLE_DEG, MAX_INCIDENCE_DEG, MAX_OBLIQUITY_DEG};
use broadside_core::enums::{ArmorZoneKind, DamageType};
use broadside_core::types::{Quat, Vec3};

/// What arrives at the armor face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponEffect {
    pub damage_type: DamageType,
    pub energy_j: f64,
}

impl WeaponEffect {
    /// Kinetic effect from the relative velocity at impact plus any warhead yield.
    pub fn kinetic(mass_kg: f64, relative_velocity: Vec3, warhead_yield_j: f64) -> Self {
        Self {
            damage_type: DamageType::Baryonic,
            energy_j: 0.5 * mass_kg * relative_velocity.length_squared() + warhead_yield_j.max(0.0),
        }
    }

    pub fn laser(energy_j: f64) -> Self {
        Self {
            damage_type: DamageType::XRay,
            energy_j,
        }
    }
}

/// Where and how steeply a hit lands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactGeometry {
    pub zone: ArmorZoneKind,
    /// Angle from the zone's surface normal (degrees).
    pub incidence_deg: f64,
}

/// Outcome of one hit against one zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageResult {
    pub incident_j: f64,
    pub penetrating_j: f64,
    pub hp_damage: f64,
    pub ablated_cm: f64,
    pub remaining_cm: f64,
}

/// Fraction of incident energy passing `thickness_cm` of armor.
///
/// Exactly 1.0 for bare hull.
pub fn penetration_fraction(thickness_cm: f64, half_value_cm: f64) -> f64 {
    if thickness_cm <= 0.0 {
        return 1.0;
    }
    if half_value_cm <= 0.0 {
        return 0.0;
    }
    0.5f64.powf(thickness_cm / half_value_cm)
}

/// Line-of-flight thickness for a hit at `incidence_deg` off the normal.
pub fn effective_thickness(thickness_cm: f64, incidence_deg: f64) -> f64 {
    let theta = incidence_deg.clamp(0.0, MAX_INCIDENCE_DEG).to_radians();
    let floor = MAX_OBLIQUITY_DEG.to_radians().cos();
    thickness_cm.max(0.0) / theta.cos().max(floor)
}

/// Thickness left after `energy_j` vaporizes armor from a zone `thickness_cm` thick.
///
/// The linear vaporization depth `L = E / (rho * A * H_vap)` is removed as
/// `t * L / (t + L)`, leaving `t² / (t + L)`. This is not a linear strip of
/// `L`: one large hit cannot strip a zone bare, and removal per joule falls
/// as the zone thins. The result lies in `[0, t]`; it is positive for any
/// finite hit and only reaches exactly zero when the quotient underflows
/// (a tiny remnant under an enormous energy).
pub fn ablate(
    thickness_cm: f64,
    energy_j: f64,
    density_kg_m3: f64,
    heat_of_vaporization_j_kg: f64,
    area_m2: f64,
) -> f64 {
    if thickness_cm <= 0.0 {
        return 0.0;
    }
    let denom = density_kg_m3 * area_m2 * heat_of_vaporization_j_kg;
    if !(energy_j > 0.0 && denom > 0.0) {
        return thickness_cm;
    }
    let linear_cm = energy_j / denom * 100.0;
    // Rounding in t²/(t + L) can land one ulp above t for a vanishing L.
    (thickness_cm * thickness_cm / (thickness_cm + linear_cm)).min(thickness_cm)
}

/// Classify the struck zone from the direction the hit travels (world frame,
/// relative to the target) and the target's orientation.
pub fn classify_impact(orientation: Quat, travel_dir: Vec3) -> ImpactGeometry {
    let incoming = orientation.inverse() * -travel_dir.normalize_or_zero();
    if incoming == Vec3::ZERO {
        return ImpactGeometry {
            zone: ArmorZoneKind::Lateral,
            incidence_deg: 0.0,
        };
    }
    let theta = Vec3::X.angle_between(incoming).to_degrees();

    let (zone, incidence_deg) = if theta <= END_ZONE_HALF_ANGLE_DEG {
        (ArmorZoneKind::Nose, theta)
    } else if theta >= 180.0 - END_ZONE_HALF_ANGLE_DEG {
        (ArmorZoneKind::Tail, 180.0 - theta)
    } else {
        (ArmorZoneKind::Lateral, (90.0 - theta).abs())
    };
    ImpactGeometry {
        zone,
        incidence_deg: incidence_deg.clamp(0.0, MAX_INCIDENCE_DEG),
    }
}

/// Resolve one hit: penetration through the zone as it stands, then ablation.
///
/// Energy that does not penetrate is discarded.
pub fn resolve_impact(
    effect: WeaponEffect,
    armor: &mut ArmorSet,
    geometry: ImpactGeometry,
    config: &BattleConfig,
) -> DamageResult {
    let incident_j = effect.energy_j.max(0.0);
    let half_value = armor.material.half_value_cm(effect.damage_type);
    let density = armor.material.density_kg_m3;
    let h_vap = armor.material.heat_of_vaporization_j_kg;

    let zone = armor.zone_mut(geometry.zone);
    let t_eff = effective_thickness(zone.thickness_cm, geometry.incidence_deg);
    let penetrating_j = incident_j * penetration_fraction(t_eff, half_value);

    let before = zone.thickness_cm.max(0.0);
    zone.thickness_cm = ablate(before, incident_j, density, h_vap, config.ablation_area_m2);
    let ablated_cm = before - zone.thickness_cm;

    DamageResult {
        incident_j,
        penetrating_j,
        hp_damage: config.energy_to_hp(penetrating_j),
        ablated_cm,
        remaining_cm: zone.thickness_cm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadside_core::catalog::ArmorMaterial;
    use broadside_core::components::ArmorZone;
    use proptest::prelude::*;

    fn titanium_set(thickness_cm: f64) -> ArmorSet {
        let zone = |kind| ArmorZone {
            kind,
            thickness_cm,
            initial_cm: thickness_cm,
        };
        ArmorSet {
            material: ArmorMaterial {
                baryonic_half_value_cm: 10.5,
                xray_half_value_cm: 3.0,
                density_kg_m3: 4820.0,
                heat_of_vaporization_j_kg: 8.9e6,
            },
            nose: zone(ArmorZoneKind::Nose),
            lateral: zone(ArmorZoneKind::Lateral),
            tail: zone(ArmorZoneKind::Tail),
        }
    }

    const SQUARE: ImpactGeometry = ImpactGeometry {
        zone: ArmorZoneKind::Lateral,
        incidence_deg: 0.0,
    };

    #[test]
    fn test_zero_thickness_full_penetration() {
        assert_eq!(penetration_fraction(0.0, 10.5), 1.0);
        let mut armor = titanium_set(0.0);
        let result = resolve_impact(
            WeaponEffect::kinetic(5.0, Vec3::new(10_000.0, 0.0, 0.0), 0.0),
            &mut armor,
            SQUARE,
            &BattleConfig::default(),
        );
        assert_eq!(result.penetrating_j, result.incident_j);
        assert!((result.hp_damage - 25.0).abs() < 1e-9, "HP: {}", result.hp_damage);
        assert_eq!(result.ablated_cm, 0.0, "Nothing left to ablate");
    }

    #[test]
    fn test_one_half_value_halves_energy() {
        let f = penetration_fraction(10.5, 10.5);
        assert!((f - 0.5).abs() < 1e-12);
        let f = penetration_fraction(21.0, 10.5);
        assert!((f - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_xray_stopped_harder_than_kinetic() {
        let config = BattleConfig::default();
        let mut a = titanium_set(15.0);
        let mut b = titanium_set(15.0);
        let kinetic = resolve_impact(
            WeaponEffect {
                damage_type: DamageType::Baryonic,
                energy_j: 1e9,
            },
            &mut a,
            SQUARE,
            &config,
        );
        let laser = resolve_impact(WeaponEffect::laser(1e9), &mut b, SQUARE, &config);
        assert!(
            laser.penetrating_j < kinetic.penetrating_j * 0.1,
            "Laser {:.3e} J vs kinetic {:.3e} J",
            laser.penetrating_j,
            kinetic.penetrating_j
        );
    }

    #[test]
    fn test_obliquity_thickens_armor() {
        assert!((effective_thickness(10.0, 0.0) - 10.0).abs() < 1e-12);
        assert!((effective_thickness(10.0, 60.0) - 20.0).abs() < 1e-9);
        let capped = effective_thickness(10.0, 89.0);
        let limit = 10.0 / 80f64.to_radians().cos();
        assert!((capped - limit).abs() < 1e-9, "Grazing hits cap at 80°: {capped}");
    }

    #[test]
    fn test_ablation_is_zone_local() {
        let mut armor = titanium_set(15.0);
        resolve_impact(
            WeaponEffect::kinetic(88.0, Vec3::new(30_000.0, 0.0, 0.0), 0.0),
            &mut armor,
            SQUARE,
            &BattleConfig::default(),
        );
        assert!(armor.lateral.thickness_cm < 15.0);
        assert_eq!(armor.nose.thickness_cm, 15.0);
        assert_eq!(armor.tail.thickness_cm, 15.0);
    }

    #[test]
    fn test_ablation_ignores_degenerate_energy() {
        for energy in [0.0, -1.0e6, f64::NAN] {
            assert_eq!(ablate(12.0, energy, 7850.0, 6.8e6, 1.0), 12.0, "energy {energy}");
        }
        assert_eq!(ablate(12.0, f64::INFINITY, 7850.0, 6.8e6, 1.0), 0.0);
    }

    #[test]
    fn test_classify_zones() {
        let q = Quat::IDENTITY;
        // Travelling -X hits the nose head-on.
        let g = classify_impact(q, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(g.zone, ArmorZoneKind::Nose);
        assert!(g.incidence_deg.abs() < 1e-9);

        let g = classify_impact(q, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(g.zone, ArmorZoneKind::Tail);

        let g = classify_impact(q, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(g.zone, ArmorZoneKind::Lateral);
        assert!(g.incidence_deg.abs() < 1e-9, "Broadside hit is square: {}", g.incidence_deg);

        // Rotated ship: nose along +Y, so a hit travelling -Y is a nose hit.
        let q = Quat::from_rotation_z(std::f64::consts::FRAC_PI_2);
        let g = classify_impact(q, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(g.zone, ArmorZoneKind::Nose);
    }

    proptest! {
        #[test]
        fn test_repeated_hits_thin_armor_monotonically(
            thickness in 1.0f64..200.0,
            energy in 1e6f64..1e9,
            hits in 2usize..8,
        ) {
            let config = BattleConfig::default();
            let mut armor = titanium_set(thickness);
            let mut last = thickness;
            for _ in 0..hits {
                let r = resolve_impact(WeaponEffect { damage_type: DamageType::Baryonic, energy_j: energy }, &mut armor, SQUARE, &config);
                prop_assert!(r.remaining_cm < last, "thickness must strictly drop: {} -> {}", last, r.remaining_cm);
                prop_assert!(r.remaining_cm > 0.0, "thickness never reaches zero");
                last = r.remaining_cm;
            }
        }

        #[test]
        fn test_head_on_beats_pursuit(
            muzzle in 1_000.0f64..30_000.0,
            closing_frac in 0.01f64..0.99,
            thickness in 0.0f64..60.0,
        ) {
            let closing = muzzle * closing_frac;
            let config = BattleConfig::default();
            let effect_head_on = WeaponEffect::kinetic(5.0, Vec3::new(muzzle + closing, 0.0, 0.0), 0.0);
            let effect_pursuit = WeaponEffect::kinetic(5.0, Vec3::new(muzzle - closing, 0.0, 0.0), 0.0);
            let head_on = resolve_impact(effect_head_on, &mut titanium_set(thickness), SQUARE, &config);
            let pursuit = resolve_impact(effect_pursuit, &mut titanium_set(thickness), SQUARE, &config);
            prop_assert!(head_on.penetrating_j > pursuit.penetrating_j);
        }

        #[test]
        fn test_ablation_stays_within_bounds(
            thickness in prop_oneof![1e-300f64..1e-3, 1e-3f64..500.0],
            energy_exp in -12.0f64..300.0,
        ) {
            let energy = 10f64.powf(energy_exp);
            let after = ablate(thickness, energy, 7850.0, 6.8e6, 1.0);
            prop_assert!(after >= 0.0, "negative thickness {} from {}", after, thickness);
            prop_assert!(after <= thickness, "thickness grew: {} -> {}", thickness, after);
        }

        #[test]
        fn test_penetration_bounded(thickness in 0.0f64..500.0, half in 0.1f64..100.0) {
            let f = penetration_fraction(thickness, half);
            prop_assert!((0.0..=1.0).contains(&f));
        }
    }
}
