//! Thermal system: operating heat, radiator dissipation, heat-band warnings
//! and thermal destruction.

use broadside_core::components::{ShipState, ThermalState};
use broadside_core::config::BattleConfig;
use broadside_core::enums::{HeatBand, LossCause, ShipStatus};
use broadside_core::events::{EventPayload, PendingEvent};

use super::damage::knock_out;

/// Heat band for a heat percentage.
pub fn band_for(heat_percent: f64, config: &BattleConfig) -> HeatBand {
    let [mild, severe, critical] = config.heat_bands_percent;
    if heat_percent >= critical {
        HeatBand::Critical
    } else if heat_percent >= severe {
        HeatBand::Severe
    } else if heat_percent >= mild {
        HeatBand::Mild
    } else {
        HeatBand::Nominal
    }
}

/// Weapon accuracy multiplier at a heat percentage.
pub fn accuracy_multiplier(heat_percent: f64, config: &BattleConfig) -> f64 {
    match band_for(heat_percent, config) {
        HeatBand::Nominal => 1.0,
        HeatBand::Mild => config.heat_band_accuracy[0],
        HeatBand::Severe => config.heat_band_accuracy[1],
        HeatBand::Critical => config.heat_band_accuracy[2],
    }
}

/// Radiator throughput for the current radiator state (W).
pub fn dissipation_rate(thermal: &ThermalState) -> f64 {
    let rate = if thermal.radiators_extended {
        thermal.radiator_extended_w
    } else {
        thermal.radiator_retracted_w
    };
    rate * thermal.radiator_integrity.clamp(0.0, 1.0)
}

/// Add heat to a ship's sink.
pub fn add_heat(ship: &mut ShipState, joules: f64) {
    if joules > 0.0 && ship.status != ShipStatus::Destroyed {
        ship.thermal.heat_j += joules;
    }
}

/// Reactor baseline and drive heat for the tick just integrated.
pub fn accrue_operating_heat(ships: &mut [ShipState], dt: f64) {
    for ship in ships.iter_mut() {
        let watts =
            ship.thermal.reactor_heat_w + ship.thermal.drive_heat_w_per_n * ship.last_thrust_n;
        add_heat(ship, watts * dt);
    }
}

/// Run the thermal update phase for all ships.
pub fn run(
    ships: &mut [ShipState],
    config: &BattleConfig,
    dt: f64,
    events: &mut Vec<PendingEvent>,
) {
    for ship in ships.iter_mut() {
        if ship.status == ShipStatus::Destroyed {
            continue;
        }

        // Saturation is resolved before the radiators get a say.
        let heat_percent = ship.thermal.heat_percent();
        if heat_percent >= 100.0 && !ship.thermal.overheated {
            ship.thermal.overheated = true;
            tracing::debug!(ship = %ship.id, heat_percent, "heat sink saturated");
            events.push(
                PendingEvent::new(EventPayload::ThermalCritical { heat_percent }).on(ship.id),
            );
            knock_out(ship, ShipStatus::Destroyed, LossCause::ThermalOverload, events);
            continue;
        }

        let removed = (dissipation_rate(&ship.thermal) * dt).min(ship.thermal.heat_j);
        ship.thermal.heat_j -= removed.max(0.0);

        let heat_percent = ship.thermal.heat_percent();
        let band = band_for(heat_percent, config);
        if band > ship.thermal.warned_band {
            for crossed in [HeatBand::Mild, HeatBand::Severe, HeatBand::Critical] {
                if crossed > ship.thermal.warned_band && crossed <= band {
                    events.push(
                        PendingEvent::new(EventPayload::ThermalWarning {
                            band: crossed,
                            heat_percent,
                        })
                        .on(ship.id),
                    );
                }
            }
        }
        ship.thermal.warned_band = band;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadside_core::catalog::Catalog;
    use broadside_core::constants::DT;
    use broadside_core::setup::ShipPlacement;
    use broadside_core::types::{ShipId, Vec3};

    use crate::world_setup::build_ship;

    fn corvette() -> ShipState {
        let placement = ShipPlacement {
            name: "Hot".to_string(),
            class: "corvette".to_string(),
            side: broadside_core::enums::Side::Alpha,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            facing: None,
        };
        build_ship(ShipId(0), &placement, &Catalog::standard()).unwrap()
    }

    fn count(events: &[PendingEvent], name: &str) -> usize {
        events.iter().filter(|e| e.payload.kind_name() == name).count()
    }

    #[test]
    fn test_accuracy_bands() {
        let config = BattleConfig::default();
        assert_eq!(accuracy_multiplier(10.0, &config), 1.0);
        assert_eq!(accuracy_multiplier(50.0, &config), 0.85);
        assert_eq!(accuracy_multiplier(80.0, &config), 0.5);
        assert_eq!(accuracy_multiplier(95.0, &config), 0.1);
    }

    #[test]
    fn test_thermal_destruction_exactly_once() {
        let config = BattleConfig::default();
        let mut ships = vec![corvette()];
        ships[0].thermal.heat_j = ships[0].thermal.sink_capacity_j * 1.01;
        let mut events = Vec::new();
        for _ in 0..20 {
            run(&mut ships, &config, DT, &mut events);
            add_heat(&mut ships[0], 1e12);
        }
        assert_eq!(ships[0].status, ShipStatus::Destroyed);
        assert_eq!(ships[0].loss_cause, Some(LossCause::ThermalOverload));
        assert_eq!(count(&events, "ThermalCritical"), 1);
        assert_eq!(count(&events, "ShipDestroyed"), 1);
    }

    #[test]
    fn test_warnings_once_per_band_and_rearm() {
        let config = BattleConfig::default();
        let mut ships = vec![corvette()];
        let cap = ships[0].thermal.sink_capacity_j;
        let mut events = Vec::new();

        ships[0].thermal.heat_j = cap * 0.8;
        run(&mut ships, &config, DT, &mut events);
        assert_eq!(count(&events, "ThermalWarning"), 2, "Mild and severe both crossed");

        run(&mut ships, &config, DT, &mut events);
        assert_eq!(count(&events, "ThermalWarning"), 2, "No repeat while in band");

        ships[0].thermal.heat_j = cap * 0.6;
        run(&mut ships, &config, DT, &mut events);
        ships[0].thermal.heat_j = cap * 0.8;
        run(&mut ships, &config, DT, &mut events);
        assert_eq!(count(&events, "ThermalWarning"), 3, "Severe re-armed after cooling");
    }

    #[test]
    fn test_extended_radiators_dissipate_faster() {
        let config = BattleConfig::default();
        let mut ships = vec![corvette(), corvette()];
        ships[1].id = ShipId(1);
        for ship in &mut ships {
            ship.thermal.heat_j = 1e11;
        }
        ships[1].thermal.radiators_extended = true;
        let mut events = Vec::new();
        run(&mut ships, &config, DT, &mut events);
        let retracted = 1e11 - ships[0].thermal.heat_j;
        let extended = 1e11 - ships[1].thermal.heat_j;
        assert!((retracted - 4e7 * DT).abs() < 1.0);
        assert!((extended - 4e8 * DT).abs() < 1.0);
    }

    #[test]
    fn test_dissipation_never_goes_negative() {
        let config = BattleConfig::default();
        let mut ships = vec![corvette()];
        ships[0].thermal.heat_j = 10.0;
        let mut events = Vec::new();
        run(&mut ships, &config, DT, &mut events);
        assert_eq!(ships[0].thermal.heat_j, 0.0);
    }
}
