//! Per-battle tunables.
//!
//! Gameplay constants with no physical derivation (energy-to-HP ratio,
//! critical-hit curve, accuracy bands) are configuration, not invariants.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{CombatError, Result};

/// Critical-hit probability curve: `min(base + per_damage_ratio * dmg/max_hp, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CritCurve {
    pub base: f64,
    pub per_damage_ratio: f64,
    pub max: f64,
}

impl Default for CritCurve {
    fn default() -> Self {
        Self {
            base: CRIT_BASE_CHANCE,
            per_damage_ratio: CRIT_CHANCE_PER_DAMAGE_RATIO,
            max: CRIT_MAX_CHANCE,
        }
    }
}

impl CritCurve {
    pub fn chance(&self, damage_ratio: f64) -> f64 {
        (self.base + self.per_damage_ratio * damage_ratio.max(0.0))
            .min(self.max)
            .clamp(0.0, 1.0)
    }
}

/// Configuration for one battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// RNG seed. Same seed and same orders give the same battle.
    pub seed: u64,
    pub checkpoint_interval_s: f64,
    pub time_limit_s: f64,
    pub snapshot_interval_s: f64,
    pub joules_per_hp: f64,
    pub hp_precision: f64,
    pub crit: CritCurve,
    pub structural_threshold: f64,
    pub base_hit_chance: f64,
    /// Heat percentages at which accuracy drops (ascending).
    pub heat_bands_percent: [f64; 3],
    /// Accuracy multiplier once the matching band is reached.
    pub heat_band_accuracy: [f64; 3],
    pub radiator_hit_chance_extended: f64,
    pub radiator_hit_chance_retracted: f64,
    pub ablation_area_m2: f64,
    pub pd_threat_margin_radii: f64,
    pub evasive_jink_period_s: f64,
    pub draw_score_margin: f64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            checkpoint_interval_s: CHECKPOINT_INTERVAL_SECS,
            time_limit_s: TIME_LIMIT_SECS,
            snapshot_interval_s: SNAPSHOT_INTERVAL_SECS,
            joules_per_hp: JOULES_PER_HP,
            hp_precision: HP_PRECISION,
            crit: CritCurve::default(),
            structural_threshold: STRUCTURAL_THRESHOLD,
            base_hit_chance: BASE_HIT_CHANCE,
            heat_bands_percent: HEAT_BANDS_PERCENT,
            heat_band_accuracy: HEAT_BAND_ACCURACY,
            radiator_hit_chance_extended: RADIATOR_HIT_CHANCE_EXTENDED,
            radiator_hit_chance_retracted: RADIATOR_HIT_CHANCE_RETRACTED,
            ablation_area_m2: ABLATION_AREA_M2,
            pd_threat_margin_radii: PD_THREAT_MARGIN_RADII,
            evasive_jink_period_s: EVASIVE_JINK_PERIOD_SECS,
            draw_score_margin: DRAW_SCORE_MARGIN,
        }
    }
}

impl BattleConfig {
    /// Parse and validate a config from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: BattleConfig =
            serde_json::from_str(json).map_err(|source| CombatError::Parse {
                what: "battle config",
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CombatError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let interval = CHECKPOINT_INTERVAL_MIN_SECS..=CHECKPOINT_INTERVAL_MAX_SECS;
        if !interval.contains(&self.checkpoint_interval_s) {
            return Err(CombatError::InvalidConfig(format!(
                "checkpoint interval {} s outside [{}, {}] s",
                self.checkpoint_interval_s, CHECKPOINT_INTERVAL_MIN_SECS, CHECKPOINT_INTERVAL_MAX_SECS
            )));
        }
        if !(self.time_limit_s.is_finite() && self.time_limit_s > 0.0) {
            return Err(CombatError::InvalidConfig(
                "time limit must be positive".to_string(),
            ));
        }
        if !(self.snapshot_interval_s >= DT) {
            return Err(CombatError::InvalidConfig(format!(
                "snapshot interval must be at least one tick ({DT} s)"
            )));
        }
        if !(self.joules_per_hp > 0.0 && self.hp_precision > 0.0) {
            return Err(CombatError::InvalidConfig(
                "energy-to-HP ratio and HP precision must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.structural_threshold)
            || !(0.0..=1.0).contains(&self.base_hit_chance)
        {
            return Err(CombatError::InvalidConfig(
                "structural threshold and hit chance must be in [0, 1]".to_string(),
            ));
        }
        if !self.heat_bands_percent.windows(2).all(|w| w[0] < w[1]) {
            return Err(CombatError::InvalidConfig(
                "heat bands must be strictly ascending".to_string(),
            ));
        }
        if !self.heat_band_accuracy.iter().all(|m| (0.0..=1.0).contains(m)) {
            return Err(CombatError::InvalidConfig(
                "heat accuracy multipliers must be in [0, 1]".to_string(),
            ));
        }
        if !(self.ablation_area_m2 > 0.0 && self.evasive_jink_period_s > 0.0) {
            return Err(CombatError::InvalidConfig(
                "ablation area and jink period must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert penetrating energy to HP, truncated to the configured precision.
    pub fn energy_to_hp(&self, energy_j: f64) -> f64 {
        if energy_j <= 0.0 {
            return 0.0;
        }
        let steps = (energy_j / self.joules_per_hp / self.hp_precision).floor();
        steps * self.hp_precision
    }

    pub fn hp_to_energy(&self, hp: f64) -> f64 {
        hp.max(0.0) * self.joules_per_hp
    }

    /// Number of ticks in one checkpoint.
    pub fn ticks_per_checkpoint(&self) -> u64 {
        (self.checkpoint_interval_s / DT).round().max(1.0) as u64
    }

    pub fn ticks_per_snapshot(&self) -> u64 {
        (self.snapshot_interval_s / DT).round().max(1.0) as u64
    }

    pub fn time_limit_ticks(&self) -> u64 {
        (self.time_limit_s / DT).round().max(1.0) as u64
    }
}
