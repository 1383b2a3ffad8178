//! Simulation constants and default tuning parameters.
//!
//! Values that a battle may override live in `BattleConfig`; the constants
//! here are their defaults plus fixed physical quantities.

/// Physics tick rate (Hz).
pub const TICK_RATE: u32 = 10;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

/// Standard gravity, used only to express accelerations in g.
pub const G0: f64 = 9.806_65;

// --- Checkpoints ---

/// Default simulated seconds between order checkpoints.
pub const CHECKPOINT_INTERVAL_SECS: f64 = 30.0;

/// Shortest allowed checkpoint interval.
pub const CHECKPOINT_INTERVAL_MIN_SECS: f64 = 20.0;

/// Longest allowed checkpoint interval.
pub const CHECKPOINT_INTERVAL_MAX_SECS: f64 = 60.0;

/// Default battle time limit (30 minutes simulated).
pub const TIME_LIMIT_SECS: f64 = 1800.0;

/// Default snapshot sampling interval.
pub const SNAPSHOT_INTERVAL_SECS: f64 = 1.0;

// --- Damage ---

/// Default energy-to-HP conversion: 10 MJ per hit point.
pub const JOULES_PER_HP: f64 = 1.0e7;

/// HP values are truncated to this precision after conversion.
pub const HP_PRECISION: f64 = 0.01;

/// Critical-hit probability floor for any damaging hit.
pub const CRIT_BASE_CHANCE: f64 = 0.02;

/// Critical-hit probability added per unit of (damage / module max HP).
pub const CRIT_CHANCE_PER_DAMAGE_RATIO: f64 = 0.5;

/// Critical-hit probability ceiling.
pub const CRIT_MAX_CHANCE: f64 = 0.6;

/// Structural integrity fraction below which a ship breaks up.
pub const STRUCTURAL_THRESHOLD: f64 = 0.25;

/// Armor obliquity is capped so effective thickness stays finite (cos 80°).
pub const MAX_OBLIQUITY_DEG: f64 = 80.0;

/// Impact angle clamp, degrees from the zone normal.
pub const MAX_INCIDENCE_DEG: f64 = 89.0;

/// Half-angle of the nose and tail armor caps, degrees off the hull axis.
pub const END_ZONE_HALF_ANGLE_DEG: f64 = 30.0;

/// Area over which a single impact vaporizes armor.
pub const ABLATION_AREA_M2: f64 = 1.0;

/// Radiator hit chance for lateral/tail hits with radiators extended.
pub const RADIATOR_HIT_CHANCE_EXTENDED: f64 = 0.20;

/// Radiator hit chance for lateral/tail hits with radiators retracted.
pub const RADIATOR_HIT_CHANCE_RETRACTED: f64 = 0.05;

/// HP of radiator damage that wipes out the whole radiator array.
pub const RADIATOR_HP: f64 = 50.0;

/// Reactor damage never stretches cooldowns beyond 1 / this factor.
pub const MIN_REACTOR_EFFECTIVENESS: f64 = 0.25;

// --- Fire control ---

/// Base per-round hit chance at point-blank range with a cold ship.
pub const BASE_HIT_CHANCE: f64 = 0.9;

/// Deliberate miss offset range, in multiples of the target hit radius.
pub const MISS_OFFSET_MIN_RADII: f64 = 2.0;
pub const MISS_OFFSET_MAX_RADII: f64 = 5.0;

/// Lead-pursuit refinement passes when computing an aim point.
pub const LEAD_ITERATIONS: usize = 3;

/// Unguided rounds are removed after this long in flight.
pub const SLUG_MAX_FLIGHT_SECS: f64 = 600.0;

// --- Thermal ---

/// Heat-percentage thresholds for accuracy bands (mild, severe, near-total).
pub const HEAT_BANDS_PERCENT: [f64; 3] = [50.0, 75.0, 90.0];

/// Accuracy multipliers once each band is reached.
pub const HEAT_BAND_ACCURACY: [f64; 3] = [0.85, 0.5, 0.1];

// --- Point defense ---

/// A projectile is a threat if its predicted miss distance is under this many hit radii.
pub const PD_THREAT_MARGIN_RADII: f64 = 3.0;

/// Priority weight for a guided torpedo.
pub const PD_WEIGHT_GUIDED: f64 = 4.0;

/// Priority weight for a torpedo whose electronics are already burnt out.
pub const PD_WEIGHT_INERT: f64 = 2.0;

/// Priority weight for an unguided slug.
pub const PD_WEIGHT_SLUG: f64 = 1.0;

/// Priority multiplier for threats the mount cannot kill before impact.
pub const PD_UNKILLABLE_PENALTY: f64 = 0.1;

/// Time-to-impact floor for priority scoring.
pub const PD_MIN_TTI_SECS: f64 = 0.5;

/// Heat of vaporization of slug material (steel), J/kg.
pub const SLUG_HEAT_OF_VAPORIZATION: f64 = 3.0e7;

// --- Maneuvering ---

/// Evasive maneuvers rotate their jink direction this often.
pub const EVASIVE_JINK_PERIOD_SECS: f64 = 8.0;

/// Below this speed BRAKE stops thrusting.
pub const BRAKE_STOP_SPEED: f64 = 1.0;

/// Attitude controller proportional gain (1/s).
pub const ATTITUDE_GAIN: f64 = 0.8;

/// Minimum closing speed assumed by the intercept planner.
pub const INTERCEPT_MIN_CLOSING: f64 = 1000.0;

/// Longest look-ahead of the intercept planner.
pub const INTERCEPT_MAX_LOOKAHEAD_SECS: f64 = 600.0;

// --- Victory ---

/// Weight of the damage ratio in the time-limit score.
pub const SCORE_RATIO_WEIGHT: f64 = 40.0;

/// Weight of the average hull percentage in the time-limit score.
pub const SCORE_HULL_WEIGHT: f64 = 0.6;

/// Score gap below which a time-limit result is a draw.
pub const DRAW_SCORE_MARGIN: f64 = 5.0;
