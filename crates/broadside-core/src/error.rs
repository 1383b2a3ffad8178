//! Error types for the combat engine.
//!
//! Ship-level trouble never shows up here: it becomes combat events and
//! ship status changes. Only setup problems and battle-fatal invariant
//! violations surface as errors.

use thiserror::Error;

use crate::types::ShipId;

/// Result type alias using [`CombatError`].
pub type Result<T> = std::result::Result<T, CombatError>;

/// Top-level error type for catalog loading, battle setup and engine faults.
#[derive(Debug, Error)]
pub enum CombatError {
    /// Ship class name not present in the catalog.
    #[error("Unknown ship class: {0}")]
    UnknownShipClass(String),

    /// Weapon referenced by a ship class is missing.
    #[error("Unknown weapon '{weapon}' on class '{class}'")]
    UnknownWeapon { class: String, weapon: String },

    /// Torpedo referenced by a launcher is missing.
    #[error("Unknown torpedo '{torpedo}' on weapon '{weapon}'")]
    UnknownTorpedo { weapon: String, torpedo: String },

    /// Armor material referenced by a ship class is missing.
    #[error("Unknown armor material '{material}' on class '{class}'")]
    UnknownMaterial { class: String, material: String },

    /// Weapon mounted on a module the class does not have.
    #[error("Weapon '{weapon}' on class '{class}' is mounted on unknown module '{module}'")]
    UnknownMountModule {
        class: String,
        weapon: String,
        module: String,
    },

    /// Torpedo spec with a non-physical value.
    #[error("Invalid torpedo '{torpedo}': {reason}")]
    InvalidTorpedo { torpedo: String, reason: String },

    /// Launcher whose round mass differs from the torpedo it fires.
    #[error("Launcher '{weapon}' rounds weigh {round_mass_kg} kg but torpedo '{torpedo}' weighs {torpedo_mass_kg} kg")]
    LauncherMassMismatch {
        weapon: String,
        torpedo: String,
        round_mass_kg: f64,
        torpedo_mass_kg: f64,
    },

    /// Ship class without room for the heat it makes.
    #[error("Class '{class}' needs a positive heat sink, got {heat_sink_j} J")]
    InvalidHeatSink { class: String, heat_sink_j: f64 },

    /// Catalog content that cannot describe a working ship.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Battle configuration out of range.
    #[error("Invalid battle config: {0}")]
    InvalidConfig(String),

    /// Battle setup that cannot start a fight.
    #[error("Invalid battle setup: {0}")]
    InvalidSetup(String),

    /// Data file parsing error.
    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Data file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Orders addressed to a ship id the battle does not have.
    #[error("Unknown ship: {0}")]
    UnknownShip(ShipId),

    /// `run_checkpoint` called after a terminal outcome.
    #[error("Battle has already ended")]
    BattleOver,

    /// Battle-fatal invariant violation.
    #[error(transparent)]
    Fault(#[from] EngineFault),
}

/// Unrecoverable internal invariant violations. These halt the battle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineFault {
    #[error("Engine fault at tick {tick}: {ship} has negative mass {mass_kg} kg")]
    NegativeMass { tick: u64, ship: ShipId, mass_kg: f64 },

    #[error("Engine fault: event time went backwards ({last} s -> {next} s)")]
    TimeRegression { last: f64, next: f64 },
}
