//! Combat kernel for broadside.
//!
//! Owns the hecs projectile world and the ship arena, runs the combat
//! systems at a fixed tick rate between order checkpoints, and produces the
//! event log and snapshot trace.

pub mod engine;
pub mod guidance;
pub mod scenario;
pub mod systems;
pub mod world_setup;

pub use broadside_core as core;
pub use engine::{BattleEngine, CheckpointReport};
