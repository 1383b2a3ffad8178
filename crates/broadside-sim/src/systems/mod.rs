//! Combat systems run by the engine each tick.
//!
//! Systems are free functions over the ship arena (`&mut [ShipState]`) and
//! the projectile world (`&mut World`). They do not own state; anything they
//! report goes out as `PendingEvent`s for the engine to stamp into the log.

pub mod armor;
pub mod cleanup;
pub mod damage;
pub mod fire_control;
pub mod impact;
pub mod maneuver;
pub mod physics;
pub mod point_defense;
pub mod snapshot;
pub mod thermal;
pub mod torpedo;
pub mod victory;
