//! Core types and definitions for the broadside combat engine.
//!
//! This crate defines the vocabulary shared across all other crates:
//! components, orders, events, catalog templates, battle configuration,
//! snapshot views, errors and constants. It contains no simulation logic.

pub mod catalog;
pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod orders;
pub mod setup;
pub mod state;
pub mod types;

pub use error::{CombatError, EngineFault, Result};
