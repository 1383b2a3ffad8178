//! Application layer around the broadside combat kernel.
//!
//! Captains answer at checkpoints under a wall-clock budget, the battle loop
//! feeds their orders to the engine, and batches run many isolated battles
//! in parallel for scoring.

pub mod batch;
pub mod battle;
pub mod captain;
pub mod collect;
pub mod config;
pub mod error;

pub use battle::{load_scenario, run_battle, BattleRecord};
pub use captain::{Captain, CaptainView, DoctrineCaptain, HoldCaptain, ScriptedCaptain};
pub use collect::{collect_orders, Seat};
pub use config::RunnerConfig;
pub use error::{Result, RunnerError};
