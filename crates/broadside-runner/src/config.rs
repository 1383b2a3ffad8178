//! Runner settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a battle is driven from outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Wall-clock budget for each captain's answer at a checkpoint.
    pub order_timeout_ms: u64,
    /// Stop after this many checkpoints even without an outcome.
    pub max_checkpoints: u32,
    /// Keep the snapshot trace in the battle record.
    pub record_snapshots: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            order_timeout_ms: 5_000,
            max_checkpoints: 200,
            record_snapshots: true,
        }
    }
}

impl RunnerConfig {
    pub fn order_timeout(&self) -> Duration {
        Duration::from_millis(self.order_timeout_ms)
    }
}
