//! Error types for the battle runner.

use thiserror::Error;

use broadside_core::CombatError;

pub type Result<T> = std::result::Result<T, RunnerError>;

#[derive(Debug, Error)]
pub enum RunnerError {
    /// Engine rejected the setup or halted on a fault.
    #[error(transparent)]
    Combat(#[from] CombatError),

    /// Neither a built-in scenario name nor a readable file.
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
