//! Error types for counter setup and worker management.
//!
//! Queue backpressure, pool exhaustion, missing ids and starved waits are normal
//! outcomes and are reported through `Option`, `bool` or a shift terminal reason.

use thiserror::Error;

/// Errors produced while building or driving counter components.
#[derive(Debug, Error)]
pub enum CounterError {
    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The OS refused to start an agency thread.
    #[error("failed to spawn agency worker {agency}: {source}")]
    Spawn {
        /// Agency that failed to start.
        agency: usize,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
