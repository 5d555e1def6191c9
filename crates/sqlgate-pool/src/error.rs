//! Pool error types.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by pool operations.
#[derive(Debug, Clone, Error)]
pub enum PoolError {
    /// The configuration failed validation.
    #[error("invalid pool configuration: {0}")]
    Config(String),

    /// The connection factory failed to establish a new connection.
    #[error("failed to establish connection: {message}")]
    Connect {
        /// Factory error, rendered to text.
        message: String,
    },

    /// Every slot stayed busy for the whole acquisition timeout.
    #[error("connection pool exhausted (waited {waited:?})")]
    Exhausted {
        /// How long the acquisition waited before giving up.
        waited: Duration,
    },

    /// The pool has been closed; no further acquisitions are possible.
    #[error("connection pool is closed")]
    Closed,
}

impl PoolError {
    /// Whether retrying the acquisition later could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::Connect { .. })
    }
}
