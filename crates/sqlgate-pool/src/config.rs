//! Pool configuration.

use std::time::Duration;

use crate::error::PoolError;

/// Configuration for a connection pool.
///
/// All setters consume and return `self` so configs can be built
/// fluently:
///
/// ```rust
/// use std::time::Duration;
/// use sqlgate_pool::PoolConfig;
///
/// let config = PoolConfig::new()
///     .min_connections(2)
///     .max_connections(20)
///     .acquire_timeout(Duration::from_secs(3));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Connections established eagerly at pool creation.
    pub min_connections: u32,
    /// Hard capacity: outstanding connections never exceed this.
    pub max_connections: u32,
    /// How long an acquisition may wait for a free slot before failing.
    pub acquire_timeout: Duration,
}

impl PoolConfig {
    /// Create a configuration with default settings (1 minimum, 10
    /// maximum, 5 second acquire timeout).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of connections established at startup.
    #[must_use]
    pub fn min_connections(mut self, count: u32) -> Self {
        self.min_connections = count;
        self
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.max_connections = count;
        self
    }

    /// Set the acquisition timeout.
    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_connections == 0 {
            return Err(PoolError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(PoolError::Config(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}
