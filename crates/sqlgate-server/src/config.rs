//! Environment-driven server configuration.
//!
//! All settings come from environment variables. Required ones are
//! collected and reported together, so a fresh deployment learns every
//! missing key from a single failure instead of one at a time.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use sqlgate_guard::KeywordPolicy;
use sqlgate_pool::PoolConfig;
use thiserror::Error;

/// Configuration failures at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required environment variables are unset.
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    /// An environment variable is set but does not parse.
    #[error("invalid value for {var}: {message}")]
    Invalid {
        /// The offending variable name.
        var: String,
        /// Why its value was rejected.
        message: String,
    },
}

/// Runtime settings for the server binary.
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | `DATABASE_URL` | required | PostgreSQL connection URL |
/// | `SLACK_SIGNING_SECRET` | required | Slack request-signing secret |
/// | `GROQ_API_KEY` | required | Translation service API key |
/// | `GROQ_MODEL` | `mixtral-8x7b-32768` | Translation model name |
/// | `BIND_ADDR` | `0.0.0.0:8000` | HTTP listen address |
/// | `QUERY_TIMEOUT_SECS` | `30` | Hard execution deadline |
/// | `POOL_MIN_CONNECTIONS` | `1` | Connections opened at startup |
/// | `POOL_MAX_CONNECTIONS` | `10` | Pool capacity |
/// | `POOL_ACQUIRE_TIMEOUT_SECS` | `5` | Checkout deadline |
/// | `MAX_RESULT_ROWS` | `10` | Row cap on results |
/// | `FORBIDDEN_KEYWORDS` | empty | Comma-separated policy additions |
/// | `LOG_LEVEL` | `info` | Log filter; `RUST_LOG` wins when set |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Secret for verifying Slack request signatures.
    pub slack_signing_secret: String,
    /// API key for the translation service.
    pub groq_api_key: String,
    /// Model name sent to the translation service.
    pub groq_model: String,
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Hard execution deadline per query.
    pub query_timeout: Duration,
    /// Connections the pool opens eagerly.
    pub pool_min_connections: u32,
    /// Pool capacity.
    pub pool_max_connections: u32,
    /// How long a request may wait for a pooled connection.
    pub pool_acquire_timeout: Duration,
    /// Row cap applied to every result.
    pub max_rows: usize,
    /// Keywords forbidden in addition to the default policy.
    pub extra_forbidden_keywords: Vec<String>,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut required = |key: &str| match lookup(key) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(key.to_string());
                String::new()
            }
        };

        let database_url = required("DATABASE_URL");
        let slack_signing_secret = required("SLACK_SIGNING_SECRET");
        let groq_api_key = required("GROQ_API_KEY");

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let config = Self {
            database_url,
            slack_signing_secret,
            groq_api_key,
            groq_model: lookup("GROQ_MODEL").unwrap_or_else(|| "mixtral-8x7b-32768".to_string()),
            bind_addr: parsed(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8000)))?,
            query_timeout: Duration::from_secs(parsed(&lookup, "QUERY_TIMEOUT_SECS", 30)?),
            pool_min_connections: parsed(&lookup, "POOL_MIN_CONNECTIONS", 1)?,
            pool_max_connections: parsed(&lookup, "POOL_MAX_CONNECTIONS", 10)?,
            pool_acquire_timeout: Duration::from_secs(parsed(
                &lookup,
                "POOL_ACQUIRE_TIMEOUT_SECS",
                5,
            )?),
            max_rows: parsed(&lookup, "MAX_RESULT_ROWS", 10)?,
            extra_forbidden_keywords: lookup("FORBIDDEN_KEYWORDS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|kw| !kw.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        if config.pool_max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "POOL_MAX_CONNECTIONS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if config.pool_min_connections > config.pool_max_connections {
            return Err(ConfigError::Invalid {
                var: "POOL_MIN_CONNECTIONS".to_string(),
                message: format!(
                    "{} exceeds POOL_MAX_CONNECTIONS {}",
                    config.pool_min_connections, config.pool_max_connections
                ),
            });
        }

        Ok(config)
    }

    /// Pool settings derived from this configuration.
    #[must_use]
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new()
            .min_connections(self.pool_min_connections)
            .max_connections(self.pool_max_connections)
            .acquire_timeout(self.pool_acquire_timeout)
    }

    /// The default keyword policy extended with any configured additions.
    #[must_use]
    pub fn keyword_policy(&self) -> KeywordPolicy {
        let mut policy = KeywordPolicy::default();
        for keyword in &self.extra_forbidden_keywords {
            policy.forbid(keyword);
        }
        policy
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|err| ConfigError::Invalid {
            var: var.to_string(),
            message: format!("{err} (got {raw:?})"),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://bot:pw@db:5432/analytics"),
            ("SLACK_SIGNING_SECRET", "sssh"),
            ("GROQ_API_KEY", "gsk_test"),
        ])
    }

    fn load(env: &HashMap<&str, &str>) -> Result<ServerConfig, ConfigError> {
        ServerConfig::from_lookup(|key| env.get(key).map(|v| (*v).to_string()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.groq_model, "mixtral-8x7b-32768");
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.query_timeout, Duration::from_secs(30));
        assert_eq!(config.pool_min_connections, 1);
        assert_eq!(config.pool_max_connections, 10);
        assert_eq!(config.pool_acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.max_rows, 10);
        assert!(config.extra_forbidden_keywords.is_empty());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_all_missing_keys_reported_together() {
        let err = load(&HashMap::new()).unwrap_err();
        match err {
            ConfigError::Missing(keys) => {
                assert_eq!(
                    keys,
                    vec!["DATABASE_URL", "SLACK_SIGNING_SECRET", "GROQ_API_KEY"]
                );
            }
            other => panic!("expected Missing, got {other}"),
        }
    }

    #[test]
    fn test_blank_required_value_counts_as_missing() {
        let mut env = base_env();
        env.insert("GROQ_API_KEY", "  ");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
        assert!(!err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_overrides_parsed() {
        let mut env = base_env();
        env.insert("BIND_ADDR", "127.0.0.1:9001");
        env.insert("QUERY_TIMEOUT_SECS", "5");
        env.insert("MAX_RESULT_ROWS", "50");
        env.insert("FORBIDDEN_KEYWORDS", "vacuum, reindex ,,");

        let config = load(&env).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9001");
        assert_eq!(config.query_timeout, Duration::from_secs(5));
        assert_eq!(config.max_rows, 50);
        assert_eq!(config.extra_forbidden_keywords, vec!["vacuum", "reindex"]);

        let policy = config.keyword_policy();
        assert!(policy.is_forbidden("VACUUM"));
        assert!(policy.is_forbidden("drop"));
    }

    #[test]
    fn test_garbage_number_is_invalid_not_defaulted() {
        let mut env = base_env();
        env.insert("QUERY_TIMEOUT_SECS", "thirty");
        let err = load(&env).unwrap_err();
        match err {
            ConfigError::Invalid { var, .. } => assert_eq!(var, "QUERY_TIMEOUT_SECS"),
            other => panic!("expected Invalid, got {other}"),
        }
    }

    #[test]
    fn test_pool_bounds_checked() {
        let mut env = base_env();
        env.insert("POOL_MIN_CONNECTIONS", "8");
        env.insert("POOL_MAX_CONNECTIONS", "2");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("POOL_MIN_CONNECTIONS"));

        let mut env = base_env();
        env.insert("POOL_MAX_CONNECTIONS", "0");
        assert!(load(&env).is_err());
    }
}
