//! Execution coordination.
//!
//! [`Gateway`] owns the full request lifecycle: validate the candidate
//! statement, acquire a pooled connection, execute under the hard
//! deadline, normalize the result. Each phase has its own failure
//! mapping, and the connection's fate depends on how the phase failed:
//! a server-reported error releases the connection healthy, a
//! connection-level failure or an elapsed deadline discards it.

use std::sync::Arc;
use std::time::Duration;

use sqlgate_guard::{KeywordPolicy, Validator, Verdict};
use sqlgate_pool::{Pool, PoolConfig, PoolError, PoolMetrics, PoolStatus, PooledConnection};
use sqlgate_types::ResultSet;

use crate::driver::{Connection, Connector, DriverError};
use crate::error::GatewayError;
use crate::normalize::normalize;
use crate::query::{CandidateQuery, QueryId};
use crate::sanitize::sanitize_message;
use crate::translate::Translator;

/// Default hard execution deadline.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default row cap applied by normalization.
pub const DEFAULT_MAX_ROWS: usize = 10;

/// Coordinates validation, pooling, execution, and normalization for
/// one database.
///
/// # Example
///
/// ```rust,ignore
/// use sqlgate_core::Gateway;
/// use sqlgate_postgres::PgConnector;
///
/// let gateway = Gateway::builder()
///     .query_timeout(Duration::from_secs(30))
///     .max_rows(10)
///     .build(PgConnector::from_url(&database_url)?)
///     .await?;
///
/// let candidate = CandidateQuery::new("SELECT region FROM sales_daily");
/// let result = gateway.run(&candidate).await?;
/// ```
pub struct Gateway<C: Connector> {
    validator: Validator,
    pool: Pool<C::Conn>,
    query_timeout: Duration,
    max_rows: usize,
}

impl<C: Connector> Gateway<C> {
    /// Create a gateway builder with default settings.
    #[must_use]
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Validate and, if accepted, execute one candidate statement.
    ///
    /// Rejected statements never touch the pool. Accepted statements
    /// run under the configured execution deadline; when the deadline
    /// elapses, a driver-level cancellation is fired at the server and
    /// the connection is discarded rather than reused.
    pub async fn run(&self, candidate: &CandidateQuery) -> Result<ResultSet, GatewayError> {
        let started = std::time::Instant::now();
        let query_id = candidate.id();

        let sql = match self.validator.validate(candidate.text()) {
            Verdict::Accepted { sql } => sql,
            Verdict::Rejected { reason } => {
                tracing::info!(query_id = %query_id, %reason, "query rejected");
                return Err(GatewayError::InvalidQuery(reason));
            }
        };

        let mut conn = self.pool.acquire().await.map_err(map_pool_error)?;

        // Taken before the statement starts so the deadline arm can
        // cancel while `query` is still pending.
        let cancel = conn.cancel_handle();

        match tokio::time::timeout(self.query_timeout, conn.query(&sql)).await {
            Err(_elapsed) => {
                let limit = self.query_timeout;
                tracing::warn!(
                    query_id = %query_id,
                    limit_ms = limit.as_millis() as u64,
                    connection_id = conn.id(),
                    "execution deadline elapsed, cancelling statement"
                );
                tokio::spawn(async move {
                    if let Err(err) = cancel.cancel().await {
                        tracing::warn!(
                            query_id = %query_id,
                            error = %err,
                            "statement cancellation failed"
                        );
                    }
                });
                // The server may still be executing; the connection
                // cannot be trusted to be idle.
                conn.discard();
                Err(GatewayError::Timeout { limit })
            }
            Ok(Ok(raw)) => {
                let result = normalize(raw, self.max_rows);
                tracing::info!(
                    query_id = %query_id,
                    rows = result.row_count(),
                    total_rows = result.total_rows,
                    truncated = result.truncated,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "query succeeded"
                );
                Ok(result)
            }
            Ok(Err(err)) => Err(map_driver_error(query_id, conn, err)),
        }
    }

    /// The single boundary call for a natural-language question:
    /// translate, wrap, validate, execute.
    ///
    /// The translator is untrusted; its output always goes through
    /// [`run`](Gateway::run) and with it the validator.
    pub async fn handle_query(
        &self,
        translator: &dyn Translator,
        question: &str,
        correlation_id: &str,
    ) -> Result<ResultSet, GatewayError> {
        tracing::info!(
            correlation_id,
            question_chars = question.chars().count(),
            "handling question"
        );

        let sql = translator.translate(question).await?;
        let candidate = CandidateQuery::new(sql).with_correlation_id(correlation_id);
        tracing::debug!(
            query_id = %candidate.id(),
            correlation_id,
            "question translated to candidate SQL"
        );
        self.run(&candidate).await
    }

    /// The active keyword policy.
    #[must_use]
    pub fn policy(&self) -> &KeywordPolicy {
        self.validator.policy()
    }

    /// Current pool status.
    #[must_use]
    pub fn pool_status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// Lifetime pool metrics.
    #[must_use]
    pub fn pool_metrics(&self) -> PoolMetrics {
        self.pool.metrics()
    }

    /// Close the underlying pool; all further requests fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn map_pool_error(err: PoolError) -> GatewayError {
    match err {
        PoolError::Exhausted { .. } => GatewayError::PoolExhausted,
        PoolError::Connect { message } => GatewayError::Database {
            message: sanitize_message(&message),
        },
        PoolError::Closed => GatewayError::Database {
            message: "connection pool is closed".to_string(),
        },
        PoolError::Config(message) => GatewayError::Database { message },
    }
}

fn map_driver_error<T: Connection>(
    query_id: QueryId,
    conn: PooledConnection<T>,
    err: DriverError,
) -> GatewayError {
    match err {
        DriverError::Database { message } => {
            // The server answered; the session is healthy.
            drop(conn);
            let message = sanitize_message(&message);
            tracing::info!(query_id = %query_id, error = %message, "database rejected query");
            GatewayError::Database { message }
        }
        DriverError::Connection { message } => {
            conn.discard();
            let message = sanitize_message(&message);
            tracing::warn!(
                query_id = %query_id,
                error = %message,
                "connection failed during query"
            );
            GatewayError::Database { message }
        }
        DriverError::Decode { column, ty } => {
            // The session is fine; the result shape is not.
            drop(conn);
            tracing::warn!(
                query_id = %query_id,
                column = %column,
                ty = %ty,
                "undecodable result column"
            );
            GatewayError::Database {
                message: format!("cannot decode column {column} of type {ty}"),
            }
        }
    }
}

/// Builder for a [`Gateway`].
#[derive(Debug, Clone)]
pub struct GatewayBuilder {
    pool_config: PoolConfig,
    query_timeout: Duration,
    max_rows: usize,
    policy: KeywordPolicy,
}

impl GatewayBuilder {
    /// Create a builder with default settings (30 second deadline, 10
    /// row cap, default pool, default keyword policy).
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool_config: PoolConfig::default(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            max_rows: DEFAULT_MAX_ROWS,
            policy: KeywordPolicy::default(),
        }
    }

    /// Set the pool configuration.
    #[must_use]
    pub fn pool_config(mut self, config: PoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    /// Set the hard execution deadline.
    ///
    /// Must be configured strictly shorter than any outer transport
    /// timeout, or callers will give up before the gateway answers.
    #[must_use]
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Set the row cap applied during normalization.
    #[must_use]
    pub fn max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Replace the forbidden-keyword policy.
    #[must_use]
    pub fn keyword_policy(mut self, policy: KeywordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the gateway, eagerly establishing the pool's minimum
    /// connections. Failure here is the one condition worth treating
    /// as fatal at startup.
    pub async fn build<C: Connector>(self, connector: C) -> Result<Gateway<C>, PoolError> {
        let connector = Arc::new(connector);
        let pool = Pool::new(self.pool_config, move || {
            let connector = Arc::clone(&connector);
            async move { connector.connect().await }
        })
        .await?;

        Ok(Gateway {
            validator: Validator::new(self.policy),
            pool,
            query_timeout: self.query_timeout,
            max_rows: self.max_rows,
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = GatewayBuilder::new();
        assert_eq!(builder.query_timeout, Duration::from_secs(30));
        assert_eq!(builder.max_rows, 10);
        assert!(builder.policy.is_forbidden("DROP"));
    }

    #[test]
    fn test_pool_error_mapping() {
        assert_eq!(
            map_pool_error(PoolError::Exhausted {
                waited: Duration::from_secs(5)
            }),
            GatewayError::PoolExhausted
        );
        let mapped = map_pool_error(PoolError::Connect {
            message: "refused at postgres://u:p@db/x".to_string(),
        });
        match mapped {
            GatewayError::Database { message } => assert!(!message.contains(":p@")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
