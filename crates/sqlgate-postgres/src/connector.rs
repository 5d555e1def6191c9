//! PostgreSQL connector and session.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use tokio_postgres::{Client, Config, NoTls};

use sqlgate_core::{Connection, Connector, DriverError, QueryCancel};
use sqlgate_types::ResultSet;

use crate::decode;

/// Default session establishment timeout, applied when the URL does not
/// set one.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connector for PostgreSQL, backed by `tokio-postgres`.
///
/// # Example
///
/// ```rust,ignore
/// use sqlgate_postgres::PgConnector;
///
/// let connector = PgConnector::from_url("postgres://bot:pw@localhost/sales")?;
/// let gateway = Gateway::builder().build(connector).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PgConnector {
    config: Config,
}

impl PgConnector {
    /// Parse a `postgres://` URL or `key=value` conninfo string.
    pub fn from_url(url: &str) -> Result<Self, DriverError> {
        let mut config = Config::from_str(url).map_err(|err| DriverError::Connection {
            message: format!("invalid database URL: {err}"),
        })?;
        if config.get_connect_timeout().is_none() {
            config.connect_timeout(DEFAULT_CONNECT_TIMEOUT);
        }
        Ok(Self { config })
    }

    /// Override the session establishment timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout(timeout);
        self
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Conn = PgConnection;

    async fn connect(&self) -> Result<Self::Conn, DriverError> {
        let (client, connection) = self
            .config
            .connect(NoTls)
            .await
            .map_err(|err| map_pg_error(&err))?;

        // The connection task drives the socket; it ends when the
        // client is dropped.
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::warn!(error = %err, "postgres connection task ended with error");
            }
        });

        tracing::debug!("postgres session established");
        Ok(PgConnection { client })
    }
}

/// One live PostgreSQL session.
pub struct PgConnection {
    client: Client,
}

#[async_trait]
impl Connection for PgConnection {
    async fn query(&mut self, sql: &str) -> Result<ResultSet, DriverError> {
        // Prepare first so column metadata is available even for
        // zero-row results.
        let statement = self
            .client
            .prepare(sql)
            .await
            .map_err(|err| map_pg_error(&err))?;
        let columns = decode::columns(statement.columns())?;

        let rows = self
            .client
            .query(&statement, &[])
            .await
            .map_err(|err| map_pg_error(&err))?;
        let data = rows
            .iter()
            .map(decode::row_cells)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResultSet::new(columns, data))
    }

    async fn ping(&mut self) -> Result<(), DriverError> {
        self.client
            .simple_query("SELECT 1")
            .await
            .map(|_| ())
            .map_err(|err| map_pg_error(&err))
    }

    fn cancel_handle(&self) -> Box<dyn QueryCancel> {
        Box::new(PgCancel {
            token: self.client.cancel_token(),
        })
    }
}

struct PgCancel {
    token: tokio_postgres::CancelToken,
}

#[async_trait]
impl QueryCancel for PgCancel {
    async fn cancel(&self) -> Result<(), DriverError> {
        // Out-of-band: opens its own short-lived connection to the
        // server and fires the cancel request for our backend.
        self.token
            .cancel_query(NoTls)
            .await
            .map_err(|err| map_pg_error(&err))
    }
}

/// Classify a driver error: server-reported failures keep the session,
/// everything else condemns it.
fn map_pg_error(err: &tokio_postgres::Error) -> DriverError {
    if let Some(db) = err.as_db_error() {
        DriverError::Database {
            message: db.message().to_string(),
        }
    } else {
        DriverError::Connection {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_accepts_conninfo_and_urls() {
        assert!(PgConnector::from_url("postgres://bot:pw@localhost:5432/sales").is_ok());
        assert!(PgConnector::from_url("host=localhost user=bot dbname=sales").is_ok());
    }

    #[test]
    fn test_from_url_rejects_garbage() {
        let err = PgConnector::from_url("not a database url");
        assert!(matches!(err, Err(DriverError::Connection { .. })));
    }

    #[test]
    fn test_connect_timeout_default_applied() {
        let connector = PgConnector::from_url("postgres://bot@localhost/sales").unwrap();
        assert_eq!(
            connector.config.get_connect_timeout(),
            Some(&DEFAULT_CONNECT_TIMEOUT)
        );
    }

    #[test]
    fn test_connect_timeout_from_url_wins() {
        let connector =
            PgConnector::from_url("host=localhost user=bot connect_timeout=3").unwrap();
        assert_eq!(
            connector.config.get_connect_timeout(),
            Some(&Duration::from_secs(3))
        );
    }
}
