//! Driver abstraction.
//!
//! The gateway talks to databases through three small traits: a
//! [`Connector`] establishes sessions, a [`Connection`] executes
//! statements and decodes them into the normalized result model, and a
//! [`QueryCancel`] handle stops an in-flight statement out-of-band.
//! The cancel handle is deliberately separate from the connection: the
//! coordinator takes it before issuing the statement, so it can fire
//! the cancellation while the connection is still stuck in `query`.

use async_trait::async_trait;
use thiserror::Error;

use sqlgate_types::ResultSet;

/// Errors surfaced by a database driver.
///
/// The three variants drive different connection lifecycles in the
/// coordinator: `Database` leaves the session healthy, `Connection`
/// discards it, `Decode` leaves it healthy but fails the request.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// The server processed the statement and reported an error
    /// (syntax, missing relation, permissions).
    #[error("database error: {message}")]
    Database {
        /// Server-reported message, unsanitized.
        message: String,
    },

    /// The session itself failed (I/O, protocol violation, closed
    /// connection).
    #[error("connection error: {message}")]
    Connection {
        /// Driver-reported message, unsanitized.
        message: String,
    },

    /// The result contained a column type the normalized model cannot
    /// represent.
    #[error("cannot decode column {column} of type {ty}")]
    Decode {
        /// Column name as declared by the server.
        column: String,
        /// Native type name.
        ty: String,
    },
}

/// Handle that cancels an in-flight statement server-side.
///
/// Obtained from [`Connection::cancel_handle`] before the statement is
/// issued; usable from another task while `query` is still pending.
#[async_trait]
pub trait QueryCancel: Send + Sync {
    /// Attempt to stop the running statement. Best effort: failure
    /// means the statement may still be running server-side.
    async fn cancel(&self) -> Result<(), DriverError>;
}

/// A live database session.
#[async_trait]
pub trait Connection: Send {
    /// Execute one statement and decode its full, uncapped result.
    async fn query(&mut self, sql: &str) -> Result<ResultSet, DriverError>;

    /// Cheap liveness probe.
    async fn ping(&mut self) -> Result<(), DriverError>;

    /// A cancellation handle for whatever statement this connection
    /// runs next.
    fn cancel_handle(&self) -> Box<dyn QueryCancel>;
}

/// Factory for database sessions; the pool calls this to fill slots.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Connection type this connector produces.
    type Conn: Connection + 'static;

    /// Establish a new session.
    async fn connect(&self) -> Result<Self::Conn, DriverError>;
}
