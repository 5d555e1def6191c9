//! # sqlgate-postgres
//!
//! PostgreSQL driver binding for the sqlgate gateway.
//!
//! Implements the core driver traits on top of `tokio-postgres`: each
//! session runs its connection task in the background, results decode
//! into the normalized cell model, and the cancellation handle wraps
//! the server's out-of-band cancel protocol, so an elapsed deadline
//! actually stops the statement instead of abandoning it.
//!
//! ## Features
//!
//! - `postgres://` URL and `key=value` conninfo configuration
//! - Column metadata from the prepared statement, so empty results
//!   still carry their columns
//! - Decode coverage for booleans, integers, floats, `NUMERIC`, text
//!   types, and the date/time family (normalized to UTC)
//! - Active statement cancellation via `CancelToken`

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod connector;
mod decode;

pub use connector::{PgConnection, PgConnector};
