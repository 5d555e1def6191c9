//! # sqlgate-pool
//!
//! Bounded async connection pool with exact capacity accounting.
//!
//! The pool is generic over the connection type; callers hand it an
//! async factory and get back RAII guards. The capacity invariant is
//! strict: outstanding connections (checked out, idle, or mid-creation)
//! never exceed `max_connections`, because idle reuse, slot
//! reservation, and the closed flag are all decided under a single
//! lock. Waiting is event-driven (`tokio::sync::Notify` plus a
//! deadline), never polled.
//!
//! ## Features
//!
//! - Configurable min/max pool sizes with eager minimum establishment
//! - Acquire timeout with `Exhausted` as a typed, retryable failure
//! - `discard()` for connections that must not be reused (lazy
//!   replacement keeps the slot accounting exact)
//! - Pool status and lifetime metrics for observability
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlgate_pool::{Pool, PoolConfig};
//!
//! let pool = Pool::builder()
//!     .min_connections(1)
//!     .max_connections(10)
//!     .build(|| async { PgConnector::connect().await })
//!     .await?;
//!
//! let conn = pool.acquire().await?;
//! // Use the connection; it returns to the pool on drop.
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod pool;

// Configuration
pub use config::PoolConfig;

// Error types
pub use error::PoolError;

// Pool types
pub use pool::{ConnectionFuture, Pool, PoolBuilder, PoolMetrics, PoolStatus, PooledConnection};
