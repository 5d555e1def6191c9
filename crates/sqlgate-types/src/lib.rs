//! # sqlgate-types
//!
//! Normalized, driver-independent result model.
//!
//! Whatever database sits behind the gateway, results cross the driver
//! boundary in one shape: a [`ResultSet`] of named, typed [`Column`]s and
//! rows of [`Cell`] values. The union is deliberately small (null, text,
//! integer, decimal, boolean, timestamp): wide enough for analytics
//! answers, narrow enough that every consumer can render every cell.
//!
//! ## Features
//!
//! - `Cell` union with untagged serde serialization (decimals as
//!   strings, timestamps as RFC 3339)
//! - SQL `NULL` preserved as a distinct variant, never coerced
//! - `ResultSet` with pre-truncation row count and an observable
//!   truncation flag
//! - Display impls suitable for plain-text tables (`NULL` renders empty)

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod table;
pub mod value;

pub use table::{Column, ResultSet};
pub use value::{Cell, TypeTag};
