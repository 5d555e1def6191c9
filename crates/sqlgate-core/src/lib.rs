//! # sqlgate-core
//!
//! Safety gateway between untrusted SQL producers and a real database.
//!
//! Machine-generated SQL (an LLM translator, a templating layer, any
//! producer that cannot be trusted) goes in one side; what comes out is
//! either a normalized [`ResultSet`](sqlgate_types::ResultSet) or a
//! typed [`GatewayError`]. In between, every request passes four
//! stages: lexical validation, bounded pool acquisition, execution
//! under a hard deadline with active server-side cancellation, and row
//! capping. Drivers plug in through the [`Connector`]/[`Connection`]
//! traits; translators through [`Translator`].
//!
//! ## Features
//!
//! - Validation before any database contact (rejected text never costs
//!   a pool slot)
//! - Distinct acquire and execution timeouts, both typed failures
//! - Deadline expiry cancels the statement server-side and discards the
//!   connection instead of re-pooling it busy
//! - Driver error messages sanitized (connection URLs, credentials,
//!   paths) and length-capped before they can reach users
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlgate_core::{CandidateQuery, Gateway};
//!
//! let gateway = Gateway::builder().build(connector).await?;
//! let result = gateway
//!     .run(&CandidateQuery::new("SELECT region FROM sales_daily"))
//!     .await?;
//! println!("{}", result.summary());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod driver;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod query;
pub mod sanitize;
pub mod translate;

pub use driver::{Connection, Connector, DriverError, QueryCancel};
pub use error::GatewayError;
pub use gateway::{Gateway, GatewayBuilder, DEFAULT_MAX_ROWS, DEFAULT_QUERY_TIMEOUT};
pub use normalize::normalize;
pub use query::{CandidateQuery, QueryId};
pub use sanitize::sanitize_message;
pub use translate::{TranslateError, Translator};
