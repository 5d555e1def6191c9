//! Gateway error taxonomy.

use std::time::Duration;

use thiserror::Error;

use sqlgate_guard::RejectReason;

use crate::translate::TranslateError;

/// The typed failure space of a gateway request.
///
/// Every variant is safe to show to end users via
/// [`user_message`](GatewayError::user_message): database messages are
/// sanitized before they are stored here, and rejection reasons never
/// contain anything beyond the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Validation refused the statement before any database contact.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] RejectReason),

    /// Every pool slot stayed busy for the whole acquire timeout.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// The execution deadline elapsed; the statement was cancelled and
    /// its connection discarded.
    #[error("query timed out after {limit:?}")]
    Timeout {
        /// The configured execution deadline.
        limit: Duration,
    },

    /// The database (or the connection to it) failed. The message has
    /// been sanitized.
    #[error("database error: {message}")]
    Database {
        /// Sanitized failure description.
        message: String,
    },

    /// Natural-language translation failed; no SQL was produced.
    #[error("translation failed: {0}")]
    Translation(#[from] TranslateError),
}

impl GatewayError {
    /// Short, non-technical rendering for end users. Internal detail
    /// stays in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidQuery(reason) => {
                format!("Query validation failed: {reason}")
            }
            Self::PoolExhausted => {
                "The database is busy right now. Please try again in a moment.".to_string()
            }
            Self::Timeout { limit } => format!(
                "Query timed out after {} seconds. Try a narrower question.",
                limit.as_secs()
            ),
            Self::Database { message } => format!("Database error: {message}"),
            Self::Translation(_) => {
                "Sorry, I could not understand the question. Try rephrasing it.".to_string()
            }
        }
    }

    /// Whether retrying the same request later could succeed without
    /// any change to it.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted | Self::Timeout { .. })
    }
}
