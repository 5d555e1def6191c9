//! Inbound query representation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic identifier assigned to each inbound query.
///
/// Present in every log line a query produces, so one request can be
/// followed from receipt through validation, execution, and
/// cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(u64);

impl QueryId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier value.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One untrusted candidate statement, immutable once created.
///
/// The text is whatever the caller (usually a translator) produced; it
/// has not been validated yet. A fresh [`QueryId`] is assigned on
/// construction.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    id: QueryId,
    text: String,
    correlation_id: Option<String>,
}

impl CandidateQuery {
    /// Wrap candidate statement text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: QueryId::next(),
            text: text.into(),
            correlation_id: None,
        }
    }

    /// Attach an external correlation identifier (for example the
    /// transport's user or channel) for log joining.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// The assigned query identifier.
    #[must_use]
    pub fn id(&self) -> QueryId {
        self.id
    }

    /// The raw statement text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The external correlation identifier, if any.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let a = CandidateQuery::new("SELECT 1");
        let b = CandidateQuery::new("SELECT 2");
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_correlation_id_attachment() {
        let q = CandidateQuery::new("SELECT 1").with_correlation_id("U123/C456");
        assert_eq!(q.correlation_id(), Some("U123/C456"));
        assert_eq!(q.text(), "SELECT 1");
    }
}
