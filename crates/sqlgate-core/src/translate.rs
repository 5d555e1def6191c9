//! Natural-language to SQL translation seam.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a translation backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// The translation service could not be reached.
    #[error("translation request failed: {0}")]
    Transport(String),

    /// The service answered, but with an error or an unusable payload.
    #[error("translation service error: {0}")]
    Service(String),

    /// The service returned no SQL at all.
    #[error("translation produced no SQL")]
    Empty,
}

/// Turns a natural-language question into one candidate SQL statement.
///
/// Implementations are untrusted by construction: whatever text they
/// produce goes through validation before it can execute.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `question` into a single SQL statement.
    async fn translate(&self, question: &str) -> Result<String, TranslateError>;
}
