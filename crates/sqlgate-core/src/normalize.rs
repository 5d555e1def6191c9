//! Result normalization.
//!
//! Driver bindings produce uncapped [`ResultSet`]s; the normalizer owns
//! the row cap. Truncation is always observable: `total_rows` keeps the
//! pre-cap count and `truncated` flips, so no caller can mistake a
//! clipped result for a complete one.

use sqlgate_types::ResultSet;

/// Cap `raw` to at most `max_rows` rows.
///
/// Column order, column names, and every surviving cell value pass
/// through untouched; SQL `NULL` cells stay null.
#[must_use]
pub fn normalize(mut raw: ResultSet, max_rows: usize) -> ResultSet {
    raw.total_rows = raw.rows.len();
    if raw.rows.len() > max_rows {
        raw.rows.truncate(max_rows);
        raw.truncated = true;
        tracing::debug!(
            total_rows = raw.total_rows,
            cap = max_rows,
            "result truncated to row cap"
        );
    }
    raw
}
