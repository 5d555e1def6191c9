//! Tabular result shape.

use serde::Serialize;

use crate::value::{Cell, TypeTag};

/// One result column: its declared name and coarse type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Column name exactly as the server declared it.
    pub name: String,
    /// Coarse type label for the column.
    pub type_tag: TypeTag,
}

impl Column {
    /// Create a column descriptor.
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            type_tag,
        }
    }
}

/// A normalized query result.
///
/// Column order and names are preserved exactly as the server returned
/// them. `rows` may be capped by the normalizer; when it is, `truncated`
/// is set and `total_rows` still counts the uncapped result, so callers
/// can always tell a short result from a clipped one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    /// Ordered column descriptors.
    pub columns: Vec<Column>,
    /// Row data, in server order. `rows[i][j]` belongs to `columns[j]`.
    pub rows: Vec<Vec<Cell>>,
    /// Row count before any cap was applied.
    pub total_rows: usize,
    /// Whether `rows` was clipped to a configured cap.
    pub truncated: bool,
}

impl ResultSet {
    /// Build an uncapped result set; `total_rows` is taken from `rows`.
    #[must_use]
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Cell>>) -> Self {
        let total_rows = rows.len();
        Self {
            columns,
            rows,
            total_rows,
            truncated: false,
        }
    }

    /// A result with no columns and no rows (statements that return
    /// nothing tabular).
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Number of rows actually present (after any cap).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result carries no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Human-readable row-count caption: `"0 rows"`, `"1 row"`,
    /// `"42 rows"`, or `"10 of 811 rows (limited)"` when clipped.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.truncated {
            format!("{} of {} rows (limited)", self.rows.len(), self.total_rows)
        } else if self.total_rows == 1 {
            "1 row".to_string()
        } else {
            format!("{} rows", self.total_rows)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn two_column_set(rows: Vec<Vec<Cell>>) -> ResultSet {
        ResultSet::new(
            vec![
                Column::new("region", TypeTag::Text),
                Column::new("revenue", TypeTag::Decimal),
            ],
            rows,
        )
    }

    #[test]
    fn test_summary_pluralization() {
        assert_eq!(two_column_set(vec![]).summary(), "0 rows");
        assert_eq!(
            two_column_set(vec![vec![Cell::from("west"), Cell::Null]]).summary(),
            "1 row"
        );
        let many = (0..3)
            .map(|i| vec![Cell::from(format!("r{i}")), Cell::Integer(i)])
            .collect();
        assert_eq!(two_column_set(many).summary(), "3 rows");
    }

    #[test]
    fn test_summary_when_truncated() {
        let mut set = two_column_set(vec![vec![Cell::from("west"), Cell::Integer(1)]]);
        set.total_rows = 811;
        set.truncated = true;
        assert_eq!(set.summary(), "1 of 811 rows (limited)");
    }

    #[test]
    fn test_new_counts_rows() {
        let set = two_column_set(vec![
            vec![Cell::from("west"), Cell::Integer(1)],
            vec![Cell::from("east"), Cell::Integer(2)],
        ]);
        assert_eq!(set.total_rows, 2);
        assert!(!set.truncated);
        assert_eq!(set.row_count(), 2);
    }

    #[test]
    fn test_serializes_to_json() {
        let set = two_column_set(vec![vec![Cell::from("west"), Cell::Null]]);
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["columns"][0]["name"], "region");
        assert_eq!(json["columns"][1]["type_tag"], "decimal");
        assert_eq!(json["rows"][0][1], serde_json::Value::Null);
        assert_eq!(json["total_rows"], 1);
        assert_eq!(json["truncated"], false);
    }
}
