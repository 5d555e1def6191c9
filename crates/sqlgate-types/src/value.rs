//! Driver-independent cell values.
//!
//! Every driver binding maps its native column values into [`Cell`], the
//! one value space the rest of the system sees. The mapping is lossless
//! where it matters: SQL `NULL` stays [`Cell::Null`] (never a zero or an
//! empty string), and exact numerics ride in a [`Decimal`] rather than a
//! float.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Coarse type label a driver declares for a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// Boolean column.
    Boolean,
    /// Integer column of any width, widened to 64 bits.
    Integer,
    /// Exact or approximate numeric column, carried as a decimal.
    Decimal,
    /// Character data.
    Text,
    /// Date/time column, normalized to UTC.
    Timestamp,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Text => "text",
            Self::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// One value in a result row.
///
/// Serializes untagged: `Null` becomes JSON `null`, `Text` a string,
/// `Integer` a number, `Timestamp` an RFC 3339 string. `Decimal`
/// serializes as a string so exact values survive the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// SQL `NULL`.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// Integer value, widened to 64 bits.
    Integer(i64),
    /// Exact numeric value.
    Decimal(Decimal),
    /// Character data.
    Text(String),
    /// Point in time in UTC.
    Timestamp(DateTime<Utc>),
}

impl Cell {
    /// Whether this cell is SQL `NULL`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The type tag this cell's value belongs to, if it carries one.
    ///
    /// `Null` has no tag of its own; the column declares the type.
    #[must_use]
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            Self::Null => None,
            Self::Boolean(_) => Some(TypeTag::Boolean),
            Self::Integer(_) => Some(TypeTag::Integer),
            Self::Decimal(_) => Some(TypeTag::Decimal),
            Self::Text(_) => Some(TypeTag::Text),
            Self::Timestamp(_) => Some(TypeTag::Timestamp),
        }
    }
}

/// Renders the cell for tabular display. `Null` renders as the empty
/// string, the way `psql` leaves null cells blank.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S %Z")),
        }
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<Decimal> for Cell {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T> From<Option<T>> for Cell
where
    T: Into<Cell>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_null_displays_empty() {
        assert_eq!(Cell::Null.to_string(), "");
    }

    #[test]
    fn test_decimal_display_preserves_scale() {
        let cell = Cell::Decimal(Decimal::from_str("125000.50").unwrap());
        assert_eq!(cell.to_string(), "125000.50");
    }

    #[test]
    fn test_timestamp_display() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        assert_eq!(Cell::Timestamp(ts).to_string(), "2024-01-15 09:30:00 UTC");
    }

    #[test]
    fn test_untagged_serialization() {
        let row = vec![
            Cell::Null,
            Cell::Boolean(true),
            Cell::Integer(42),
            Cell::Decimal(Decimal::from_str("12.50").unwrap()),
            Cell::Text("west".to_string()),
        ];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[null,true,42,"12.50","west"]"#);
    }

    #[test]
    fn test_timestamp_serializes_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let json = serde_json::to_string(&Cell::Timestamp(ts)).unwrap();
        assert!(json.starts_with("\"2024-01-15T00:00:00"));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Cell::from(None::<i64>), Cell::Null);
        assert_eq!(Cell::from(Some(7i64)), Cell::Integer(7));
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(Cell::Null.type_tag(), None);
        assert_eq!(Cell::Integer(1).type_tag(), Some(TypeTag::Integer));
        assert_eq!(TypeTag::Decimal.to_string(), "decimal");
    }
}
