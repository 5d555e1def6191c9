//! PostgreSQL value decoding.
//!
//! Maps native column types onto the normalized model. The mapping is
//! deliberately conservative: every integer width widens to 64 bits,
//! floats and `NUMERIC` both land in [`Cell::Decimal`], and the three
//! date/time column types all normalize to UTC timestamps (`DATE`
//! becomes midnight, `TIMESTAMP` without zone is taken as UTC). A
//! column type outside the supported set fails the whole result with
//! [`DriverError::Decode`] before any row is read.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use tokio_postgres::types::Type;
use tokio_postgres::Row;

use sqlgate_core::DriverError;
use sqlgate_types::{Cell, Column, TypeTag};

/// Map a native column type to its coarse tag.
pub(crate) fn type_tag(column: &str, ty: &Type) -> Result<TypeTag, DriverError> {
    if *ty == Type::BOOL {
        Ok(TypeTag::Boolean)
    } else if *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8 {
        Ok(TypeTag::Integer)
    } else if *ty == Type::FLOAT4 || *ty == Type::FLOAT8 || *ty == Type::NUMERIC {
        Ok(TypeTag::Decimal)
    } else if *ty == Type::TEXT
        || *ty == Type::VARCHAR
        || *ty == Type::BPCHAR
        || *ty == Type::NAME
        || *ty == Type::TIME
    {
        Ok(TypeTag::Text)
    } else if *ty == Type::DATE || *ty == Type::TIMESTAMP || *ty == Type::TIMESTAMPTZ {
        Ok(TypeTag::Timestamp)
    } else {
        Err(decode_error(column, ty.name()))
    }
}

/// Decode statement column metadata, failing on the first
/// unrepresentable type.
pub(crate) fn columns(columns: &[tokio_postgres::Column]) -> Result<Vec<Column>, DriverError> {
    columns
        .iter()
        .map(|col| Ok(Column::new(col.name(), type_tag(col.name(), col.type_())?)))
        .collect()
}

/// Decode one row into cells, in column order.
pub(crate) fn row_cells(row: &Row) -> Result<Vec<Cell>, DriverError> {
    (0..row.len()).map(|idx| cell(row, idx)).collect()
}

fn cell(row: &Row, idx: usize) -> Result<Cell, DriverError> {
    let column = row.columns()[idx].name();
    let ty = row.columns()[idx].type_();

    if *ty == Type::BOOL {
        Ok(get::<bool>(row, idx, column, ty)?.map_or(Cell::Null, Cell::Boolean))
    } else if *ty == Type::INT2 {
        Ok(get::<i16>(row, idx, column, ty)?
            .map_or(Cell::Null, |v| Cell::Integer(i64::from(v))))
    } else if *ty == Type::INT4 {
        Ok(get::<i32>(row, idx, column, ty)?
            .map_or(Cell::Null, |v| Cell::Integer(i64::from(v))))
    } else if *ty == Type::INT8 {
        Ok(get::<i64>(row, idx, column, ty)?.map_or(Cell::Null, Cell::Integer))
    } else if *ty == Type::FLOAT4 {
        match get::<f32>(row, idx, column, ty)? {
            None => Ok(Cell::Null),
            Some(v) => Decimal::from_f32_retain(v)
                .map(Cell::Decimal)
                .ok_or_else(|| decode_error(column, "float4 (non-finite)")),
        }
    } else if *ty == Type::FLOAT8 {
        match get::<f64>(row, idx, column, ty)? {
            None => Ok(Cell::Null),
            Some(v) => Decimal::from_f64_retain(v)
                .map(Cell::Decimal)
                .ok_or_else(|| decode_error(column, "float8 (non-finite)")),
        }
    } else if *ty == Type::NUMERIC {
        Ok(get::<Decimal>(row, idx, column, ty)?.map_or(Cell::Null, Cell::Decimal))
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME
    {
        Ok(get::<String>(row, idx, column, ty)?.map_or(Cell::Null, Cell::Text))
    } else if *ty == Type::TIME {
        Ok(get::<NaiveTime>(row, idx, column, ty)?
            .map_or(Cell::Null, |v| Cell::Text(v.to_string())))
    } else if *ty == Type::DATE {
        Ok(get::<NaiveDate>(row, idx, column, ty)?.map_or(Cell::Null, |v| {
            Cell::Timestamp(v.and_time(NaiveTime::MIN).and_utc())
        }))
    } else if *ty == Type::TIMESTAMP {
        Ok(get::<NaiveDateTime>(row, idx, column, ty)?
            .map_or(Cell::Null, |v| Cell::Timestamp(v.and_utc())))
    } else if *ty == Type::TIMESTAMPTZ {
        Ok(get::<DateTime<Utc>>(row, idx, column, ty)?.map_or(Cell::Null, Cell::Timestamp))
    } else {
        Err(decode_error(column, ty.name()))
    }
}

fn get<'a, T>(row: &'a Row, idx: usize, column: &str, ty: &Type) -> Result<Option<T>, DriverError>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx)
        .map_err(|_| decode_error(column, ty.name()))
}

fn decode_error(column: &str, ty: &str) -> DriverError {
    DriverError::Decode {
        column: column.to_string(),
        ty: ty.to_string(),
    }
}
