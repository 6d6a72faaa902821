use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use tokio_postgres::types::FromSql;
use tokio_postgres::{Row, Statement};

use super::numeric::NumericText;
use crate::error::DriverError;
use crate::results::ResultTable;
use crate::types::SqlValue;

/// Extracts a `SqlValue` from a `tokio_postgres` Row at the given index.
///
/// # Errors
/// Returns `DriverError::Postgres` if the column cannot be decoded, or
/// `DriverError::UnsupportedType` for column types with no `SqlValue` form
/// (for example `uuid` or `interval`).
pub fn postgres_extract_value(row: &Row, idx: usize) -> Result<SqlValue, DriverError> {
    let column = &row.columns()[idx];
    let ty = column.type_();

    let value = match ty.name() {
        "int2" => row.try_get::<_, Option<i16>>(idx)?.map(|v| SqlValue::Int(i64::from(v))),
        "int4" => row.try_get::<_, Option<i32>>(idx)?.map(|v| SqlValue::Int(i64::from(v))),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(SqlValue::Int),
        "oid" => row.try_get::<_, Option<u32>>(idx)?.map(|v| SqlValue::Int(i64::from(v))),
        "float4" => row.try_get::<_, Option<f32>>(idx)?.map(|v| SqlValue::Float(f64::from(v))),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.map(SqlValue::Float),
        "numeric" => row
            .try_get::<_, Option<NumericText>>(idx)?
            .map(|v| SqlValue::Decimal(v.0)),
        "bool" => row.try_get::<_, Option<bool>>(idx)?.map(SqlValue::Bool),
        "date" => row.try_get::<_, Option<NaiveDate>>(idx)?.map(SqlValue::Date),
        "time" => row
            .try_get::<_, Option<NaiveTime>>(idx)?
            .map(|v| SqlValue::Text(v.to_string())),
        "timestamp" => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(SqlValue::Timestamp),
        "timestamptz" => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
            .map(|v| SqlValue::Timestamp(v.naive_utc())),
        "json" | "jsonb" => row.try_get::<_, Option<Value>>(idx)?.map(SqlValue::Json),
        "bytea" => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(SqlValue::Blob),
        // text, varchar, bpchar, name, citext
        _ if <String as FromSql>::accepts(ty) => {
            row.try_get::<_, Option<String>>(idx)?.map(SqlValue::Text)
        }
        other => {
            return Err(DriverError::UnsupportedType {
                column: column.name().to_owned(),
                type_name: other.to_owned(),
            });
        }
    };

    Ok(value.unwrap_or(SqlValue::Null))
}

/// Build a result table using statement metadata for column labels, so an
/// empty result still knows its columns.
///
/// # Errors
/// Returns `DriverError` from row value extraction.
pub fn build_result_table(stmt: &Statement, rows: &[Row]) -> Result<ResultTable, DriverError> {
    let column_labels: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let column_count = column_labels.len();

    let mut table = ResultTable::with_columns(column_labels);
    for row in rows {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(postgres_extract_value(row, idx)?);
        }
        table.push_values(values)?;
    }

    Ok(table)
}
