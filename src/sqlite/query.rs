use rusqlite::types::Value;
use rusqlite::{Statement, params_from_iter};

use crate::error::DriverError;
use crate::results::ResultTable;
use crate::types::SqlValue;

/// Extract a `SqlValue` from a `SQLite` row, keeping the storage class the
/// database reported.
///
/// # Errors
/// Returns `rusqlite::Error` if the column cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<SqlValue> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Int(i),
        Value::Real(f) => SqlValue::Float(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Blob(b),
    })
}

/// Run a prepared statement and collect every row, keyed by column label.
///
/// # Errors
/// Returns `DriverError` if binding, stepping, or reading a column fails.
pub fn build_result_table(
    stmt: &mut Statement<'_>,
    params: &[Value],
) -> Result<ResultTable, DriverError> {
    let column_labels: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_labels.len();
    let mut table = ResultTable::with_columns(column_labels);

    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            values.push(sqlite_extract_value(row, i)?);
        }
        table.push_values(values)?;
    }

    Ok(table)
}
