use std::collections::HashMap;
use std::ops::Index;
use std::sync::Arc;

use serde::Serialize;

use super::row::{Row, check_width, index_labels};
use crate::error::DriverError;
use crate::types::SqlValue;

/// Rows returned by a query, in the order the driver produced them.
///
/// A query that matches nothing yields an empty table, never an absent one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultTable {
    rows: Vec<Row>,
    #[serde(skip)]
    column_labels: Arc<Vec<String>>,
    #[serde(skip)]
    label_index: Arc<HashMap<String, usize>>,
}

impl ResultTable {
    /// Start an empty table for the given column labels.
    #[must_use]
    pub fn with_columns(column_labels: Vec<String>) -> Self {
        let label_index = Arc::new(index_labels(&column_labels));
        Self {
            rows: Vec::new(),
            column_labels: Arc::new(column_labels),
            label_index,
        }
    }

    /// Append one record; values are positional, matching the column labels.
    ///
    /// # Errors
    /// Returns `DriverError::ColumnCount` if the value count differs from the
    /// label count; the table is left unchanged.
    pub fn push_values(&mut self, values: Vec<SqlValue>) -> Result<(), DriverError> {
        check_width(self.column_labels.len(), values.len())?;
        self.rows.push(Row::from_parts(
            Arc::clone(&self.column_labels),
            Arc::clone(&self.label_index),
            values,
        ));
        Ok(())
    }

    #[must_use]
    pub fn column_labels(&self) -> &[String] {
        &self.column_labels
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl Index<usize> for ResultTable {
    type Output = Row;

    fn index(&self, index: usize) -> &Row {
        &self.rows[index]
    }
}

impl IntoIterator for ResultTable {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_row_leaves_table_unchanged() {
        let mut table = ResultTable::with_columns(vec!["id".into(), "name".into()]);
        table
            .push_values(vec![SqlValue::Int(1), SqlValue::Text("Ann".into())])
            .unwrap();

        let err = table.push_values(vec![SqlValue::Int(2)]).unwrap_err();
        assert!(matches!(
            err,
            DriverError::ColumnCount {
                labels: 2,
                values: 1
            }
        ));
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].get("name").and_then(SqlValue::as_text), Some("Ann"));
    }
}
