use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::DriverError;
use crate::types::SqlValue;

/// One materialized record: column labels mapped to dynamically typed values.
///
/// Labels are shared by every row of a [`ResultTable`](crate::ResultTable),
/// so each row only owns its values.
#[derive(Debug, Clone)]
pub struct Row {
    column_labels: Arc<Vec<String>>,
    values: Vec<SqlValue>,
    // Label lookup shared across the table; on duplicate labels the last column wins.
    label_index: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Build a standalone row.
    ///
    /// # Errors
    /// Returns `DriverError::ColumnCount` if `values` and `column_labels`
    /// differ in length.
    pub fn new(column_labels: Vec<String>, values: Vec<SqlValue>) -> Result<Self, DriverError> {
        check_width(column_labels.len(), values.len())?;
        let column_labels = Arc::new(column_labels);
        let label_index = Arc::new(index_labels(&column_labels));
        Ok(Self::from_parts(column_labels, label_index, values))
    }

    pub(crate) fn from_parts(
        column_labels: Arc<Vec<String>>,
        label_index: Arc<HashMap<String, usize>>,
        values: Vec<SqlValue>,
    ) -> Self {
        Self {
            column_labels,
            values,
            label_index,
        }
    }

    /// Value for a column label, or `None` if the row has no such column.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&SqlValue> {
        self.label_index
            .get(label)
            .and_then(|&idx| self.values.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.label_index.contains_key(label)
    }

    /// Column labels in select-list order.
    #[must_use]
    pub fn column_labels(&self) -> &[String] {
        &self.column_labels
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.label_index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label_index.is_empty()
    }

    /// Iterate `(label, value)` pairs in column order, duplicates included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.column_labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Copy the row into an owned label → value map.
    #[must_use]
    pub fn to_map(&self) -> IndexMap<String, SqlValue> {
        self.iter()
            .map(|(label, value)| (label.to_owned(), value.clone()))
            .collect()
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.column_labels == other.column_labels && self.values == other.values
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map = self.to_map();
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (label, value) in &map {
            out.serialize_entry(label, value)?;
        }
        out.end()
    }
}

pub(crate) fn check_width(labels: usize, values: usize) -> Result<(), DriverError> {
    if labels == values {
        Ok(())
    } else {
        Err(DriverError::ColumnCount { labels, values })
    }
}

pub(crate) fn index_labels(labels: &[String]) -> HashMap<String, usize> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.clone(), i))
        .collect()
}
