use indexmap::IndexMap;

use crate::results::Row;
use crate::types::SqlValue;

/// A named-field record whose field set is fixed when it is built.
///
/// Only values change afterwards: [`Tuple::set`] refuses fields the tuple
/// was not created with instead of adding them.
/// ```rust
/// use sql_resultset::{SqlValue, Tuple};
///
/// let mut person = Tuple::new(["name", "lastName"]);
/// assert!(person.set("name", "Henry"));
/// assert!(!person.set("age", 30));
/// assert_eq!(person.cardinality(), 2);
/// assert_eq!(person.get("lastName"), Some(&SqlValue::Null));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    fields: IndexMap<String, SqlValue>,
}

impl Tuple {
    /// Create a tuple with the given fields, all holding `Null`.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|name| (name.into(), SqlValue::Null))
                .collect(),
        }
    }

    /// Create a tuple from field/value pairs; the keys become the fixed field set.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Store `value` under `field`. Returns `false`, leaving the tuple untouched,
    /// when `field` is not one of the tuple's fields.
    pub fn set(&mut self, field: &str, value: impl Into<SqlValue>) -> bool {
        match self.fields.get_mut(field) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// `None` means the field does not exist; an unset field reads as `Null`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl From<IndexMap<String, SqlValue>> for Tuple {
    fn from(fields: IndexMap<String, SqlValue>) -> Self {
        Self { fields }
    }
}

impl From<Row> for Tuple {
    fn from(row: Row) -> Self {
        Self {
            fields: row.to_map(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_field_is_rejected() {
        let mut t = Tuple::new(["name", "lastName"]);
        assert!(!t.set("age", 30));
        assert_eq!(t.cardinality(), 2);
        assert_eq!(t.get("age"), None);

        assert!(t.set("name", "Henry"));
        assert_eq!(t.get("name"), Some(&SqlValue::Text("Henry".into())));
    }

    #[test]
    fn from_pairs_keeps_values() {
        let t = Tuple::from_pairs([("name", "Juanga"), ("lastName", "Jones")]);
        assert_eq!(t.cardinality(), 2);
        assert_eq!(t.get("lastName").and_then(SqlValue::as_text), Some("Jones"));
        assert_eq!(t.fields().collect::<Vec<_>>(), ["name", "lastName"]);
    }

    #[test]
    fn from_row_fixes_the_field_set() {
        let row = Row::new(vec!["id".into()], vec![SqlValue::Int(4)]).unwrap();
        let mut t = Tuple::from(row);
        assert!(t.set("id", 5));
        assert!(!t.set("other", 1));
        assert_eq!(t.get("id"), Some(&SqlValue::Int(5)));
    }
}
