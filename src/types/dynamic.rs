//! Untyped row projection.

use super::column::ResultSchema;
use super::row::RowAccess;
use super::value::Value;

/// A row projected without a target type: ordered `(column name, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRow {
    fields: Vec<(String, Value)>,
}

impl DynamicRow {
    /// Project every column of `row` under the names in `schema`.
    pub fn project<R: RowAccess + ?Sized>(schema: &ResultSchema, row: &R) -> Self {
        let fields = schema
            .iter()
            .map(|col| {
                let value = row.value(col.ordinal).cloned().unwrap_or(Value::Null);
                (col.name.clone(), value)
            })
            .collect();
        Self { fields }
    }

    /// Value by column name (case-insensitive, first match).
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Column names in select order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl IntoIterator for DynamicRow {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
