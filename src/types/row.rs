//! Row type and the row accessor used by the materializer.

use std::sync::Arc;

use super::column::{Column, ResultSchema};
use super::value::Value;

/// Read access to the raw values of one row, by ordinal.
///
/// `None` means the ordinal is outside the row; `Some(Value::Null)` is NULL.
pub trait RowAccess {
    /// Value at the given ordinal.
    fn value(&self, ordinal: usize) -> Option<&Value>;

    /// Number of values in the row.
    fn width(&self) -> usize;
}

impl RowAccess for [Value] {
    fn value(&self, ordinal: usize) -> Option<&Value> {
        self.get(ordinal)
    }

    fn width(&self) -> usize {
        self.len()
    }
}

impl RowAccess for Vec<Value> {
    fn value(&self, ordinal: usize) -> Option<&Value> {
        self.get(ordinal)
    }

    fn width(&self) -> usize {
        self.len()
    }
}

/// A row of query results.
#[derive(Debug, Clone)]
pub struct Row {
    /// Column values.
    values: Vec<Value>,
    /// Shared schema (reference counted).
    schema: Arc<ResultSchema>,
}

impl Row {
    /// Create a new row with values and shared schema.
    pub fn new(values: Vec<Value>, schema: Arc<ResultSchema>) -> Self {
        Self { values, schema }
    }

    /// Get value by ordinal (0-based).
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get value by column name (case-insensitive).
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.schema
            .find_by_name(name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get all values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Get column information.
    pub fn columns(&self) -> &[Column] {
        &self.schema.columns
    }

    /// Get the shared schema.
    pub fn schema(&self) -> &Arc<ResultSchema> {
        &self.schema
    }

    /// Iterate over values.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
}

impl RowAccess for Row {
    fn value(&self, ordinal: usize) -> Option<&Value> {
        self.values.get(ordinal)
    }

    fn width(&self) -> usize {
        self.values.len()
    }
}

impl IntoIterator for Row {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
