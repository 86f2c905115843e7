//! Column and ResultSchema types.
//!
//! A `ResultSchema` is fetched once per result set, before the first row, and
//! is shared by every row of that result set.

use super::data_type::DataType;

/// A column in a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name (compared case-insensitively).
    pub name: String,
    /// Zero-based position in select order.
    pub ordinal: usize,
    /// Declared data type.
    pub data_type: DataType,
    /// Whether NULL values are allowed.
    pub nullable: bool,
}

impl Column {
    /// Create a nullable column.
    pub fn new(name: impl Into<String>, ordinal: usize, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            ordinal,
            data_type,
            nullable: true,
        }
    }

    /// Mark the column as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Ordered column list for a result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSchema {
    /// Column definitions, in ordinal order.
    pub columns: Vec<Column>,
}

impl ResultSchema {
    /// Create a schema from columns. Ordinals are expected to match positions.
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Build a schema from `(name, type)` pairs, assigning ordinals left to right.
    pub fn from_pairs<N: Into<String>>(pairs: impl IntoIterator<Item = (N, DataType)>) -> Self {
        let columns = pairs
            .into_iter()
            .enumerate()
            .map(|(ordinal, (name, data_type))| Column::new(name, ordinal, data_type))
            .collect();
        Self { columns }
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get column by ordinal.
    pub fn get(&self, ordinal: usize) -> Option<&Column> {
        self.columns.get(ordinal)
    }

    /// Iterate over columns.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Find column ordinal by name (case-insensitive, first match).
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|c| c.is_named(name))
            .map(|c| c.ordinal)
    }
}

impl From<Vec<Column>> for ResultSchema {
    fn from(columns: Vec<Column>) -> Self {
        Self::new(columns)
    }
}
