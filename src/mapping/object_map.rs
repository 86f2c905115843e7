//! Per-query mapping state for one target type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::Value;

use super::descriptor::{descriptor_of, Entity, MemberType, TypeDescriptor};

/// Type-erased view of an [`ObjectMap`] used by column resolution and schema
/// validation, which run over maps of different target types at once.
pub trait ColumnBinding {
    /// Short name of the target type.
    fn type_name(&self) -> &'static str;

    /// Mappable member names, in registration order.
    fn columns(&self) -> &[String];

    /// Schema column name a member reads from (its alias, or its own name).
    fn actual_column<'a>(&'a self, member: &'a str) -> &'a str;

    /// Member → schema column overrides.
    fn custom_mappings(&self) -> &HashMap<String, String>;

    /// Declared type of a member.
    fn member_type(&self, member: &str) -> Option<MemberType>;

    /// Resolved ordinals, keyed by actual column name.
    fn column_ordinals(&self) -> &HashMap<String, usize>;

    /// Record the ordinal of an actual column name.
    ///
    /// Fails with `DuplicateOrdinalAssignment` when the name (compared
    /// case-insensitively) is already assigned.
    fn assign_ordinal(&mut self, column: &str, ordinal: usize) -> Result<()>;
}

/// Mapping state for one target type within one query execution.
pub struct ObjectMap<T: Entity> {
    pub(crate) descriptor: Arc<TypeDescriptor<T>>,
    pub(crate) columns: Vec<String>,
    pub(crate) custom_mappings: HashMap<String, String>,
    pub(crate) column_ordinals: HashMap<String, usize>,
    pub(crate) default_values: HashMap<String, Value>,
}

impl<T: Entity> ObjectMap<T> {
    /// Map every member of `T` under its own name.
    pub fn new() -> Self {
        let descriptor = descriptor_of::<T>();
        let columns = descriptor.member_names().map(str::to_string).collect();
        Self {
            descriptor,
            columns,
            custom_mappings: HashMap::new(),
            column_ordinals: HashMap::new(),
            default_values: HashMap::new(),
        }
    }

    /// Map `T` with member → column aliases.
    ///
    /// Fails with `MissingMemberMetadata` when an alias names a member `T`
    /// does not register.
    pub fn build<K, V>(custom_mappings: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (member, column) in custom_mappings {
            let member = member.into();
            if map.descriptor.member(&member).is_none() {
                return Err(Error::MissingMemberMetadata {
                    member,
                    target_type: map.descriptor.type_name(),
                });
            }
            map.custom_mappings.insert(member, column.into());
        }
        Ok(map)
    }

    /// Type descriptor of `T`.
    pub fn descriptor(&self) -> &Arc<TypeDescriptor<T>> {
        &self.descriptor
    }

    /// Resolved ordinal of a member, if its column was found.
    pub fn ordinal_of(&self, member: &str) -> Option<usize> {
        self.column_ordinals
            .get(self.actual_column(member))
            .copied()
    }

    /// Zero values cached so far, keyed by member name.
    pub fn default_values(&self) -> &HashMap<String, Value> {
        &self.default_values
    }

    /// Whether resolution assigned at least one column.
    pub fn is_resolved(&self) -> bool {
        !self.column_ordinals.is_empty()
    }
}

impl<T: Entity> Default for ObjectMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> ColumnBinding for ObjectMap<T> {
    fn type_name(&self) -> &'static str {
        self.descriptor.type_name()
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn actual_column<'a>(&'a self, member: &'a str) -> &'a str {
        self.custom_mappings
            .get(member)
            .map(String::as_str)
            .unwrap_or(member)
    }

    fn custom_mappings(&self) -> &HashMap<String, String> {
        &self.custom_mappings
    }

    fn member_type(&self, member: &str) -> Option<MemberType> {
        self.descriptor.member(member).map(|m| m.member_type())
    }

    fn column_ordinals(&self) -> &HashMap<String, usize> {
        &self.column_ordinals
    }

    fn assign_ordinal(&mut self, column: &str, ordinal: usize) -> Result<()> {
        if let Some((_, existing)) = self
            .column_ordinals
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
        {
            return Err(Error::DuplicateOrdinalAssignment {
                column: column.to_string(),
                ordinal: *existing,
                target_type: self.descriptor.type_name(),
            });
        }
        self.column_ordinals.insert(column.to_string(), ordinal);
        Ok(())
    }
}

impl<T: Entity> fmt::Debug for ObjectMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectMap")
            .field("type", &self.descriptor.type_name())
            .field("columns", &self.columns)
            .field("custom_mappings", &self.custom_mappings)
            .field("column_ordinals", &self.column_ordinals)
            .finish()
    }
}
