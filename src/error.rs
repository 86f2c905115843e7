//! Error types for result-set mapping and caching.
//!
//! Every variant is a configuration or contract violation. None of them is
//! transient and none should be retried.

use std::fmt;
use thiserror::Error;

/// Result type alias for mapping operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A schema column that no member of its target type claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnclaimedColumn {
    /// Column name as reported by the schema.
    pub column: String,
    /// Ordinal of the column.
    pub ordinal: usize,
    /// Target type whose partition contains the column.
    pub target_type: &'static str,
}

impl fmt::Display for UnclaimedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "column '{}' (ordinal {}) is not mapped to any member of {}",
            self.column, self.ordinal, self.target_type
        )
    }
}

fn join_unclaimed(columns: &[UnclaimedColumn]) -> String {
    columns
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error type for mapping and cache operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Partition count differs from the number of object maps.
    #[error("Partition arity mismatch: expected {expected} partitions but saw {actual}")]
    PartitionArityMismatch { expected: usize, actual: usize },

    /// The first schema column is not the first partition column.
    #[error("Partition mismatch: expected {expected} but instead saw {actual}")]
    PartitionMismatch { expected: String, actual: String },

    /// Fewer partition boundaries were found than requested.
    #[error(
        "Partition unresolved: matched [{}] but expected {expected} partitions",
        .matched.join(", ")
    )]
    PartitionUnresolved { matched: Vec<String>, expected: usize },

    /// Partition string does not follow `Name|Name|...`.
    #[error("Invalid partition specification: '{spec}'")]
    InvalidPartitionSpec { spec: String },

    /// Two members of one map resolve to the same schema column.
    #[error("Column '{column}' is already assigned to ordinal {ordinal} for {target_type}")]
    DuplicateOrdinalAssignment {
        column: String,
        ordinal: usize,
        target_type: &'static str,
    },

    /// A custom alias collides with a column of another map.
    #[error(
        "Custom mapping {target_type}.{member} -> '{column}' collides with a column of {other_type}"
    )]
    AmbiguousCustomMapping {
        target_type: &'static str,
        member: String,
        column: String,
        other_type: &'static str,
    },

    /// Result set columns not claimed by any member.
    #[error("Schema validation failed: {}", join_unclaimed(.columns))]
    SchemaCompletenessFailure { columns: Vec<UnclaimedColumn> },

    /// Member type is incompatible with the schema's column type.
    #[error("Type mismatch for member '{member}': expected {expected} but member is {actual}")]
    SchemaTypeMismatch {
        member: String,
        expected: String,
        actual: String,
    },

    /// Cache policy sets mutually exclusive expirations.
    #[error("Invalid cache policy: {message}")]
    InvalidCachePolicy { message: String },

    /// Cache rule pattern failed to compile.
    #[error("Invalid cache key pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A declared column has no member descriptor.
    #[error("No member metadata for '{member}' on {target_type}")]
    MissingMemberMetadata {
        member: String,
        target_type: &'static str,
    },

    /// Value conversion error.
    #[error("Type conversion error: {message}")]
    TypeConversion { message: String },

    /// Column index out of bounds.
    #[error("Column index {index} out of bounds (columns: {count})")]
    ColumnIndexOutOfBounds { index: usize, count: usize },
}

impl Error {
    /// Create a type conversion error.
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion {
            message: message.into(),
        }
    }

    /// Create an invalid cache policy error.
    pub fn invalid_policy(message: impl Into<String>) -> Self {
        Self::InvalidCachePolicy {
            message: message.into(),
        }
    }
}
