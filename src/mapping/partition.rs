//! Partition specifications and boundary detection.
//!
//! A partition specification names the column at which each target type's
//! slice of a flat result set starts, e.g. `"Id|OrderId"`.

use std::fmt;
use std::str::FromStr;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::types::ResultSchema;

static PARTITION_SPEC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_ ]*(\|[A-Za-z_][A-Za-z0-9_ ]*)*$")
        .expect("valid partition regex")
});

/// Ordered partition start columns, one per object map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSpec {
    columns: Vec<String>,
}

impl PartitionSpec {
    /// Parse a pipe-separated list of column names.
    pub fn parse(spec: &str) -> Result<Self> {
        if !PARTITION_SPEC_RE.is_match(spec) {
            return Err(Error::InvalidPartitionSpec {
                spec: spec.to_string(),
            });
        }
        Ok(Self {
            columns: spec.split('|').map(str::to_string).collect(),
        })
    }

    /// Partition start columns in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false for a parsed specification.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromStr for PartitionSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PartitionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.columns.join("|"))
    }
}

/// Find the starting ordinal of each object map's columns.
///
/// With a single map and no specification the whole schema is one partition
/// and the result is `[0]`.
pub fn partition(
    schema: &ResultSchema,
    map_count: usize,
    spec: Option<&PartitionSpec>,
) -> Result<Vec<usize>> {
    let spec = match spec {
        Some(spec) => spec,
        None if map_count <= 1 => return Ok(vec![0]),
        None => {
            return Err(Error::PartitionArityMismatch {
                expected: map_count,
                actual: 0,
            })
        }
    };

    if spec.len() != map_count {
        return Err(Error::PartitionArityMismatch {
            expected: map_count,
            actual: spec.len(),
        });
    }

    let expected = spec.columns();
    let first = schema.get(0).ok_or_else(|| Error::PartitionUnresolved {
        matched: Vec::new(),
        expected: expected.len(),
    })?;
    if !first.is_named(&expected[0]) {
        return Err(Error::PartitionMismatch {
            expected: first.name.clone(),
            actual: expected[0].clone(),
        });
    }

    let mut boundaries = Vec::with_capacity(expected.len());
    let mut matched = Vec::with_capacity(expected.len());
    for column in schema.iter() {
        let Some(next) = expected.get(boundaries.len()) else {
            break;
        };
        if column.is_named(next) {
            boundaries.push(column.ordinal);
            matched.push(column.name.clone());
        }
    }

    if boundaries.len() < expected.len() {
        return Err(Error::PartitionUnresolved {
            matched,
            expected: expected.len(),
        });
    }

    debug!("partition {} resolved to boundaries {:?}", spec, boundaries);
    Ok(boundaries)
}
