//! Column-to-ordinal resolution across one or more object maps.

use log::debug;

use crate::error::{Error, Result};
use crate::types::ResultSchema;

use super::object_map::ColumnBinding;
use super::partition::{partition, PartitionSpec};
use super::validator::{validate_completeness, validate_types};

/// Ordinal range `[start, end)` owned by map `index`.
pub(crate) fn partition_range(schema: &ResultSchema, boundaries: &[usize], index: usize) -> (usize, usize) {
    let start = boundaries[index];
    let end = boundaries
        .get(index + 1)
        .copied()
        .unwrap_or_else(|| schema.len());
    (start, end)
}

/// Reject aliases that collide with a column of another map.
///
/// Comparison is exact-case: an alias equal to another map's real or aliased
/// column name fails with `AmbiguousCustomMapping`.
pub fn validate_custom_mappings(maps: &[&mut dyn ColumnBinding]) -> Result<()> {
    for (i, map) in maps.iter().enumerate() {
        for (member, alias) in map.custom_mappings() {
            for (j, other) in maps.iter().enumerate() {
                if i == j {
                    continue;
                }
                let collides = other
                    .columns()
                    .iter()
                    .any(|m| other.actual_column(m) == alias.as_str());
                if collides {
                    return Err(Error::AmbiguousCustomMapping {
                        target_type: map.type_name(),
                        member: member.clone(),
                        column: alias.clone(),
                        other_type: other.type_name(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Assign each map's columns their ordinal within the map's partition.
///
/// The first case-insensitive match inside `[boundary[i], boundary[i+1])`
/// wins. Columns with no match stay unresolved.
pub fn resolve(
    schema: &ResultSchema,
    maps: &mut [&mut dyn ColumnBinding],
    boundaries: &[usize],
) -> Result<()> {
    if boundaries.len() != maps.len() {
        return Err(Error::PartitionArityMismatch {
            expected: maps.len(),
            actual: boundaries.len(),
        });
    }

    for (index, map) in maps.iter_mut().enumerate() {
        let (start, end) = partition_range(schema, boundaries, index);
        let range = schema.columns.get(start..end).unwrap_or(&[]);

        let members = map.columns().to_vec();
        for member in &members {
            let actual = map.actual_column(member).to_string();
            if let Some(column) = range.iter().find(|c| c.is_named(&actual)) {
                map.assign_ordinal(&actual, column.ordinal)?;
            }
        }

        debug!(
            "resolved {} of {} columns for {} in [{}, {})",
            map.column_ordinals().len(),
            members.len(),
            map.type_name(),
            start,
            end
        );
    }
    Ok(())
}

/// Partition, resolve and optionally validate a result schema.
///
/// Returns the partition boundaries. Every failure is raised here, before any
/// row is materialized.
pub fn resolve_and_validate(
    schema: &ResultSchema,
    maps: &mut [&mut dyn ColumnBinding],
    spec: Option<&PartitionSpec>,
    validate: bool,
) -> Result<Vec<usize>> {
    if maps.len() > 1 {
        validate_custom_mappings(maps)?;
    }

    let boundaries = partition(schema, maps.len(), spec)?;
    resolve(schema, maps, &boundaries)?;

    if validate {
        validate_completeness(schema, maps, &boundaries)?;
        validate_types(schema, maps)?;
    }
    Ok(boundaries)
}
