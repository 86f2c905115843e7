//! Post-resolution schema checks.

use crate::error::{Error, Result, UnclaimedColumn};
use crate::types::{DataType, ResultSchema};

use super::descriptor::MemberType;
use super::object_map::ColumnBinding;
use super::resolver::partition_range;

/// Whether a member declared as `member` can hold values of a `column` column.
///
/// Enum members accept any integer column. Otherwise the column type must
/// equal the member's underlying type or widen to it losslessly
/// (see [`DataType::widens_to`]).
pub fn is_compatible(member: MemberType, column: DataType) -> bool {
    if member.is_enum {
        return column.is_integer();
    }
    column.widens_to(member.data_type)
}

/// Every schema column in a map's partition must be claimed by that map.
///
/// All unclaimed columns across all maps are reported in one error.
pub fn validate_completeness(
    schema: &ResultSchema,
    maps: &[&mut dyn ColumnBinding],
    boundaries: &[usize],
) -> Result<()> {
    let mut unclaimed = Vec::new();
    for (index, map) in maps.iter().enumerate() {
        let (start, end) = partition_range(schema, boundaries, index);
        let claimed = map.column_ordinals();
        for column in schema.columns.get(start..end).unwrap_or(&[]) {
            if !claimed.values().any(|&o| o == column.ordinal) {
                unclaimed.push(UnclaimedColumn {
                    column: column.name.clone(),
                    ordinal: column.ordinal,
                    target_type: map.type_name(),
                });
            }
        }
    }

    if unclaimed.is_empty() {
        Ok(())
    } else {
        Err(Error::SchemaCompletenessFailure { columns: unclaimed })
    }
}

/// Every resolved member must be type-compatible with its column.
pub fn validate_types(schema: &ResultSchema, maps: &[&mut dyn ColumnBinding]) -> Result<()> {
    for map in maps {
        for member in map.columns() {
            let Some(&ordinal) = map.column_ordinals().get(map.actual_column(member)) else {
                continue;
            };
            let member_type =
                map.member_type(member)
                    .ok_or_else(|| Error::MissingMemberMetadata {
                        member: member.clone(),
                        target_type: map.type_name(),
                    })?;
            let column = schema
                .get(ordinal)
                .ok_or(Error::ColumnIndexOutOfBounds {
                    index: ordinal,
                    count: schema.len(),
                })?;
            if !is_compatible(member_type, column.data_type) {
                return Err(Error::SchemaTypeMismatch {
                    member: format!("{}.{}", map.type_name(), member),
                    expected: column.data_type.to_string(),
                    actual: member_type.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{resolve_and_validate, Entity, EntityBuilder, ObjectMap, PartitionSpec};

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    enum Party {
        #[default]
        None,
        Blue,
    }

    crate::column_enum!(Party: i16 { Party::None = 0, Party::Blue = 1 });

    #[derive(Default)]
    struct Voter {
        id: i64,
        name: Option<String>,
        party: Party,
    }

    impl Entity for Voter {
        fn describe(b: &mut EntityBuilder<Self>) {
            b.column("Id", |v: &mut Voter, x| v.id = x)
                .column("Name", |v: &mut Voter, x| v.name = x)
                .column("Party", |v: &mut Voter, x| v.party = x);
        }
    }

    #[derive(Default)]
    struct Ballot {
        id: i32,
    }

    impl Entity for Ballot {
        fn describe(b: &mut EntityBuilder<Self>) {
            b.column("Id", |x: &mut Ballot, v| x.id = v);
        }
    }

    #[test]
    fn test_compatibility_rules() {
        assert!(is_compatible(MemberType::scalar(DataType::BigInt), DataType::BigInt));
        assert!(is_compatible(MemberType::scalar(DataType::BigInt), DataType::Int));
        assert!(!is_compatible(MemberType::scalar(DataType::Int), DataType::BigInt));
        assert!(is_compatible(
            MemberType::scalar(DataType::Text).into_nullable(),
            DataType::Text
        ));
        assert!(is_compatible(MemberType::enumeration(DataType::SmallInt), DataType::BigInt));
        assert!(!is_compatible(MemberType::enumeration(DataType::Int), DataType::Text));
        assert!(!is_compatible(MemberType::scalar(DataType::Double), DataType::Int));
    }

    #[test]
    fn test_complete_and_compatible_schema_passes() {
        let schema = ResultSchema::from_pairs([
            ("Id", DataType::BigInt),
            ("Name", DataType::Text),
            ("Party", DataType::Int),
        ]);
        let mut map = ObjectMap::<Voter>::new();
        assert!(resolve_and_validate(&schema, &mut [&mut map], None, true).is_ok());
    }

    #[test]
    fn test_unclaimed_columns_are_aggregated() {
        let schema = ResultSchema::from_pairs([
            ("Id", DataType::BigInt),
            ("Name", DataType::Text),
            ("Age", DataType::Int),
            ("Id", DataType::Int),
            ("Stamp", DataType::DateTime),
        ]);
        let spec = PartitionSpec::parse("Id|Id").unwrap();
        let mut voter = ObjectMap::<Voter>::new();
        let mut ballot = ObjectMap::<Ballot>::new();
        let err = resolve_and_validate(&schema, &mut [&mut voter, &mut ballot], Some(&spec), true)
            .unwrap_err();

        match err {
            Error::SchemaCompletenessFailure { columns } => {
                assert_eq!(
                    columns,
                    vec![
                        UnclaimedColumn {
                            column: "Age".to_string(),
                            ordinal: 2,
                            target_type: "Voter",
                        },
                        UnclaimedColumn {
                            column: "Stamp".to_string(),
                            ordinal: 4,
                            target_type: "Ballot",
                        },
                    ]
                );
            }
            other => panic!("Expected SchemaCompletenessFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_unclaimed_columns_ignored_without_validation() {
        let schema = ResultSchema::from_pairs([("Id", DataType::BigInt), ("Age", DataType::Int)]);
        let mut map = ObjectMap::<Voter>::new();
        assert!(resolve_and_validate(&schema, &mut [&mut map], None, false).is_ok());
    }

    #[test]
    fn test_type_mismatch_names_member_and_types() {
        let schema = ResultSchema::from_pairs([("Id", DataType::Text)]);
        let mut map = ObjectMap::<Voter>::new();
        let err = resolve_and_validate(&schema, &mut [&mut map], None, true).unwrap_err();
        match err {
            Error::SchemaTypeMismatch {
                member,
                expected,
                actual,
            } => {
                assert_eq!(member, "Voter.Id");
                assert_eq!(expected, "TEXT");
                assert_eq!(actual, "BIGINT");
            }
            other => panic!("Expected SchemaTypeMismatch, got {other:?}"),
        }
    }
}
