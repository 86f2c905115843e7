//! Row materialization.

use crate::error::{Error, Result};
use crate::types::RowAccess;

use super::descriptor::Entity;
use super::object_map::ObjectMap;

/// Build a `T` from one row using a resolved map.
///
/// Unresolved members keep `T::default()`. NULL columns receive the member's
/// zero value, cached in the map on first use. Returns `Ok(None)` when every
/// member was unresolved or NULL, which marks a joined entity that does not
/// exist for this row.
pub fn materialize_row<T, R>(map: &mut ObjectMap<T>, row: &R) -> Result<Option<T>>
where
    T: Entity,
    R: RowAccess + ?Sized,
{
    let ObjectMap {
        descriptor,
        columns,
        custom_mappings,
        column_ordinals,
        default_values,
    } = map;

    let mut target = T::default();
    let mut empty = 0usize;

    for member in columns.iter() {
        let descriptor_member =
            descriptor
                .member(member)
                .ok_or_else(|| Error::MissingMemberMetadata {
                    member: member.clone(),
                    target_type: descriptor.type_name(),
                })?;

        let actual = custom_mappings.get(member).unwrap_or(member);
        let Some(&ordinal) = column_ordinals.get(actual) else {
            empty += 1;
            continue;
        };

        let value = row.value(ordinal).ok_or(Error::ColumnIndexOutOfBounds {
            index: ordinal,
            count: row.width(),
        })?;

        if value.is_null() {
            let zero = default_values
                .entry(member.clone())
                .or_insert_with(|| descriptor_member.zero_value());
            descriptor_member.assign(&mut target, zero)?;
            empty += 1;
        } else {
            descriptor_member.assign(&mut target, value)?;
        }
    }

    if empty == columns.len() {
        Ok(None)
    } else {
        Ok(Some(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{resolve_and_validate, EntityBuilder, PartitionSpec};
    use crate::types::{DataType, ResultSchema, Value};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Person {
        id: i64,
        first_name: String,
        nickname: Option<String>,
        fans: i32,
    }

    impl Entity for Person {
        fn describe(b: &mut EntityBuilder<Self>) {
            b.column("Id", |p: &mut Person, v| p.id = v)
                .column("FirstName", |p: &mut Person, v| p.first_name = v)
                .column("Nickname", |p: &mut Person, v| p.nickname = v)
                .column("Fans", |p: &mut Person, v| p.fans = v);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Pet {
        id: i64,
        name: String,
    }

    impl Entity for Pet {
        fn describe(b: &mut EntityBuilder<Self>) {
            b.column("Id", |p: &mut Pet, v| p.id = v)
                .column("Name", |p: &mut Pet, v| p.name = v);
        }
    }

    fn resolved_person(schema: &ResultSchema) -> ObjectMap<Person> {
        let mut map = ObjectMap::<Person>::new();
        resolve_and_validate(schema, &mut [&mut map], None, false).unwrap();
        map
    }

    #[test]
    fn test_materialize_full_row() {
        let schema = ResultSchema::from_pairs([
            ("Id", DataType::BigInt),
            ("FirstName", DataType::Text),
            ("Nickname", DataType::Text),
            ("Fans", DataType::Int),
        ]);
        let mut map = resolved_person(&schema);
        let row = vec![Value::Int(1), Value::from("Abe"), Value::from("Honest"), Value::Int(10)];

        let person = materialize_row(&mut map, &row).unwrap().unwrap();
        assert_eq!(
            person,
            Person {
                id: 1,
                first_name: "Abe".to_string(),
                nickname: Some("Honest".to_string()),
                fans: 10,
            }
        );
    }

    #[test]
    fn test_null_columns_get_cached_zero_values() {
        let schema = ResultSchema::from_pairs([
            ("Id", DataType::BigInt),
            ("FirstName", DataType::Text),
            ("Nickname", DataType::Text),
        ]);
        let mut map = resolved_person(&schema);
        let row = vec![Value::Int(2), Value::Null, Value::Null];

        let person = materialize_row(&mut map, &row).unwrap().unwrap();
        assert_eq!(person.id, 2);
        assert_eq!(person.first_name, "");
        assert_eq!(person.nickname, None);
        assert_eq!(person.fans, 0);
        assert_eq!(map.default_values().get("FirstName"), Some(&Value::String(String::new())));
        assert_eq!(map.default_values().get("Nickname"), Some(&Value::Null));
        assert!(!map.default_values().contains_key("Id"));
    }

    #[test]
    fn test_all_null_row_is_absent() {
        let schema = ResultSchema::from_pairs([("Id", DataType::BigInt), ("FirstName", DataType::Text)]);
        let mut map = resolved_person(&schema);
        let row = vec![Value::Null, Value::Null];
        assert_eq!(materialize_row(&mut map, &row).unwrap(), None);
    }

    #[test]
    fn test_zero_valued_row_is_present() {
        let schema = ResultSchema::from_pairs([("Id", DataType::BigInt)]);
        let mut map = resolved_person(&schema);
        let row = vec![Value::Int(0)];
        assert_eq!(materialize_row(&mut map, &row).unwrap().map(|p| p.id), Some(0));
    }

    #[test]
    fn test_outer_join_missing_side_is_absent() {
        let schema = ResultSchema::from_pairs([
            ("Id", DataType::BigInt),
            ("FirstName", DataType::Text),
            ("Id", DataType::BigInt),
            ("Name", DataType::Text),
        ]);
        let spec = PartitionSpec::parse("Id|Id").unwrap();
        let mut person = ObjectMap::<Person>::new();
        let mut pet = ObjectMap::<Pet>::new();
        resolve_and_validate(&schema, &mut [&mut person, &mut pet], Some(&spec), false).unwrap();

        let with_pet = vec![Value::Int(1), Value::from("Ann"), Value::Int(9), Value::from("Rex")];
        let without_pet = vec![Value::Int(2), Value::from("Bob"), Value::Null, Value::Null];

        assert_eq!(
            materialize_row(&mut pet, &with_pet).unwrap(),
            Some(Pet {
                id: 9,
                name: "Rex".to_string()
            })
        );
        assert_eq!(materialize_row(&mut pet, &without_pet).unwrap(), None);
        assert_eq!(
            materialize_row(&mut person, &without_pet).unwrap().map(|p| p.first_name),
            Some("Bob".to_string())
        );
    }

    #[test]
    fn test_widening_and_narrowing() {
        let schema = ResultSchema::from_pairs([("Id", DataType::Int), ("Fans", DataType::BigInt)]);
        let mut map = resolved_person(&schema);

        let row = vec![Value::Int(5), Value::Int(1_000)];
        let person = materialize_row(&mut map, &row).unwrap().unwrap();
        assert_eq!((person.id, person.fans), (5, 1_000));

        let row = vec![Value::Int(5), Value::Int(i64::from(i32::MAX) + 1)];
        assert!(matches!(
            materialize_row(&mut map, &row),
            Err(Error::TypeConversion { .. })
        ));
    }

    #[test]
    fn test_short_row_is_out_of_bounds() {
        let schema = ResultSchema::from_pairs([("Id", DataType::BigInt), ("FirstName", DataType::Text)]);
        let mut map = resolved_person(&schema);
        let row = vec![Value::Int(1)];
        assert!(matches!(
            materialize_row(&mut map, &row),
            Err(Error::ColumnIndexOutOfBounds { index: 1, count: 1 })
        ));
    }

    #[test]
    fn test_missing_member_metadata() {
        let schema = ResultSchema::from_pairs([("Id", DataType::BigInt)]);
        let mut map = resolved_person(&schema);
        map.columns.push("Ghost".to_string());
        let row = vec![Value::Int(1)];
        assert!(matches!(
            materialize_row(&mut map, &row),
            Err(Error::MissingMemberMetadata { ref member, .. }) if member == "Ghost"
        ));
    }
}
