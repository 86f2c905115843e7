//! Column resolution, schema validation and row materialization.
//!
//! One query runs these steps in order:
//!
//! 1. Build an [`ObjectMap`] per target type.
//! 2. [`resolve_and_validate`] the result schema against the maps once.
//! 3. [`materialize_row`] once per row per map.

mod descriptor;
mod materialize;
mod object_map;
mod partition;
mod resolver;
mod validator;

pub use descriptor::{
    descriptor_of, is_cached, ColumnValue, Entity, EntityBuilder, MemberDescriptor, MemberType,
    TypeDescriptor,
};
pub use materialize::materialize_row;
pub use object_map::{ColumnBinding, ObjectMap};
pub use partition::{partition, PartitionSpec};
pub use resolver::{resolve, resolve_and_validate, validate_custom_mappings};
pub use validator::{is_compatible, validate_completeness, validate_types};
