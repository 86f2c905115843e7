//! Result-set materialization for Rust.
//!
//! Turns the flat, ordinal-addressed rows of a query result into typed
//! entities. Column names are resolved to ordinals once per query (optionally
//! split across several target types with a partition specification), the
//! schema can be validated against the target types, and materialized results
//! can be memoized in a policy-driven cache.
//!
//! # Example
//!
//! ```
//! use rowmap::{
//!     DataType, Entity, EntityBuilder, QueryOptions, QueryResult, Reader, ResultSchema, Value,
//! };
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     id: i64,
//!     first_name: String,
//! }
//!
//! impl Entity for Person {
//!     fn describe(b: &mut EntityBuilder<Self>) {
//!         b.column("Id", |p: &mut Person, v| p.id = v)
//!             .column("FirstName", |p: &mut Person, v| p.first_name = v);
//!     }
//! }
//!
//! fn main() -> rowmap::Result<()> {
//!     let result = QueryResult::new(
//!         ResultSchema::from_pairs([("Id", DataType::BigInt), ("FirstName", DataType::Text)]),
//!         vec![vec![Value::Int(1), Value::from("Abe")]],
//!     );
//!
//!     let options = QueryOptions::new().with_schema_validation(true);
//!     let people = Reader::new().read::<Person>(&result, &options)?;
//!     assert_eq!(people[0].first_name, "Abe");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod mapping;
pub mod reader;
pub mod stream;
pub mod types;

// Re-export main types
pub use cache::{CachePolicy, CachePolicyEngine, CacheStats, Clock, Expiration, ManualClock, ResultCache};
pub use error::{Error, Result, UnclaimedColumn};
pub use mapping::{
    materialize_row, resolve_and_validate, ColumnBinding, ColumnValue, Entity, EntityBuilder,
    MemberType, ObjectMap, PartitionSpec,
};
pub use reader::{QueryOptions, QueryResult, Reader};
pub use stream::MaterializeStreamExt;
pub use types::{Column, DataType, DynamicRow, ResultSchema, Row, RowAccess, Value};
