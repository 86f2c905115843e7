//! Schema, row and value types consumed by the mapping engine.

mod column;
mod data_type;
mod dynamic;
mod row;
mod value;

pub use column::{Column, ResultSchema};
pub use data_type::DataType;
pub use dynamic::DynamicRow;
pub use row::{Row, RowAccess};
pub use value::Value;
