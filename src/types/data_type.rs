//! Column data types reported by a result schema.
//!
//! Note: Nullability is a column property, not a type property.

use std::fmt;

/// Declared data type of a result set column or a mapped member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean / BIT.
    Bool,
    /// 8-bit unsigned integer.
    TinyInt,
    /// 16-bit integer.
    SmallInt,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    BigInt,
    /// 32-bit float.
    Real,
    /// 64-bit float.
    Double,
    /// Variable-length text.
    Text,
    /// Single character.
    Char,
    /// Raw binary.
    Binary,
    /// Date/time (no timezone).
    DateTime,
}

impl DataType {
    /// Whether this is one of the integral types.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::TinyInt | DataType::SmallInt | DataType::Int | DataType::BigInt
        )
    }

    /// Width rank for integral and floating types, used for widening checks.
    fn rank(&self) -> Option<(bool, u8)> {
        match self {
            DataType::TinyInt => Some((false, 1)),
            DataType::SmallInt => Some((false, 2)),
            DataType::Int => Some((false, 3)),
            DataType::BigInt => Some((false, 4)),
            DataType::Real => Some((true, 1)),
            DataType::Double => Some((true, 2)),
            _ => None,
        }
    }

    /// Whether a column of type `self` can be stored in a member of type
    /// `target` without loss.
    ///
    /// Integers widen to wider integers, `Real` widens to `Double`. There are
    /// no integer to float widenings.
    pub fn widens_to(&self, target: DataType) -> bool {
        if *self == target {
            return true;
        }
        match (self.rank(), target.rank()) {
            (Some((src_float, src)), Some((dst_float, dst))) => {
                src_float == dst_float && src <= dst
            }
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "BOOL",
            DataType::TinyInt => "TINYINT",
            DataType::SmallInt => "SMALLINT",
            DataType::Int => "INT",
            DataType::BigInt => "BIGINT",
            DataType::Real => "REAL",
            DataType::Double => "DOUBLE",
            DataType::Text => "TEXT",
            DataType::Char => "CHAR",
            DataType::Binary => "BINARY",
            DataType::DateTime => "DATETIME",
        };
        f.write_str(name)
    }
}
