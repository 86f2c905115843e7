//! Per-type member descriptors and the process-wide descriptor cache.
//!
//! A target type lists its mappable members once, through [`Entity::describe`].
//! The resulting [`TypeDescriptor`] is an accessor table of typed setters that
//! is built at most once per type and then shared read-only, so materializing
//! a row costs one setter call per column and no introspection.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use log::{debug, warn};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::types::{DataType, Value};

/// Declared type of a mapped member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberType {
    /// Underlying data type (the `T` of an `Option<T>`).
    pub data_type: DataType,
    /// Whether the member is an `Option`.
    pub nullable: bool,
    /// Whether the member is an enum stored as its integral value.
    pub is_enum: bool,
}

impl MemberType {
    /// A plain, non-nullable member.
    pub const fn scalar(data_type: DataType) -> Self {
        Self {
            data_type,
            nullable: false,
            is_enum: false,
        }
    }

    /// An enum member stored as `repr`.
    pub const fn enumeration(repr: DataType) -> Self {
        Self {
            data_type: repr,
            nullable: false,
            is_enum: true,
        }
    }

    /// The same member type wrapped in `Option`.
    pub const fn into_nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = if self.is_enum {
            format!("ENUM({})", self.data_type)
        } else {
            self.data_type.to_string()
        };
        if self.nullable {
            write!(f, "NULLABLE {}", base)
        } else {
            f.write_str(&base)
        }
    }
}

/// A Rust type that can receive a column value.
///
/// Implemented for integers, floats, `bool`, `char`, `String`, `Vec<u8>`,
/// `NaiveDateTime` and `Option` of any of these. Enums opt in with
/// [`column_enum!`](crate::column_enum).
pub trait ColumnValue: Sized + Send + Sync + 'static {
    /// Declared type used by schema validation.
    fn member_type() -> MemberType;

    /// Convert a raw value, widening or narrowing with range checks.
    fn from_value(value: &Value) -> Result<Self>;

    /// Convert back to a raw value.
    fn to_value(&self) -> Value;

    /// Value assigned when the column is NULL.
    fn null_value() -> Self;
}

fn conversion_error(value: &Value, target: &str) -> Error {
    Error::type_conversion(format!("cannot convert {} value '{}' to {}", value.kind(), value, target))
}

fn integral(value: &Value, target: &str) -> Result<i64> {
    match value {
        Value::Int(v) => Ok(*v),
        Value::Bool(b) => Ok(*b as i64),
        Value::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
            Ok(*f as i64)
        }
        _ => Err(conversion_error(value, target)),
    }
}

macro_rules! impl_integer_column {
    ($($ty:ty => $dt:ident),* $(,)?) => {
        $(
            impl ColumnValue for $ty {
                fn member_type() -> MemberType {
                    MemberType::scalar(DataType::$dt)
                }

                fn from_value(value: &Value) -> Result<Self> {
                    let raw = integral(value, stringify!($ty))?;
                    <$ty>::try_from(raw).map_err(|_| {
                        Error::type_conversion(format!(
                            "value {} out of range for {}",
                            raw,
                            stringify!($ty)
                        ))
                    })
                }

                fn to_value(&self) -> Value {
                    Value::Int(*self as i64)
                }

                fn null_value() -> Self {
                    0
                }
            }
        )*
    };
}

impl_integer_column!(
    i8 => TinyInt,
    u8 => TinyInt,
    i16 => SmallInt,
    u16 => Int,
    i32 => Int,
    u32 => BigInt,
    i64 => BigInt,
);

impl ColumnValue for f32 {
    fn member_type() -> MemberType {
        MemberType::scalar(DataType::Real)
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(v) => {
                let narrowed = *v as f32;
                if v.is_finite() && !narrowed.is_finite() {
                    return Err(Error::type_conversion(format!("value {} out of range for f32", v)));
                }
                Ok(narrowed)
            }
            Value::Int(v) => Ok(*v as f32),
            _ => Err(conversion_error(value, "f32")),
        }
    }

    fn to_value(&self) -> Value {
        Value::Float(*self as f64)
    }

    fn null_value() -> Self {
        0.0
    }
}

impl ColumnValue for f64 {
    fn member_type() -> MemberType {
        MemberType::scalar(DataType::Double)
    }

    fn from_value(value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| conversion_error(value, "f64"))
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn null_value() -> Self {
        0.0
    }
}

impl ColumnValue for bool {
    fn member_type() -> MemberType {
        MemberType::scalar(DataType::Bool)
    }

    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| conversion_error(value, "bool"))
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn null_value() -> Self {
        false
    }
}

impl ColumnValue for char {
    fn member_type() -> MemberType {
        MemberType::scalar(DataType::Char)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let s = value.as_str().ok_or_else(|| conversion_error(value, "char"))?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(conversion_error(value, "char")),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }

    fn null_value() -> Self {
        '\0'
    }
}

impl ColumnValue for String {
    fn member_type() -> MemberType {
        MemberType::scalar(DataType::Text)
    }

    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| conversion_error(value, "String"))
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn null_value() -> Self {
        String::new()
    }
}

impl ColumnValue for Vec<u8> {
    fn member_type() -> MemberType {
        MemberType::scalar(DataType::Binary)
    }

    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| conversion_error(value, "Vec<u8>"))
    }

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn null_value() -> Self {
        Vec::new()
    }
}

impl ColumnValue for NaiveDateTime {
    fn member_type() -> MemberType {
        MemberType::scalar(DataType::DateTime)
    }

    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_datetime()
            .ok_or_else(|| conversion_error(value, "NaiveDateTime"))
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }

    fn null_value() -> Self {
        NaiveDateTime::default()
    }
}

impl<V: ColumnValue> ColumnValue for Option<V> {
    fn member_type() -> MemberType {
        V::member_type().into_nullable()
    }

    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            V::from_value(value).map(Some)
        }
    }

    fn to_value(&self) -> Value {
        self.as_ref().map(ColumnValue::to_value).unwrap_or(Value::Null)
    }

    fn null_value() -> Self {
        None
    }
}

/// Implements [`ColumnValue`] for a fieldless enum stored as an integer.
///
/// The enum must implement `Default`; that variant is assigned for NULL.
///
/// ```
/// use rowmap::column_enum;
///
/// #[derive(Debug, Clone, Copy, Default, PartialEq)]
/// enum Mood {
///     #[default]
///     Calm,
///     Angry,
/// }
///
/// column_enum!(Mood: i32 { Mood::Calm = 0, Mood::Angry = 1 });
/// ```
#[macro_export]
macro_rules! column_enum {
    ($ty:ty : $repr:ty { $($variant:path = $value:expr),+ $(,)? }) => {
        impl $crate::ColumnValue for $ty {
            fn member_type() -> $crate::MemberType {
                $crate::MemberType::enumeration(
                    <$repr as $crate::ColumnValue>::member_type().data_type,
                )
            }

            fn from_value(value: &$crate::Value) -> $crate::Result<Self> {
                let raw = <$repr as $crate::ColumnValue>::from_value(value)?;
                $(
                    if raw == $value {
                        return Ok($variant);
                    }
                )+
                Err($crate::Error::type_conversion(format!(
                    "{} is not a valid {}",
                    raw,
                    stringify!($ty)
                )))
            }

            fn to_value(&self) -> $crate::Value {
                match self {
                    $( $variant => <$repr as $crate::ColumnValue>::to_value(&$value), )+
                }
            }

            fn null_value() -> Self {
                <$ty as ::std::default::Default>::default()
            }
        }
    };
}

type Setter<T> = Arc<dyn Fn(&mut T, &Value) -> Result<()> + Send + Sync>;

/// Metadata and setter for one mapped member.
pub struct MemberDescriptor<T> {
    name: String,
    member_type: MemberType,
    zero: fn() -> Value,
    setter: Setter<T>,
}

impl<T> MemberDescriptor<T> {
    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub fn member_type(&self) -> MemberType {
        self.member_type
    }

    /// Fresh zero value for this member.
    pub fn zero_value(&self) -> Value {
        (self.zero)()
    }

    /// Assign `value` to this member of `target`.
    pub fn assign(&self, target: &mut T, value: &Value) -> Result<()> {
        (self.setter)(target, value)
    }
}

impl<T> fmt::Debug for MemberDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("member_type", &self.member_type)
            .finish()
    }
}

fn zero_of<V: ColumnValue>() -> Value {
    V::null_value().to_value()
}

/// Collects member descriptors for [`Entity::describe`].
pub struct EntityBuilder<T> {
    members: Vec<MemberDescriptor<T>>,
}

impl<T: 'static> EntityBuilder<T> {
    fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Register a mappable member and its setter.
    ///
    /// A name registered twice keeps its first registration.
    pub fn column<V, F>(&mut self, name: &str, set: F) -> &mut Self
    where
        V: ColumnValue,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        if self.members.iter().any(|m| m.name == name) {
            warn!(
                "member '{}' registered twice on {}; keeping the first",
                name,
                std::any::type_name::<T>()
            );
            return self;
        }
        let member = name.to_string();
        let setter: Setter<T> = Arc::new(move |target: &mut T, value: &Value| {
            let converted = V::from_value(value).map_err(|e| match e {
                Error::TypeConversion { message } => {
                    Error::type_conversion(format!("member '{}': {}", member, message))
                }
                other => other,
            })?;
            set(target, converted);
            Ok(())
        });
        self.members.push(MemberDescriptor {
            name: name.to_string(),
            member_type: V::member_type(),
            zero: zero_of::<V>,
            setter,
        });
        self
    }
}

/// A type that rows can be materialized into.
///
/// ```
/// use rowmap::{Entity, EntityBuilder};
///
/// #[derive(Default)]
/// struct Person {
///     id: i64,
///     name: Option<String>,
/// }
///
/// impl Entity for Person {
///     fn describe(b: &mut EntityBuilder<Self>) {
///         b.column("Id", |p: &mut Person, v| p.id = v)
///             .column("Name", |p: &mut Person, v| p.name = v);
///     }
/// }
/// ```
pub trait Entity: Default + Send + Sync + 'static {
    /// Register every mappable member. Must not call [`descriptor_of`].
    fn describe(builder: &mut EntityBuilder<Self>);
}

/// Accessor table for one target type.
pub struct TypeDescriptor<T> {
    type_name: &'static str,
    members: Vec<MemberDescriptor<T>>,
    index: HashMap<String, usize>,
}

impl<T: Entity> TypeDescriptor<T> {
    fn build() -> Self {
        let mut builder = EntityBuilder::new();
        T::describe(&mut builder);
        let members = builder.members;
        let index = members
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        Self {
            type_name: short_type_name::<T>(),
            members,
            index,
        }
    }
}

impl<T> TypeDescriptor<T> {
    /// Short name of the target type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Members in registration order.
    pub fn members(&self) -> &[MemberDescriptor<T>] {
        &self.members
    }

    /// Member by exact name.
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor<T>> {
        self.index.get(name).map(|&i| &self.members[i])
    }

    /// Member names in registration order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name.as_str())
    }
}

impl<T> fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("members", &self.members)
            .finish()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    match full.find('<') {
        Some(generic) => full[..generic].rsplit("::").next().unwrap_or(full),
        None => full.rsplit("::").next().unwrap_or(full),
    }
}

type DescriptorMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

static DESCRIPTORS: Lazy<RwLock<DescriptorMap>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Cached descriptor for `T`, built on first use.
///
/// Concurrent first calls may each build a descriptor; the first one inserted
/// wins and every caller receives that instance.
pub fn descriptor_of<T: Entity>() -> Arc<TypeDescriptor<T>> {
    let id = TypeId::of::<T>();
    if let Some(cached) = DESCRIPTORS.read().get(&id).cloned() {
        if let Ok(descriptor) = cached.downcast::<TypeDescriptor<T>>() {
            return descriptor;
        }
    }

    let built: Arc<dyn Any + Send + Sync> = Arc::new(TypeDescriptor::<T>::build());
    let stored = DESCRIPTORS.write().entry(id).or_insert(built).clone();
    debug!("type descriptor cached for {}", std::any::type_name::<T>());
    stored
        .downcast::<TypeDescriptor<T>>()
        .unwrap_or_else(|_| Arc::new(TypeDescriptor::<T>::build()))
}

/// Whether a descriptor for `T` has been cached.
pub fn is_cached<T: Entity>() -> bool {
    DESCRIPTORS.read().contains_key(&TypeId::of::<T>())
}
