// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic instance model.
//!
//! Instances handed to the engine are trees of [`Value`]. Composite instances
//! are [`ObjectValue`]s carrying their *runtime* type name, which is what the
//! subtype registry dispatches on.

use std::collections::HashMap;
use std::fmt;

/// A dynamic value that can hold any serializable instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,

    // Primitives
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),

    // Containers
    List(Vec<Value>),
    Object(ObjectValue),
}

impl Value {
    /// Build a list from anything convertible into values.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }

    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if value is an integer of any width.
    pub fn is_integer(&self) -> bool {
        self.as_i128().is_some() && !matches!(self, Self::Bool(_))
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integer (or bool) widened to `i128`.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Bool(v) => Some(i128::from(*v)),
            Self::U8(v) => Some(i128::from(*v)),
            Self::U16(v) => Some(i128::from(*v)),
            Self::U32(v) => Some(i128::from(*v)),
            Self::U64(v) => Some(i128::from(*v)),
            Self::I8(v) => Some(i128::from(*v)),
            Self::I16(v) => Some(i128::from(*v)),
            Self::I32(v) => Some(i128::from(*v)),
            Self::I64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    /// Non-negative integer as `u64` (lengths, counts).
    pub fn as_u64(&self) -> Option<u64> {
        self.as_i128().and_then(|v| u64::try_from(v).ok())
    }

    /// Any number as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    /// Try to get as string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as raw bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get as list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get as object.
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Try to get as mutable object.
    pub fn as_object_mut(&mut self) -> Option<&mut ObjectValue> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Equality that ignores integer width (`U8(1)` equals `I32(1)`).
    ///
    /// Used when comparing discriminators and conditions, whose declared
    /// constants rarely share the source member's wire type.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self.as_i128(), other.as_i128()) {
            (Some(a), Some(b)) => a == b,
            _ => match (self, other) {
                (Self::F32(_) | Self::F64(_), _) | (_, Self::F32(_) | Self::F64(_)) => {
                    self.as_f64() == other.as_f64()
                }
                _ => self == other,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(obj) => write!(f, "{} {{..}}", obj.type_name()),
            other => match other.as_i128() {
                Some(v) => write!(f, "{v}"),
                None => f.write_str(other.kind_name()),
            },
        }
    }
}

/// A composite instance: runtime type name plus named member values.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    type_name: String,
    fields: HashMap<String, Value>,
}

impl ObjectValue {
    /// Create an empty instance of `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: HashMap::new(),
        }
    }

    /// Builder-style member assignment.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Runtime type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Set a member value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Get a member value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get a mutable member value.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    /// Get a member converted to a Rust type.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Option<T> {
        self.fields.get(name).and_then(T::from_value)
    }

    /// Remove a member value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Check whether a member has a value.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// All member values.
    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    /// Number of members with a value.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no member has a value.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Conversion from a [`Value`] to a Rust type.
pub trait FromValue: Sized {
    /// Returns `None` if the value has the wrong shape or does not fit.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_integer_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    if matches!(value, Value::Bool(_)) {
                        return None;
                    }
                    value.as_i128().and_then(|v| <$ty>::try_from(v).ok())
                }
            }
        )*
    };
}

impl_integer_conversions!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<ObjectValue> for Value {
    fn from(v: ObjectValue) -> Self {
        Self::Object(v)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::F32(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::F64(v) => Some(*v),
            Value::F32(v) => Some(f64::from(*v)),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bytes().map(<[u8]>::to_vec)
    }
}

impl FromValue for ObjectValue {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_object().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widening() {
        assert_eq!(Value::U8(7).as_u64(), Some(7));
        assert_eq!(Value::I32(-1).as_u64(), None);
        assert_eq!(Value::I16(-3).as_i128(), Some(-3));
        assert_eq!(Value::String("x".into()).as_i128(), None);
        assert!(Value::U32(1).is_integer());
        assert!(!Value::Bool(true).is_integer());
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::U8(2).loosely_equals(&Value::I64(2)));
        assert!(!Value::U8(2).loosely_equals(&Value::U8(3)));
        assert!(Value::from("a").loosely_equals(&Value::from("a")));
        assert!(Value::F32(1.5).loosely_equals(&Value::F64(1.5)));
        assert!(!Value::from("1").loosely_equals(&Value::U8(1)));
    }

    #[test]
    fn test_object_accessors() {
        let obj = ObjectValue::new("Point")
            .with("x", 10u16)
            .with("name", "origin");

        assert_eq!(obj.type_name(), "Point");
        assert_eq!(obj.get_as::<u16>("x"), Some(10));
        assert_eq!(obj.get_as::<u32>("x"), Some(10));
        assert_eq!(obj.get_as::<u8>("missing"), None);
        assert_eq!(obj.get_as::<String>("name").as_deref(), Some("origin"));
        assert_eq!(obj.len(), 2);
    }

    #[test]
    fn test_from_value_range_check() {
        assert_eq!(u8::from_value(&Value::U32(300)), None);
        assert_eq!(i8::from_value(&Value::I64(-128)), Some(-128));
        assert_eq!(u8::from_value(&Value::Bool(true)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::U16(3).to_string(), "3");
        assert_eq!(Value::list([1u8, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::from("a").to_string(), "\"a\"");
        assert_eq!(Value::from(ObjectValue::new("Point")).to_string(), "Point {..}");
    }

    #[test]
    fn test_list_builder() {
        let list = Value::list(["abc", "def"]);
        assert_eq!(
            list,
            Value::List(vec![Value::from("abc"), Value::from("def")])
        );
    }
}
