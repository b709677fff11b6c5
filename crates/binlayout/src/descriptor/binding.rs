// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binding expressions: lengths, counts, discriminators and conditions that
//! refer to other members of the same instance.

use crate::value::Value;
use std::fmt;

/// Direction of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BindingMode {
    /// Source is read on decode and computed by the writer on encode.
    #[default]
    TwoWay,
    /// Source is only read; the writer never touches it.
    OneWay,
}

/// Reference from a bound member to the member supplying its value.
///
/// Resolution starts at the object declaring the bound member, climbs
/// `ancestor` enclosing objects, then follows `path` through member names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingSource {
    /// Member names from the starting scope to the source.
    pub path: Vec<String>,
    /// Enclosing objects to climb first (0 = siblings).
    pub ancestor: u32,
    /// Binding direction.
    pub mode: BindingMode,
}

impl BindingSource {
    /// Sibling member.
    pub fn sibling(name: impl Into<String>) -> Self {
        Self {
            path: vec![name.into()],
            ancestor: 0,
            mode: BindingMode::TwoWay,
        }
    }

    /// Dotted path from the declaring object, e.g. `header.length`.
    pub fn path(path: &str) -> Self {
        Self {
            path: path.split('.').map(str::to_string).collect(),
            ancestor: 0,
            mode: BindingMode::TwoWay,
        }
    }

    /// Dotted path starting `level` objects above the declaring one.
    pub fn ancestor(path: &str, level: u32) -> Self {
        Self {
            ancestor: level,
            ..Self::path(path)
        }
    }

    /// Make the binding read-only for the writer.
    #[must_use]
    pub fn one_way(mut self) -> Self {
        self.mode = BindingMode::OneWay;
        self
    }

    /// Check if the writer computes the source.
    pub fn is_two_way(&self) -> bool {
        self.mode == BindingMode::TwoWay
    }

    /// Check if the source is a sibling of the bound member.
    pub fn is_sibling(&self) -> bool {
        self.ancestor == 0 && self.path.len() == 1
    }
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.ancestor {
            f.write_str("../")?;
        }
        f.write_str(&self.path.join("."))
    }
}

/// Length or count of a member: fixed or bound to another member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LengthBinding {
    /// Fixed at declaration.
    Constant(u64),
    /// Read from (and, for two-way bindings, written to) another member.
    Source(BindingSource),
}

impl LengthBinding {
    /// Fixed value.
    pub fn constant(value: u64) -> Self {
        Self::Constant(value)
    }

    /// Two-way binding to a sibling member.
    pub fn sibling(name: impl Into<String>) -> Self {
        Self::Source(BindingSource::sibling(name))
    }

    /// Binding source, if not constant.
    pub fn source(&self) -> Option<&BindingSource> {
        match self {
            Self::Constant(_) => None,
            Self::Source(source) => Some(source),
        }
    }
}

impl From<u64> for LengthBinding {
    fn from(value: u64) -> Self {
        Self::Constant(value)
    }
}

impl From<BindingSource> for LengthBinding {
    fn from(source: BindingSource) -> Self {
        Self::Source(source)
    }
}

/// Discriminator value selecting a subtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubtypeKey {
    Int(i128),
    Str(String),
}

impl SubtypeKey {
    /// Key matching a source value, if the value is a usable discriminator.
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(v) = value.as_i128() {
            return Some(Self::Int(v));
        }
        value.as_str().map(|s| Self::Str(s.to_string()))
    }
}

impl fmt::Display for SubtypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

macro_rules! impl_subtype_key_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SubtypeKey {
                fn from(v: $ty) -> Self {
                    Self::Int(i128::from(v))
                }
            }
        )*
    };
}

impl_subtype_key_from_int!(u8, u16, u32, u64, i8, i16, i32, i64);

impl From<&str> for SubtypeKey {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for SubtypeKey {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// One `(key, type)` pair of a subtype binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubtypeCase {
    pub key: SubtypeKey,
    pub type_name: String,
}

/// Polymorphic member metadata: discriminator source plus key/type table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtypeBinding {
    /// Member holding the discriminator.
    pub source: BindingSource,
    /// Declared subtypes.
    pub cases: Vec<SubtypeCase>,
    /// Type used on decode when the key matches no case.
    pub default: Option<String>,
}

impl SubtypeBinding {
    /// Create a binding with no cases.
    pub fn new(source: BindingSource) -> Self {
        Self {
            source,
            cases: Vec::new(),
            default: None,
        }
    }

    /// Add a `(key, type)` case.
    #[must_use]
    pub fn case(mut self, key: impl Into<SubtypeKey>, type_name: impl Into<String>) -> Self {
        self.cases.push(SubtypeCase {
            key: key.into(),
            type_name: type_name.into(),
        });
        self
    }

    /// Set the fallback subtype for unknown keys.
    #[must_use]
    pub fn default_subtype(mut self, type_name: impl Into<String>) -> Self {
        self.default = Some(type_name.into());
        self
    }
}

/// Serialization condition: source member must equal `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub source: BindingSource,
    pub value: Value,
}

impl Condition {
    /// Member is serialized when the sibling `name` equals `value`.
    pub fn equals(name: &str, value: impl Into<Value>) -> Self {
        Self {
            source: BindingSource::path(name).one_way(),
            value: value.into(),
        }
    }

    /// Check the condition against a resolved source value.
    pub fn matches(&self, source: &Value) -> bool {
        source.loosely_equals(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_paths() {
        let source = BindingSource::ancestor("header.length", 2).one_way();
        assert_eq!(source.path, vec!["header", "length"]);
        assert_eq!(source.ancestor, 2);
        assert!(!source.is_two_way());
        assert!(!source.is_sibling());
        assert_eq!(source.to_string(), "../../header.length");

        assert!(BindingSource::sibling("len").is_sibling());
    }

    #[test]
    fn test_subtype_key_from_value() {
        assert_eq!(
            SubtypeKey::from_value(&Value::U8(3)),
            Some(SubtypeKey::Int(3))
        );
        assert_eq!(SubtypeKey::from_value(&Value::U8(3)), Some(3u32.into()));
        assert_eq!(
            SubtypeKey::from_value(&Value::from("rect")),
            Some(SubtypeKey::from("rect"))
        );
        assert_eq!(SubtypeKey::from_value(&Value::F32(1.0)), None);
    }

    #[test]
    fn test_condition_loose_match() {
        let condition = Condition::equals("kind", 1u8);
        assert!(condition.matches(&Value::U32(1)));
        assert!(!condition.matches(&Value::U32(2)));
        assert!(!condition.source.is_two_way());
    }
}
