// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type and member descriptors.

use crate::codec::{BinarySerializable, CustomCodec};
use crate::descriptor::{BindingSource, Condition, LengthBinding, SubtypeBinding};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Byte order for multi-byte primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// How a string is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StringEncoding {
    /// Bytes followed by a `0` terminator. Written without terminator when
    /// the member is length-bound.
    #[default]
    NullTerminated,
    /// 7-bit variable-length byte count, then bytes.
    LengthPrefixed,
    /// Bytes only; reads consume the rest of the bounded region, padding
    /// included.
    Sized,
}

/// Primitive wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    String(StringEncoding),
    /// Raw bytes; reads consume the rest of the bounded region.
    Bytes,
}

impl PrimitiveKind {
    /// Null-terminated string.
    pub const STRING: Self = Self::String(StringEncoding::NullTerminated);

    /// Fixed wire size in bytes (None for strings and bytes).
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::Bool | Self::U8 | Self::I8 => Some(1),
            Self::U16 | Self::I16 => Some(2),
            Self::U32 | Self::I32 | Self::F32 => Some(4),
            Self::U64 | Self::I64 | Self::F64 => Some(8),
            Self::String(_) | Self::Bytes => None,
        }
    }

    /// Check if this kind can hold a length, count or integer key.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::U8 | Self::U16 | Self::U32 | Self::U64 | Self::I8 | Self::I16 | Self::I32 | Self::I64
        )
    }

    /// Short name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String(_) => "string",
            Self::Bytes => "bytes",
        }
    }

    /// Value written for a member the instance leaves unset.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::U8 => Value::U8(0),
            Self::U16 => Value::U16(0),
            Self::U32 => Value::U32(0),
            Self::U64 => Value::U64(0),
            Self::I8 => Value::I8(0),
            Self::I16 => Value::I16(0),
            Self::I32 => Value::I32(0),
            Self::I64 => Value::I64(0),
            Self::F32 => Value::F32(0.0),
            Self::F64 => Value::F64(0.0),
            Self::String(_) => Value::String(String::new()),
            Self::Bytes => Value::Bytes(Vec::new()),
        }
    }
}

/// Reference from a member to the type it holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Terminal wire value.
    Primitive(PrimitiveKind),
    /// Registered composite type, looked up by name.
    Named(String),
    /// Homogeneous repetition of an element type.
    Collection(Box<TypeRef>),
}

impl TypeRef {
    /// Reference a registered composite type.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Collection of `element`.
    pub fn collection(element: impl Into<TypeRef>) -> Self {
        Self::Collection(Box::new(element.into()))
    }

    /// Null-terminated string.
    pub fn string() -> Self {
        Self::Primitive(PrimitiveKind::STRING)
    }

    /// Check if this is a collection.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    /// Type name shown to custom codecs and in messages.
    pub fn label(&self) -> &str {
        match self {
            Self::Primitive(kind) => kind.name(),
            Self::Named(name) => name,
            Self::Collection(_) => "collection",
        }
    }
}

impl From<PrimitiveKind> for TypeRef {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}

/// Opaque annotation carried by a member and handed to custom codecs
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Annotation {
    /// Annotation name.
    pub name: String,
    /// Free-form key/value arguments.
    pub arguments: Vec<(String, String)>,
}

impl Annotation {
    /// Create an annotation without arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    /// Add an argument.
    #[must_use]
    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.push((key.into(), value.into()));
        self
    }

    /// Look up an argument by key.
    pub fn argument(&self, key: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// One constructor of a composite type, identified by the members it
/// receives as parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ConstructorDescriptor {
    /// Member names taken as parameters.
    pub parameters: Vec<String>,
}

impl ConstructorDescriptor {
    /// Create a constructor taking the given members.
    pub fn new<I, S>(parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }
}

/// Binding metadata for one declared member.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    /// Member name.
    pub name: String,
    /// Declared type.
    pub type_ref: TypeRef,
    /// Field order; required when the type has more than one member.
    pub order: Option<i32>,
    /// Serialized byte length.
    pub length: Option<LengthBinding>,
    /// Collection item count.
    pub count: Option<LengthBinding>,
    /// Byte length of each collection item.
    pub item_length: Option<LengthBinding>,
    /// Polymorphic discriminator binding.
    pub subtypes: Option<SubtypeBinding>,
    /// Member is serialized only if one of these holds.
    pub conditions: Vec<Condition>,
    /// Byte order override for this member's subtree.
    pub endianness: Option<Endianness>,
    /// Wire type override for primitive members.
    pub serialize_as: Option<PrimitiveKind>,
    /// Skipped entirely by the engine.
    pub ignore: bool,
    /// `false` for members only a constructor can set.
    pub settable: bool,
    /// Member-level codec replacing default encoding.
    pub codec: Option<CustomCodec>,
    /// Pass-through annotations for custom codecs.
    pub annotations: Vec<Annotation>,
}

impl MemberDescriptor {
    /// Create a new member descriptor.
    pub fn new(name: impl Into<String>, type_ref: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
            order: None,
            length: None,
            count: None,
            item_length: None,
            subtypes: None,
            conditions: Vec::new(),
            endianness: None,
            serialize_as: None,
            ignore: false,
            settable: true,
            codec: None,
            annotations: Vec::new(),
        }
    }

    /// Set field order.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Bind serialized byte length.
    #[must_use]
    pub fn with_length(mut self, length: impl Into<LengthBinding>) -> Self {
        self.length = Some(length.into());
        self
    }

    /// Bind collection item count.
    #[must_use]
    pub fn with_count(mut self, count: impl Into<LengthBinding>) -> Self {
        self.count = Some(count.into());
        self
    }

    /// Bind per-item byte length.
    #[must_use]
    pub fn with_item_length(mut self, item_length: impl Into<LengthBinding>) -> Self {
        self.item_length = Some(item_length.into());
        self
    }

    /// Declare polymorphic subtypes.
    #[must_use]
    pub fn with_subtypes(mut self, subtypes: SubtypeBinding) -> Self {
        self.subtypes = Some(subtypes);
        self
    }

    /// Serialize only when `condition` holds (conditions are OR-ed).
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Override byte order.
    #[must_use]
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = Some(endianness);
        self
    }

    /// Override the wire type of a primitive member.
    #[must_use]
    pub fn serialize_as(mut self, kind: PrimitiveKind) -> Self {
        self.serialize_as = Some(kind);
        self
    }

    /// Exclude from serialization.
    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Mark as settable only through a constructor.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.settable = false;
        self
    }

    /// Replace default encoding with a custom codec.
    #[must_use]
    pub fn with_codec(mut self, codec: impl BinarySerializable + 'static) -> Self {
        self.codec = Some(CustomCodec::new(codec));
        self
    }

    /// Attach a pass-through annotation.
    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Sources of the length, count, item-length and subtype bindings.
    pub fn binding_sources(&self) -> impl Iterator<Item = &BindingSource> {
        [&self.length, &self.count, &self.item_length]
            .into_iter()
            .filter_map(|b| b.as_ref().and_then(LengthBinding::source))
            .chain(self.subtypes.as_ref().map(|s| &s.source))
    }
}

/// Descriptor table entry for one composite type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Type name.
    pub name: String,
    /// Base type whose members precede this type's own.
    pub base: Option<String>,
    /// Members declared by this type (not inherited ones).
    pub members: Vec<MemberDescriptor>,
    /// Constructor set; empty means an implicit parameterless constructor.
    pub constructors: Vec<ConstructorDescriptor>,
    /// Abstract types cannot be instantiated.
    pub is_abstract: bool,
    /// Type owns its byte representation.
    pub codec: Option<CustomCodec>,
}

impl TypeDescriptor {
    /// Create a type descriptor without members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            members: Vec::new(),
            constructors: Vec::new(),
            is_abstract: false,
            codec: None,
        }
    }

    /// Get a declared member by name.
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Declared members the engine serializes.
    pub fn serializable_members(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.members.iter().filter(|m| !m.ignore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_size() {
        assert_eq!(PrimitiveKind::Bool.size(), Some(1));
        assert_eq!(PrimitiveKind::U32.size(), Some(4));
        assert_eq!(PrimitiveKind::F64.size(), Some(8));
        assert_eq!(PrimitiveKind::STRING.size(), None);
        assert_eq!(PrimitiveKind::Bytes.size(), None);
    }

    #[test]
    fn test_member_builder_flags() {
        let member = MemberDescriptor::new("len", PrimitiveKind::U16)
            .with_order(2)
            .with_endianness(Endianness::Big)
            .read_only()
            .with_annotation(Annotation::new("Doc").with_argument("unit", "bytes"));

        assert_eq!(member.order, Some(2));
        assert_eq!(member.endianness, Some(Endianness::Big));
        assert!(!member.settable);
        assert!(!member.ignore);
        assert_eq!(member.annotations[0].argument("unit"), Some("bytes"));
    }

    #[test]
    fn test_serializable_members_skip_ignored() {
        let mut desc = TypeDescriptor::new("Header");
        desc.members
            .push(MemberDescriptor::new("a", PrimitiveKind::U8).with_order(0));
        desc.members
            .push(MemberDescriptor::new("cache", PrimitiveKind::U8).ignored());

        let names: Vec<_> = desc.serializable_members().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a"]);
        assert!(desc.member("cache").is_some());
    }
}
