// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type nodes: the cached layout description.

use super::subtype::SubtypeRegistry;
use crate::codec::CustomCodec;
use crate::descriptor::{MemberDescriptor, PrimitiveKind, SubtypeBinding};
use crate::error::SchemaError;
use std::sync::Arc;

/// One node of the type graph: a member (or the root type) and its layout.
#[derive(Debug)]
pub struct TypeNode {
    name: String,
    member: Option<Arc<MemberDescriptor>>,
    kind: TypeNodeKind,
}

/// Layout behaviour of a [`TypeNode`].
#[derive(Debug)]
pub enum TypeNodeKind {
    /// Terminal value encoded by the primitive codec.
    Primitive(PrimitiveKind),
    /// Composite with per-runtime-type children.
    Object(ObjectTypeNode),
    /// Repetition of one element node.
    Collection(CollectionTypeNode),
    /// Member-level custom codec.
    Custom(CustomCodec),
}

/// Composite node. Children live in the subtype registry, one set per
/// runtime type.
#[derive(Debug)]
pub struct ObjectTypeNode {
    subtypes: SubtypeRegistry,
}

impl ObjectTypeNode {
    pub(crate) fn new(
        declared: &str,
        member: &str,
        binding: Option<SubtypeBinding>,
    ) -> Result<Self, SchemaError> {
        Ok(Self {
            subtypes: SubtypeRegistry::new(declared, member, binding)?,
        })
    }

    /// Declared type name.
    pub fn declared(&self) -> &str {
        self.subtypes.declared()
    }

    pub fn subtypes(&self) -> &SubtypeRegistry {
        &self.subtypes
    }
}

/// Collection node.
#[derive(Debug)]
pub struct CollectionTypeNode {
    element: Arc<TypeNode>,
}

impl CollectionTypeNode {
    pub(crate) fn new(element: TypeNode) -> Self {
        Self {
            element: Arc::new(element),
        }
    }

    pub fn element(&self) -> &Arc<TypeNode> {
        &self.element
    }
}

impl TypeNode {
    pub(crate) fn new(
        name: impl Into<String>,
        member: Option<Arc<MemberDescriptor>>,
        kind: TypeNodeKind,
    ) -> Self {
        Self {
            name: name.into(),
            member,
            kind,
        }
    }

    /// Member name (type name at the root, `item` for collection elements).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member metadata; `None` for roots and collection elements.
    pub fn member(&self) -> Option<&MemberDescriptor> {
        self.member.as_deref()
    }

    pub fn kind(&self) -> &TypeNodeKind {
        &self.kind
    }

    pub fn as_object(&self) -> Option<&ObjectTypeNode> {
        match &self.kind {
            TypeNodeKind::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionTypeNode> {
        match &self.kind {
            TypeNodeKind::Collection(col) => Some(col),
            _ => None,
        }
    }

    /// Declared primitive kind.
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match &self.kind {
            TypeNodeKind::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Kind written on the wire (after `serialize_as`).
    pub fn wire_kind(&self) -> Option<PrimitiveKind> {
        let declared = self.primitive()?;
        Some(self.member().and_then(|m| m.serialize_as).unwrap_or(declared))
    }

    /// Short name of the node kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            TypeNodeKind::Primitive(_) => "primitive",
            TypeNodeKind::Object(_) => "object",
            TypeNodeKind::Collection(_) => "collection",
            TypeNodeKind::Custom(_) => "custom",
        }
    }

    /// Type name shown to custom codecs.
    pub fn type_label(&self) -> &str {
        match (&self.kind, self.member()) {
            (TypeNodeKind::Object(obj), _) => obj.declared(),
            (TypeNodeKind::Primitive(kind), _) => kind.name(),
            (TypeNodeKind::Collection(_), _) => "collection",
            (TypeNodeKind::Custom(_), Some(member)) => member.type_ref.label(),
            (TypeNodeKind::Custom(_), None) => &self.name,
        }
    }
}
