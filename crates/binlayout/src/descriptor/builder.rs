// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder for type descriptors.
//!
//! ```
//! use binlayout::{PrimitiveKind, TypeDescriptorBuilder, TypeRef};
//!
//! let packet = TypeDescriptorBuilder::new("Packet")
//!     .field("id", 0, PrimitiveKind::U32)
//!     .field("name", 1, TypeRef::string())
//!     .build();
//!
//! assert_eq!(packet.members.len(), 2);
//! ```

use crate::codec::{BinarySerializable, CustomCodec};
use crate::descriptor::{ConstructorDescriptor, MemberDescriptor, TypeDescriptor, TypeRef};

/// Builder for [`TypeDescriptor`].
pub struct TypeDescriptorBuilder {
    descriptor: TypeDescriptor,
}

impl TypeDescriptorBuilder {
    /// Start a descriptor for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: TypeDescriptor::new(name),
        }
    }

    /// Derive from `base`; its members are serialized first.
    #[must_use]
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.descriptor.base = Some(base.into());
        self
    }

    /// Add a fully specified member.
    #[must_use]
    pub fn member(mut self, member: MemberDescriptor) -> Self {
        self.descriptor.members.push(member);
        self
    }

    /// Add a plain ordered member.
    #[must_use]
    pub fn field(self, name: impl Into<String>, order: i32, type_ref: impl Into<TypeRef>) -> Self {
        self.member(MemberDescriptor::new(name, type_ref).with_order(order))
    }

    /// Declare a constructor taking the given members.
    #[must_use]
    pub fn constructor(mut self, parameters: &[&str]) -> Self {
        self.descriptor
            .constructors
            .push(ConstructorDescriptor::new(parameters.iter().copied()));
        self
    }

    /// Mark the type abstract.
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.descriptor.is_abstract = true;
        self
    }

    /// Let the type serialize itself.
    #[must_use]
    pub fn codec(mut self, codec: impl BinarySerializable + 'static) -> Self {
        self.descriptor.codec = Some(CustomCodec::new(codec));
        self
    }

    /// Finish.
    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}
