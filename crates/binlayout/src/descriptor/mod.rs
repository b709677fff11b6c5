// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Metadata descriptor model.
//!
//! A [`TypeDescriptor`] lists the members of one composite type together with
//! the binding metadata the engine needs to lay them out: field order, length
//! and count bindings, polymorphic discriminators, endianness overrides and
//! custom codecs. Descriptors are registered ahead of time in a
//! [`DescriptorTable`] (or any [`TypeRegistry`]); the type graph reads them
//! once per type.

mod binding;
mod builder;
mod registry;
mod types;

pub use binding::{
    BindingMode, BindingSource, Condition, LengthBinding, SubtypeBinding, SubtypeCase, SubtypeKey,
};
pub use builder::TypeDescriptorBuilder;
pub use registry::{DescriptorTable, TypeRegistry};
pub use types::{
    Annotation, ConstructorDescriptor, Endianness, MemberDescriptor, PrimitiveKind,
    StringEncoding, TypeDescriptor, TypeRef,
};
