// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Custom codec hook.
//!
//! A type or member carrying a [`CustomCodec`] owns its byte representation:
//! the engine hands it the stream, the effective byte order and a
//! [`SerializationContext`] and skips structural traversal of that subtree.
//! Length bindings still apply around the codec: on encode the bytes it
//! writes are measured, on decode it reads from a bounded region.

use crate::descriptor::{Annotation, Endianness, MemberDescriptor};
use crate::error::Result;
use crate::value::Value;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

/// Self-serializing type or member.
pub trait BinarySerializable: Send + Sync {
    /// Write `value` to `stream`.
    fn serialize(
        &self,
        value: &Value,
        stream: &mut dyn Write,
        endianness: Endianness,
        context: &SerializationContext<'_>,
    ) -> Result<()>;

    /// Read a value from `stream`.
    ///
    /// When the member is length-bound, `stream` ends at the bound and any
    /// unread bytes are skipped afterwards.
    fn deserialize(
        &self,
        stream: &mut dyn Read,
        endianness: Endianness,
        context: &SerializationContext<'_>,
    ) -> Result<Value>;
}

/// Shared handle to a [`BinarySerializable`] implementation.
#[derive(Clone)]
pub struct CustomCodec(Arc<dyn BinarySerializable>);

impl CustomCodec {
    pub fn new(codec: impl BinarySerializable + 'static) -> Self {
        Self(Arc::new(codec))
    }

    /// Wrap an already shared codec.
    pub fn from_arc(codec: Arc<dyn BinarySerializable>) -> Self {
        Self(codec)
    }

    pub(crate) fn get(&self) -> &dyn BinarySerializable {
        self.0.as_ref()
    }
}

impl fmt::Debug for CustomCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomCodec(..)")
    }
}

impl PartialEq for CustomCodec {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

/// Metadata handed to custom codecs.
#[derive(Debug, Clone, Copy)]
pub struct SerializationContext<'a> {
    type_name: &'a str,
    member: Option<&'a MemberDescriptor>,
    parent_type: Option<&'a str>,
    depth: usize,
}

impl<'a> SerializationContext<'a> {
    pub(crate) fn new(
        type_name: &'a str,
        member: Option<&'a MemberDescriptor>,
        parent_type: Option<&'a str>,
        depth: usize,
    ) -> Self {
        Self {
            type_name,
            member,
            parent_type,
            depth,
        }
    }

    /// Type being encoded (runtime type for objects, wire type otherwise).
    pub fn type_name(&self) -> &'a str {
        self.type_name
    }

    /// Full metadata of the member, `None` at the root.
    pub fn member(&self) -> Option<&'a MemberDescriptor> {
        self.member
    }

    pub fn member_name(&self) -> Option<&'a str> {
        self.member.map(|m| m.name.as_str())
    }

    /// Member annotations, unchanged from the descriptor.
    pub fn annotations(&self) -> &'a [Annotation] {
        self.member.map_or(&[], |m| m.annotations.as_slice())
    }

    /// First annotation named `name`.
    pub fn annotation(&self, name: &str) -> Option<&'a Annotation> {
        self.annotations().iter().find(|a| a.name == name)
    }

    /// Runtime type of the enclosing object.
    pub fn parent_type(&self) -> Option<&'a str> {
        self.parent_type
    }

    /// Nesting depth (0 = root).
    pub fn depth(&self) -> usize {
        self.depth
    }
}
