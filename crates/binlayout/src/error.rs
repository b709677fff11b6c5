// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for layout construction and stream traversal.
//!
//! Failures fall into four families:
//!
//! - [`SchemaError`]: a type's layout cannot be built (missing or duplicate
//!   field order, cyclic bindings, unknown types). Detected once, at first
//!   graph build.
//! - [`BindingError`]: a length/count/subtype binding cannot be resolved
//!   against a concrete value graph, or resolves to an inconsistent value.
//! - Stream failures: [`Error::UnexpectedEof`] and [`Error::Io`].
//! - [`ConstructionError`]: no compatible constructor for a decoded object.
//!
//! Every failure surfaces to the caller of `serialize`/`deserialize`.
//! Nothing is retried or swallowed inside the engine.

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for serialize/deserialize calls.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Layout / binding failures
    // ========================================================================
    /// Type graph could not be built.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    /// Binding could not be resolved against the value graph.
    #[error("binding error: {0}")]
    Binding(#[from] BindingError),
    /// Decoded object could not be instantiated.
    #[error("construction error: {0}")]
    Construction(#[from] ConstructionError),

    // ========================================================================
    // Stream failures
    // ========================================================================
    /// Stream (or bounded region) ended before the expected data.
    #[error("unexpected end of stream at offset {offset} ({needed} more bytes needed)")]
    UnexpectedEof {
        /// Absolute stream offset where the read started.
        offset: u64,
        /// Bytes that could not be read.
        needed: u64,
    },
    /// Underlying stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ========================================================================
    // Data failures
    // ========================================================================
    /// Instance value does not fit the member's declared shape.
    #[error("invalid value for '{member}': {reason}")]
    Value {
        /// Member path (e.g. `Packet.header.length`).
        member: String,
        /// What was wrong.
        reason: String,
    },
    /// A custom codec reported a failure.
    #[error("custom codec for '{type_name}' failed: {reason}")]
    Codec {
        /// Type or member handled by the codec.
        type_name: String,
        /// Codec-provided message.
        reason: String,
    },
    /// A configured safety limit was hit.
    #[error("{what} limit of {limit} exceeded")]
    LimitExceeded {
        /// Which limit (`depth`, `collection count`).
        what: &'static str,
        /// Configured limit.
        limit: usize,
    },
}

impl Error {
    /// Build a [`Error::Codec`] from anything displayable.
    pub fn codec(type_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Codec {
            type_name: type_name.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn value(member: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Value {
            member: member.into(),
            reason: reason.into(),
        }
    }
}

/// Layout construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Type name not present in the descriptor table.
    #[error("type '{0}' is not registered")]
    UnknownType(String),
    /// A member of a multi-member type has no field order.
    #[error(
        "'{member}' in '{type_name}' does not have a field order; all serializable members \
         of a type with more than one member must specify one"
    )]
    MissingOrder {
        /// Declaring type.
        type_name: String,
        /// Member without order.
        member: String,
    },
    /// Two members of the same type share a field order.
    #[error("'{first}' and '{second}' in '{type_name}' share field order {order}; orders must be unique")]
    DuplicateOrder {
        /// Declaring type.
        type_name: String,
        /// Repeated order value.
        order: i32,
        /// First member with the order.
        first: String,
        /// Second member with the order.
        second: String,
    },
    /// Sibling bindings form a cycle.
    #[error("cyclic binding in '{type_name}': {cycle}")]
    CyclicBinding {
        /// Declaring type.
        type_name: String,
        /// Members on the cycle, `a -> b -> a`.
        cycle: String,
    },
    /// Base-type chain loops back on itself.
    #[error("inheritance cycle through '{0}'")]
    InheritanceCycle(String),
    /// A declared subtype does not derive from the member's type.
    #[error("subtype '{subtype}' does not derive from '{base}'")]
    NotASubtype {
        /// Declared subtype.
        subtype: String,
        /// Member's declared type.
        base: String,
    },
    /// Member metadata is inconsistent with the member's type.
    #[error("'{member}' in '{type_name}': {reason}")]
    InvalidMember {
        /// Declaring type.
        type_name: String,
        /// Offending member.
        member: String,
        /// What is inconsistent.
        reason: String,
    },
}

/// Binding resolution failures, raised per call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// Binding path names no member.
    #[error("binding source '{path}' of '{member}' not found")]
    SourceNotFound {
        /// Bound member.
        member: String,
        /// Binding path.
        path: String,
    },
    /// Source exists in the layout but has not been read yet.
    #[error("binding source '{path}' of '{member}' is not available yet; sources must precede their targets")]
    Unresolved {
        /// Bound member.
        member: String,
        /// Binding path.
        path: String,
    },
    /// Source value cannot be used as a length/count/key.
    #[error("binding source '{path}' of '{member}' holds a {found}, expected {expected}")]
    InvalidSource {
        /// Bound member.
        member: String,
        /// Binding path.
        path: String,
        /// What the binding needs.
        expected: &'static str,
        /// What the source holds.
        found: &'static str,
    },
    /// Encoded length exceeds the bound length.
    #[error("'{member}' is bound to {expected} bytes but encodes to {actual}")]
    LengthMismatch {
        /// Bound member.
        member: String,
        /// Bound length.
        expected: u64,
        /// Encoded length.
        actual: u64,
    },
    /// Collection item count differs from the bound count.
    #[error("'{member}' is bound to {expected} items but holds {actual}")]
    CountMismatch {
        /// Bound member.
        member: String,
        /// Bound count.
        expected: u64,
        /// Actual item count.
        actual: u64,
    },
    /// Items under a shared item-length binding have different sizes.
    #[error("items of '{member}' disagree on length: item 0 is {first} bytes, item {index} is {other}")]
    ItemLengthMismatch {
        /// Bound collection.
        member: String,
        /// Length of the first item.
        first: u64,
        /// Index of the disagreeing item.
        index: usize,
        /// Its length.
        other: u64,
    },
    /// Computed value does not fit the source member's type.
    #[error("value {value} cannot be stored in binding source '{path}' ({kind})")]
    SourceOverflow {
        /// Source path.
        path: String,
        /// Computed value.
        value: u64,
        /// Source wire type.
        kind: &'static str,
    },
    /// Two targets computed different values for the same source.
    #[error("binding source '{path}' assigned both {existing} and {requested}")]
    Conflict {
        /// Source path.
        path: String,
        /// First assignment.
        existing: String,
        /// Second assignment.
        requested: String,
    },
    /// Runtime type has no discriminator under a two-way subtype binding.
    #[error("'{member}' holds '{type_name}', which has no subtype key")]
    UnmappedSubtype {
        /// Polymorphic member.
        member: String,
        /// Runtime type.
        type_name: String,
    },
    /// Discriminator read from the stream maps to no type.
    #[error("'{member}' has no subtype for key {key}")]
    UnknownDiscriminator {
        /// Polymorphic member.
        member: String,
        /// Key read from the stream.
        key: String,
    },
    /// Runtime type is not the declared type nor derived from it.
    #[error("'{member}' is declared as '{declared}' but holds unrelated type '{runtime}'")]
    IncompatibleType {
        /// Member.
        member: String,
        /// Declared type.
        declared: String,
        /// Runtime type.
        runtime: String,
    },
    /// Bindings across composites depend on each other.
    #[error("cyclic binding dependency under '{member}'")]
    CyclicDependency {
        /// Composite where the cycle was detected.
        member: String,
    },
    /// A required member has no value in the instance.
    #[error("'{member}' has no value")]
    MissingValue {
        /// Member path.
        member: String,
    },
}

/// Object instantiation failures during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// Declared abstract; cannot be instantiated.
    #[error("'{0}' is abstract")]
    Abstract(String),
    /// No constructor accepts the decoded members.
    #[error("no compatible constructor for '{type_name}' (decoded members: {members})")]
    NoCompatibleConstructor {
        /// Type being instantiated.
        type_name: String,
        /// Decoded member names.
        members: String,
    },
}
