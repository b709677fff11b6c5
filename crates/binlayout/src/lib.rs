// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # binlayout - declarative binary serialization
//!
//! Describe the on-wire layout of a structure with member metadata (order,
//! fixed or bound lengths, counts, endianness, polymorphic discriminators,
//! custom codecs) and let the engine serialize and deserialize dynamic
//! [`Value`] trees against it.
//!
//! ## Quick Start
//!
//! ```
//! use binlayout::{
//!     BinarySerializer, BindingSource, DescriptorTable, MemberDescriptor, ObjectValue,
//!     PrimitiveKind, TypeDescriptorBuilder, TypeRef, Value,
//! };
//!
//! let table = DescriptorTable::new().with(
//!     TypeDescriptorBuilder::new("Frame")
//!         .field("count", 0, PrimitiveKind::U16)
//!         .member(
//!             MemberDescriptor::new("samples", TypeRef::collection(PrimitiveKind::I16))
//!                 .with_order(1)
//!                 .with_count(BindingSource::sibling("count")),
//!         )
//!         .build(),
//! );
//! let serializer = BinarySerializer::new(table);
//!
//! let frame = Value::Object(
//!     ObjectValue::new("Frame").with("samples", Value::list([-1i16, 2])),
//! );
//! let bytes = serializer.to_bytes(&frame)?;
//! assert_eq!(bytes, [2, 0, 0xff, 0xff, 2, 0]);
//! # Ok::<(), binlayout::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                       BinarySerializer                              |
//! |   serialize / deserialize | live config (ArcSwap)                   |
//! +---------------------------------------------------------------------+
//! |                          Type Graph                                 |
//! |   cached root layouts | per-node subtype registry | validation      |
//! +---------------------------------------------------------------------+
//! |                         Value Graph                                 |
//! |   per-call arena | binding resolver | encode / decode walkers       |
//! +---------------------------------------------------------------------+
//! |                            Codecs                                   |
//! |   primitives | strings | bounded reader | custom codec hook         |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`descriptor`] - member and type metadata, descriptor registries
//! - [`graph`] - type graph cache and subtype registries
//! - [`codec`] - custom codec hook and the bounded stream reader
//! - [`serializer`] - entry points
//! - [`config`] - serializer configuration

pub mod codec;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod graph;
pub mod serializer;
pub mod value;

pub use codec::{BinarySerializable, CustomCodec, SerializationContext};
pub use config::{ConfigError, SerializerConfig};
pub use descriptor::{
    Annotation, BindingMode, BindingSource, Condition, ConstructorDescriptor, DescriptorTable,
    Endianness, LengthBinding, MemberDescriptor, PrimitiveKind, StringEncoding, SubtypeBinding,
    SubtypeCase, SubtypeKey, TypeDescriptor, TypeDescriptorBuilder, TypeRef, TypeRegistry,
};
pub use error::{BindingError, ConstructionError, Error, Result, SchemaError};
pub use graph::TypeGraph;
pub use serializer::BinarySerializer;
pub use value::{FromValue, ObjectValue, Value};
