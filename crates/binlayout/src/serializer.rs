// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializer entry points.
//!
//! [`BinarySerializer`] owns the [`TypeGraph`] cache and the live
//! [`SerializerConfig`]. It is `Send + Sync`; share one instance (behind an
//! `Arc`) across threads so layouts are built once.
//!
//! # Example
//!
//! ```
//! use binlayout::{
//!     BinarySerializer, DescriptorTable, MemberDescriptor, ObjectValue, PrimitiveKind,
//!     TypeDescriptorBuilder, TypeRef, Value,
//! };
//!
//! let table = DescriptorTable::new().with(
//!     TypeDescriptorBuilder::new("Greeting")
//!         .field("len", 0, PrimitiveKind::U8)
//!         .member(
//!             MemberDescriptor::new("text", TypeRef::string())
//!                 .with_order(1)
//!                 .with_length(binlayout::BindingSource::sibling("len")),
//!         )
//!         .build(),
//! );
//! let serializer = BinarySerializer::new(table);
//!
//! let value = Value::Object(ObjectValue::new("Greeting").with("text", "hi"));
//! let bytes = serializer.to_bytes(&value)?;
//! assert_eq!(bytes, [2, b'h', b'i']);
//!
//! let decoded = serializer.from_bytes("Greeting", &bytes)?;
//! assert_eq!(decoded.as_object().and_then(|o| o.get("len")), Some(&Value::U8(2)));
//! # Ok::<(), binlayout::Error>(())
//! ```

use crate::config::SerializerConfig;
use crate::descriptor::{Endianness, TypeRegistry};
use crate::error::{Error, Result};
use crate::graph::value_graph::{GraphDecoder, GraphEncoder};
use crate::graph::TypeGraph;
use crate::value::Value;
use arc_swap::ArcSwap;
use std::io::{Read, Write};
use std::sync::Arc;

/// Declarative binary serializer.
pub struct BinarySerializer {
    graph: TypeGraph,
    config: ArcSwap<SerializerConfig>,
}

impl BinarySerializer {
    /// Create a serializer over `registry` with the default configuration.
    pub fn new(registry: impl TypeRegistry + 'static) -> Self {
        Self::from_registry(Arc::new(registry))
    }

    /// Create a serializer over a shared registry.
    pub fn from_registry(registry: Arc<dyn TypeRegistry>) -> Self {
        Self {
            graph: TypeGraph::new(registry),
            config: ArcSwap::from_pointee(SerializerConfig::default()),
        }
    }

    /// Builder-style configuration.
    #[must_use]
    pub fn with_config(self, config: SerializerConfig) -> Self {
        self.config.store(Arc::new(config));
        self
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<SerializerConfig> {
        self.config.load_full()
    }

    /// Replace the configuration. Calls already running keep their snapshot.
    pub fn set_config(&self, config: SerializerConfig) {
        log::debug!(
            "[serializer] config updated: endianness={:?} max_depth={} max_collection_count={}",
            config.endianness,
            config.max_depth,
            config.max_collection_count
        );
        self.config.store(Arc::new(config));
    }

    /// Cached layouts.
    pub fn type_graph(&self) -> &TypeGraph {
        &self.graph
    }

    // ========================================================================
    // Serialize
    // ========================================================================

    /// Serialize `value` using the configured byte order.
    pub fn serialize(&self, value: &Value, stream: &mut dyn Write) -> Result<()> {
        let endianness = self.config.load().endianness;
        self.serialize_with(value, stream, endianness)
    }

    /// Serialize `value` with an explicit default byte order.
    ///
    /// The root must be an object; its runtime type selects the layout.
    /// Nothing is written to `stream` unless encoding succeeds.
    pub fn serialize_with(
        &self,
        value: &Value,
        stream: &mut dyn Write,
        endianness: Endianness,
    ) -> Result<()> {
        let bytes = self.encode(value, endianness)?;
        stream.write_all(&bytes)?;
        Ok(())
    }

    /// Serialize `value` into a new buffer.
    pub fn to_bytes(&self, value: &Value) -> Result<Vec<u8>> {
        let endianness = self.config.load().endianness;
        self.encode(value, endianness)
    }

    fn encode(&self, value: &Value, endianness: Endianness) -> Result<Vec<u8>> {
        let object = value.as_object().ok_or_else(|| {
            Error::value(
                "<root>",
                format!("expected an object, found {}", value.kind_name()),
            )
        })?;
        let root = self.graph.root(object.type_name())?;
        let config = self.config.load_full();
        let bytes = GraphEncoder::new(self.graph.registry(), &config).encode(root, value, endianness)?;
        log::trace!(
            "[serializer] encoded '{}' into {} bytes",
            object.type_name(),
            bytes.len()
        );
        Ok(bytes)
    }

    // ========================================================================
    // Deserialize
    // ========================================================================

    /// Deserialize one `type_name` value using the configured byte order.
    pub fn deserialize(&self, type_name: &str, stream: &mut dyn Read) -> Result<Value> {
        let endianness = self.config.load().endianness;
        self.deserialize_with(type_name, stream, endianness)
    }

    /// Deserialize one `type_name` value with an explicit default byte order.
    ///
    /// Bytes after the value are left in `stream` (up to one byte may have
    /// been peeked when the layout reads to end of stream).
    pub fn deserialize_with(
        &self,
        type_name: &str,
        stream: &mut dyn Read,
        endianness: Endianness,
    ) -> Result<Value> {
        let root = self.graph.root(type_name)?;
        let config = self.config.load_full();
        GraphDecoder::new(stream, self.graph.registry(), &config).decode(root, endianness)
    }

    /// Deserialize one `type_name` value from `bytes`.
    pub fn from_bytes(&self, type_name: &str, bytes: &[u8]) -> Result<Value> {
        let mut cursor = bytes;
        self.deserialize(type_name, &mut cursor)
    }
}

impl std::fmt::Debug for BinarySerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinarySerializer")
            .field("graph", &self.graph)
            .field("config", &self.config.load())
            .finish()
    }
}
