// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value graph decoder.
//!
//! Members are read in declared order. Each node is pushed into the arena
//! just before it is read, so a binding can only see sources that precede
//! it; anything later is reported as unresolved.

use super::{NodeId, NodeState, ValueGraph};
use crate::codec::{primitive, BinaryReader, CustomCodec, SerializationContext};
use crate::config::SerializerConfig;
use crate::descriptor::{Endianness, TypeRegistry};
use crate::error::{BindingError, ConstructionError, Error, Result};
use crate::graph::binding::{self, ItemLengths};
use crate::graph::type_graph::{ObjectTypeNode, SubtypeEntry, TypeNode, TypeNodeKind};
use crate::value::Value;
use std::borrow::Cow;
use std::io::Read;
use std::sync::Arc;

pub(crate) struct GraphDecoder<'r, 'g> {
    graph: ValueGraph<'static>,
    reader: BinaryReader<'r>,
    registry: &'g dyn TypeRegistry,
    config: &'g SerializerConfig,
}

impl<'r, 'g> GraphDecoder<'r, 'g> {
    pub fn new(
        stream: &'r mut dyn Read,
        registry: &'g dyn TypeRegistry,
        config: &'g SerializerConfig,
    ) -> Self {
        Self {
            graph: ValueGraph::for_decode(),
            reader: BinaryReader::new(stream),
            registry,
            config,
        }
    }

    /// Decode one value laid out by `root`.
    pub fn decode(mut self, root: Arc<TypeNode>, endianness: Endianness) -> Result<Value> {
        let id = self.graph.push(root, None, endianness);
        self.decode_node(id, None)?;
        log::trace!(
            "[decode] read {} bytes into {} nodes",
            self.reader.position(),
            self.graph.len()
        );
        Ok(self.graph.into_value(id))
    }

    fn decode_node(&mut self, id: NodeId, item_length: Option<u64>) -> Result<()> {
        if self.graph[id].depth > self.config.max_depth {
            return Err(Error::LimitExceeded {
                what: "depth",
                limit: self.config.max_depth,
            });
        }
        let type_node = Arc::clone(&self.graph[id].type_node);
        self.graph[id].state = NodeState::ResolvingBindings;

        let limit = match (item_length, type_node.member().and_then(|m| m.length.as_ref())) {
            (Some(len), _) => Some(len),
            (None, Some(length)) => Some(binding::length_value(&self.graph, id, length)?),
            (None, None) => None,
        };
        if let Some(len) = limit {
            self.reader.push_limit(len)?;
        }

        self.graph[id].state = NodeState::Decoding;
        let value = self.decode_content(id, &type_node, limit.is_some())?;
        if limit.is_some() {
            self.reader.pop_limit()?;
        }

        let node = &mut self.graph[id];
        node.value = value.map(Cow::Owned);
        node.state = NodeState::Done;
        Ok(())
    }

    /// Leaf value of the node; `None` for structural objects and collections.
    fn decode_content(
        &mut self,
        id: NodeId,
        type_node: &TypeNode,
        bounded: bool,
    ) -> Result<Option<Value>> {
        match type_node.kind() {
            TypeNodeKind::Primitive(declared) => {
                let wire = type_node.wire_kind().unwrap_or(*declared);
                let path = self.graph.path_name(id);
                let value = primitive::decode(
                    &mut self.reader,
                    wire,
                    self.graph[id].endianness,
                    bounded,
                    &path,
                )?;
                if wire == *declared {
                    return Ok(Some(value));
                }
                primitive::coerce(&value, *declared).map(Some).ok_or_else(|| {
                    Error::value(path, format!("{value} does not fit in {}", declared.name()))
                })
            }
            TypeNodeKind::Custom(codec) => self.run_codec(id, codec, type_node.type_label()).map(Some),
            TypeNodeKind::Object(obj) => self.decode_object(id, obj),
            TypeNodeKind::Collection(_) => {
                self.decode_collection(id, type_node)?;
                Ok(None)
            }
        }
    }

    fn run_codec(&mut self, id: NodeId, codec: &CustomCodec, type_name: &str) -> Result<Value> {
        let node = &self.graph[id];
        let parent_type = self
            .graph
            .scope_object(id)
            .and_then(|p| self.graph[p].runtime_type());
        let context = SerializationContext::new(type_name, node.member(), parent_type, node.depth);
        codec
            .get()
            .deserialize(&mut self.reader, node.endianness, &context)
    }

    fn decode_object(&mut self, id: NodeId, obj: &ObjectTypeNode) -> Result<Option<Value>> {
        let runtime = match obj.subtypes().binding() {
            Some(subtypes) => {
                let key = binding::subtype_key(&self.graph, id, &subtypes.source)?;
                obj.subtypes()
                    .keys()
                    .type_for(&key)
                    .ok_or_else(|| BindingError::UnknownDiscriminator {
                        member: self.graph.path_name(id),
                        key: key.to_string(),
                    })?
            }
            None => obj.declared(),
        };
        let entry = obj.subtypes().get_subtype(self.registry, runtime)?;
        self.graph[id].entry = Some(Arc::clone(&entry));

        if let Some(codec) = &entry.codec {
            return self.run_codec(id, codec, &entry.type_name).map(Some);
        }

        let endianness = self.graph[id].endianness;
        let mut present = Vec::with_capacity(entry.children.len());
        for child_type in &entry.children {
            let child_endianness = child_type
                .member()
                .and_then(|m| m.endianness)
                .unwrap_or(endianness);
            let child = self.graph.push(Arc::clone(child_type), Some(id), child_endianness);
            if let Some(member) = child_type.member() {
                if !binding::condition_holds(&self.graph, child, &member.conditions)? {
                    self.graph[child].excluded = true;
                    continue;
                }
            }
            self.decode_node(child, None)?;
            present.push(child_type.name());
        }

        let parameters = select_constructor(&entry, &present)?;
        log::trace!(
            "[decode] '{}' constructed with ({})",
            self.graph.path_name(id),
            parameters.join(", ")
        );
        Ok(None)
    }

    fn decode_collection(&mut self, id: NodeId, type_node: &TypeNode) -> Result<()> {
        let Some(col) = type_node.as_collection() else {
            return Ok(());
        };
        let member = type_node.member();
        let path = || self.graph.path_name(id);

        let count = match member.and_then(|m| m.count.as_ref()) {
            Some(count) => Some(binding::length_value(&self.graph, id, count)?),
            None => None,
        };
        let lengths = match member.and_then(|m| m.item_length.as_ref()) {
            Some(item_length) => Some(binding::item_lengths(&self.graph, id, item_length)?),
            None => None,
        };
        let count = match (&lengths, count) {
            (Some(ItemLengths::PerItem(per_item)), Some(n)) if per_item.len() as u64 != n => {
                return Err(BindingError::CountMismatch {
                    member: path(),
                    expected: n,
                    actual: per_item.len() as u64,
                }
                .into());
            }
            (Some(ItemLengths::PerItem(per_item)), None) => Some(per_item.len() as u64),
            (_, count) => count,
        };
        let item_length = |index: usize| match &lengths {
            None => None,
            Some(ItemLengths::Uniform(n)) => Some(*n),
            Some(ItemLengths::PerItem(per_item)) => per_item.get(index).copied(),
        };

        let max = self.config.max_collection_count;
        let element = Arc::clone(col.element());
        let endianness = self.graph[id].endianness;

        if let Some(count) = count {
            if count > max as u64 {
                return Err(Error::LimitExceeded {
                    what: "collection count",
                    limit: max,
                });
            }
            for index in 0..count as usize {
                let item = self.graph.push(Arc::clone(&element), Some(id), endianness);
                self.decode_node(item, item_length(index))?;
            }
            return Ok(());
        }

        // No count: items run to the end of the bounded region or stream.
        let mut index = 0;
        while !self.reader.at_end()? {
            if index >= max {
                return Err(Error::LimitExceeded {
                    what: "collection count",
                    limit: max,
                });
            }
            let start = self.reader.position();
            let item = self.graph.push(Arc::clone(&element), Some(id), endianness);
            self.decode_node(item, item_length(index))?;
            if self.reader.position() == start {
                return Err(Error::value(
                    self.graph.path_name(item),
                    "collection item consumed no bytes",
                ));
            }
            index += 1;
        }
        Ok(())
    }
}

const NO_PARAMETERS: &[String] = &[];

/// Pick the constructor receiving the most decoded members and return its
/// parameters.
///
/// A candidate may only take members that were decoded, and must take every
/// decoded read-only member. Types without declared constructors have an
/// implicit parameterless one.
fn select_constructor<'e>(
    entry: &'e SubtypeEntry,
    present: &[&str],
) -> std::result::Result<&'e [String], ConstructionError> {
    if entry.is_abstract {
        return Err(ConstructionError::Abstract(entry.type_name.clone()));
    }

    let compatible = |parameters: &[String]| {
        parameters.iter().all(|p| present.contains(&p.as_str()))
            && entry
                .read_only
                .iter()
                .filter(|r| present.contains(&r.as_str()))
                .all(|r| parameters.contains(r))
    };

    let best: Option<&'e [String]> = if entry.constructors.is_empty() {
        Some(NO_PARAMETERS).filter(|p| compatible(p))
    } else {
        entry
            .constructors
            .iter()
            .map(|c| c.parameters.as_slice())
            .filter(|p| compatible(p))
            .max_by_key(|p| p.len())
    };
    best.ok_or_else(|| ConstructionError::NoCompatibleConstructor {
        type_name: entry.type_name.clone(),
        members: present.join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ConstructorDescriptor;

    fn entry(constructors: Vec<ConstructorDescriptor>, read_only: &[&str]) -> SubtypeEntry {
        SubtypeEntry {
            type_name: "Reading".into(),
            children: Vec::new(),
            constructors,
            read_only: read_only.iter().map(|s| s.to_string()).collect(),
            is_abstract: false,
            codec: None,
        }
    }

    #[test]
    fn test_implicit_constructor() {
        let e = entry(Vec::new(), &[]);
        let parameters = select_constructor(&e, &["a", "b"]).unwrap();
        assert!(parameters.is_empty());
    }

    #[test]
    fn test_read_only_needs_constructor() {
        let e = entry(Vec::new(), &["id"]);
        assert!(matches!(
            select_constructor(&e, &["id", "value"]),
            Err(ConstructionError::NoCompatibleConstructor { .. })
        ));
        // Not decoded, so not required.
        assert!(select_constructor(&e, &["value"]).is_ok());
    }

    #[test]
    fn test_widest_compatible_constructor() {
        let e = entry(
            vec![
                ConstructorDescriptor::new(["id"]),
                ConstructorDescriptor::new(["id", "value"]),
                ConstructorDescriptor::new(["id", "value", "missing"]),
            ],
            &["id"],
        );
        let parameters = select_constructor(&e, &["id", "value"]).unwrap();
        assert_eq!(parameters, ["id", "value"]);
    }

    #[test]
    fn test_abstract_rejected() {
        let mut e = entry(Vec::new(), &[]);
        e.is_abstract = true;
        assert_eq!(
            select_constructor(&e, &[]).unwrap_err(),
            ConstructionError::Abstract("Reading".into())
        );
    }
}
