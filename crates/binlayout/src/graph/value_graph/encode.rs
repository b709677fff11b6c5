// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value graph encoder.
//!
//! Encoding runs in four passes over one arena:
//!
//! 1. build value nodes over the instance (missing primitives get defaults)
//! 2. evaluate member conditions
//! 3. collect two-way binding dependencies: a source is encoded after the
//!    member it measures, ordered among the children of their lowest common
//!    ancestor
//! 4. encode depth-first into per-node buffers and concatenate children in
//!    declared order
//!
//! Nothing reaches the caller's stream until the whole root buffer exists.

use super::{NodeId, NodeState, ValueGraph};
use crate::codec::{primitive, CustomCodec, SerializationContext};
use crate::config::SerializerConfig;
use crate::descriptor::{Endianness, LengthBinding, TypeRegistry};
use crate::error::{BindingError, Error, Result};
use crate::graph::binding::{self, Computed, ItemLengths};
use crate::graph::type_graph::{ObjectTypeNode, TypeNode, TypeNodeKind};
use crate::value::Value;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

static NULL: Value = Value::Null;

/// Byte budget of one encoded node.
#[derive(Debug, Clone, Copy)]
enum Sizing {
    /// Self-delimiting.
    Unbounded,
    /// Padded to exactly this many bytes; longer data fails.
    Fixed(u64),
    /// Delimited by a binding; the length is stored in the source.
    Measured(NodeId),
    /// Delimited by the caller, which measures the bytes itself.
    Bounded,
}

pub(crate) struct GraphEncoder<'a, 'g> {
    graph: ValueGraph<'a>,
    registry: &'g dyn TypeRegistry,
    config: &'g SerializerConfig,
    /// Ordering edges `(before, after)` keyed by the common parent.
    deps: HashMap<NodeId, Vec<(NodeId, NodeId)>>,
}

impl<'a, 'g> GraphEncoder<'a, 'g> {
    pub fn new(registry: &'g dyn TypeRegistry, config: &'g SerializerConfig) -> Self {
        Self {
            graph: ValueGraph::for_encode(),
            registry,
            config,
            deps: HashMap::new(),
        }
    }

    /// Encode `value` laid out by `root`.
    pub fn encode(
        mut self,
        root: Arc<TypeNode>,
        value: &'a Value,
        endianness: Endianness,
    ) -> Result<Vec<u8>> {
        let root = self.build(root, None, Some(value), endianness)?;
        self.apply_conditions()?;
        self.collect_dependencies()?;
        log::trace!(
            "[encode] value graph: {} nodes, {} ordered scopes",
            self.graph.len(),
            self.deps.len()
        );
        self.encode_node(root, None)
    }

    // ========================================================================
    // Pass 1: graph construction
    // ========================================================================

    fn build(
        &mut self,
        type_node: Arc<TypeNode>,
        parent: Option<NodeId>,
        value: Option<&'a Value>,
        inherited: Endianness,
    ) -> Result<NodeId> {
        let endianness = type_node
            .member()
            .and_then(|m| m.endianness)
            .unwrap_or(inherited);
        let id = self.graph.push(Arc::clone(&type_node), parent, endianness);
        if self.graph[id].depth > self.config.max_depth {
            return Err(Error::LimitExceeded {
                what: "depth",
                limit: self.config.max_depth,
            });
        }

        let value = value.filter(|v| !v.is_null());
        match type_node.kind() {
            TypeNodeKind::Primitive(kind) => {
                self.graph[id].value = Some(match value {
                    Some(v) => Cow::Borrowed(v),
                    None => Cow::Owned(kind.default_value()),
                });
            }
            TypeNodeKind::Custom(_) => {
                self.graph[id].value = value.map(Cow::Borrowed);
            }
            TypeNodeKind::Collection(col) => match value {
                None => {}
                Some(Value::List(items)) => {
                    for item in items {
                        self.build(Arc::clone(col.element()), Some(id), Some(item), endianness)?;
                    }
                }
                Some(other) => {
                    return Err(Error::value(
                        self.graph.path_name(id),
                        format!("expected list, found {}", other.kind_name()),
                    ))
                }
            },
            TypeNodeKind::Object(obj) => match value {
                // Checked once conditions are known.
                None => {}
                Some(v) => {
                    let Some(instance) = v.as_object() else {
                        return Err(Error::value(
                            self.graph.path_name(id),
                            format!("expected object, found {}", v.kind_name()),
                        ));
                    };
                    let entry = obj
                        .subtypes()
                        .get_subtype(self.registry, instance.type_name())?;
                    self.graph[id].value = Some(Cow::Borrowed(v));
                    self.graph[id].entry = Some(Arc::clone(&entry));
                    if entry.codec.is_none() {
                        for child in &entry.children {
                            let field = instance.get(child.name());
                            self.build(Arc::clone(child), Some(id), field, endianness)?;
                        }
                    }
                }
            },
        }
        Ok(id)
    }

    // ========================================================================
    // Pass 2: conditions
    // ========================================================================

    /// Nodes assigned by two-way bindings in pass 4.
    fn computed_sources(&self) -> HashSet<NodeId> {
        let mut computed = HashSet::new();
        for index in 0..self.graph.len() {
            let Some(id) = self.graph.id(index) else {
                break;
            };
            let Some(member) = self.graph[id].type_node.member() else {
                continue;
            };
            let discriminator = member.subtypes.as_ref().map(|s| &s.source);
            for source in member.binding_sources().chain(discriminator).filter(|s| s.is_two_way()) {
                // Unresolvable sources are reported by pass 3.
                if let Ok(source_id) = binding::resolve(&self.graph, id, source) {
                    computed.insert(source_id);
                }
            }
        }
        computed
    }

    fn apply_conditions(&mut self) -> Result<()> {
        let computed = self.computed_sources();
        for index in 0..self.graph.len() {
            let Some(id) = self.graph.id(index) else {
                break;
            };
            if self.graph.is_excluded(id) {
                continue;
            }
            let type_node = Arc::clone(&self.graph[id].type_node);
            if let Some(member) = type_node.member() {
                let reads_computed = member.conditions.iter().any(|c| {
                    binding::resolve(&self.graph, id, &c.source)
                        .is_ok_and(|source| computed.contains(&source))
                });
                if reads_computed {
                    return Err(BindingError::CyclicDependency {
                        member: self.graph.path_name(id),
                    }
                    .into());
                }
                if !binding::condition_holds(&self.graph, id, &member.conditions)? {
                    log::trace!("[encode] '{}' excluded by condition", self.graph.path_name(id));
                    self.graph[id].excluded = true;
                    continue;
                }
            }
            if self.graph[id].is_object() && self.graph[id].value.is_none() {
                return Err(BindingError::MissingValue {
                    member: self.graph.path_name(id),
                }
                .into());
            }
        }
        Ok(())
    }

    // ========================================================================
    // Pass 3: binding dependencies
    // ========================================================================

    fn collect_dependencies(&mut self) -> Result<()> {
        for index in 0..self.graph.len() {
            let Some(id) = self.graph.id(index) else {
                break;
            };
            if self.graph.is_excluded(id) {
                continue;
            }
            let type_node = Arc::clone(&self.graph[id].type_node);
            let Some(member) = type_node.member() else {
                continue;
            };
            for source in member.binding_sources().filter(|s| s.is_two_way()) {
                let source_id = binding::resolve(&self.graph, id, source)?;
                if self.graph.is_excluded(source_id) {
                    return Err(BindingError::Unresolved {
                        member: self.graph.path_name(id),
                        path: source.to_string(),
                    }
                    .into());
                }
                match self.graph.lca_children(id, source_id) {
                    Some((scope, before, after)) => {
                        self.deps.entry(scope).or_default().push((before, after));
                    }
                    None => {
                        return Err(BindingError::CyclicDependency {
                            member: self.graph.path_name(id),
                        }
                        .into())
                    }
                }
            }
        }
        Ok(())
    }

    /// Child indices of `parent` in encoding order: dependencies first,
    /// otherwise declared order.
    fn encoding_order(&self, parent: NodeId, children: &[NodeId]) -> Result<Vec<usize>> {
        let Some(edges) = self.deps.get(&parent) else {
            return Ok((0..children.len()).collect());
        };
        let position: HashMap<NodeId, usize> =
            children.iter().enumerate().map(|(i, c)| (*c, i)).collect();

        let mut indegree = vec![0usize; children.len()];
        let mut outgoing = vec![Vec::new(); children.len()];
        for (before, after) in edges {
            if let (Some(&b), Some(&a)) = (position.get(before), position.get(after)) {
                outgoing[b].push(a);
                indegree[a] += 1;
            }
        }

        let mut ready: BTreeSet<usize> = (0..children.len()).filter(|i| indegree[*i] == 0).collect();
        let mut order = Vec::with_capacity(children.len());
        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &after in &outgoing[next] {
                indegree[after] -= 1;
                if indegree[after] == 0 {
                    ready.insert(after);
                }
            }
        }
        if order.len() != children.len() {
            return Err(BindingError::CyclicDependency {
                member: self.graph.path_name(parent),
            }
            .into());
        }
        Ok(order)
    }

    // ========================================================================
    // Pass 4: encoding
    // ========================================================================

    fn encode_node(&mut self, id: NodeId, sizing: Option<Sizing>) -> Result<Vec<u8>> {
        let type_node = Arc::clone(&self.graph[id].type_node);
        self.graph[id].state = NodeState::ResolvingBindings;

        let sizing = match sizing {
            Some(sizing) => sizing,
            None => match type_node.member().and_then(|m| m.length.as_ref()) {
                None => Sizing::Unbounded,
                Some(LengthBinding::Constant(n)) => Sizing::Fixed(*n),
                Some(LengthBinding::Source(s)) if s.is_two_way() => {
                    Sizing::Measured(binding::resolve(&self.graph, id, s)?)
                }
                Some(LengthBinding::Source(s)) => {
                    Sizing::Fixed(binding::bound_u64(&self.graph, id, s)?)
                }
            },
        };

        self.graph[id].state = NodeState::Encoding;
        let bounded = !matches!(sizing, Sizing::Unbounded);
        let mut bytes = self.encode_content(id, &type_node, bounded)?;

        match sizing {
            Sizing::Fixed(expected) => {
                let actual = bytes.len() as u64;
                if actual > expected {
                    return Err(BindingError::LengthMismatch {
                        member: self.graph.path_name(id),
                        expected,
                        actual,
                    }
                    .into());
                }
                let padded = usize::try_from(expected).map_err(|_| {
                    Error::value(self.graph.path_name(id), format!("length {expected} is not addressable"))
                })?;
                bytes.resize(padded, 0);
            }
            Sizing::Measured(source) => {
                binding::assign(&mut self.graph, id, source, Computed::Length(bytes.len() as u64))?;
            }
            Sizing::Unbounded | Sizing::Bounded => {}
        }

        self.graph[id].state = NodeState::Done;
        Ok(bytes)
    }

    fn encode_content(&mut self, id: NodeId, type_node: &TypeNode, bounded: bool) -> Result<Vec<u8>> {
        match type_node.kind() {
            TypeNodeKind::Primitive(_) => {
                let node = &self.graph[id];
                let wire = type_node.wire_kind().ok_or_else(|| {
                    Error::value(self.graph.path_name(id), "primitive node without a wire kind")
                })?;
                let mut out = Vec::new();
                primitive::encode(
                    &mut out,
                    wire,
                    node.value().unwrap_or(&NULL),
                    node.endianness,
                    bounded,
                    &self.graph.path_name(id),
                )?;
                Ok(out)
            }
            TypeNodeKind::Custom(codec) => self.run_codec(id, codec, type_node.type_label()),
            TypeNodeKind::Object(obj) => self.encode_object(id, obj),
            TypeNodeKind::Collection(_) => self.encode_collection(id, type_node),
        }
    }

    fn run_codec(&self, id: NodeId, codec: &CustomCodec, type_name: &str) -> Result<Vec<u8>> {
        let node = &self.graph[id];
        let parent_type = self
            .graph
            .scope_object(id)
            .and_then(|p| self.graph[p].runtime_type());
        let context = SerializationContext::new(type_name, node.member(), parent_type, node.depth);
        let mut out = Vec::new();
        codec
            .get()
            .serialize(node.value().unwrap_or(&NULL), &mut out, node.endianness, &context)?;
        Ok(out)
    }

    fn encode_object(&mut self, id: NodeId, obj: &ObjectTypeNode) -> Result<Vec<u8>> {
        let entry = self.graph[id].entry.clone().ok_or_else(|| BindingError::MissingValue {
            member: self.graph.path_name(id),
        })?;

        match obj.subtypes().binding() {
            Some(subtypes) if subtypes.source.is_two_way() => {
                let key = obj.subtypes().keys().key_for(&entry.type_name).ok_or_else(|| {
                    BindingError::UnmappedSubtype {
                        member: self.graph.path_name(id),
                        type_name: entry.type_name.clone(),
                    }
                })?;
                let source = binding::resolve(&self.graph, id, &subtypes.source)?;
                binding::assign(&mut self.graph, id, source, Computed::Key(key))?;
            }
            Some(_) => {}
            None if entry.type_name != obj.declared() => {
                log::debug!(
                    "[encode] '{}' holds '{}' without a subtype binding; it decodes as '{}'",
                    self.graph.path_name(id),
                    entry.type_name,
                    obj.declared()
                );
            }
            None => {}
        }

        if let Some(codec) = &entry.codec {
            return self.run_codec(id, codec, &entry.type_name);
        }
        let children = self.graph[id].children.clone();
        Ok(self.encode_children(id, &children, |_| None)?.concat())
    }

    fn encode_collection(&mut self, id: NodeId, type_node: &TypeNode) -> Result<Vec<u8>> {
        let children = self.graph[id].children.clone();
        let Some(member) = type_node.member() else {
            return Ok(self.encode_children(id, &children, |_| None)?.concat());
        };

        if let Some(count) = &member.count {
            let actual = children.len() as u64;
            match count {
                LengthBinding::Source(s) if s.is_two_way() => {
                    let source = binding::resolve(&self.graph, id, s)?;
                    binding::assign(&mut self.graph, id, source, Computed::Length(actual))?;
                }
                other => {
                    let expected = binding::length_value(&self.graph, id, other)?;
                    if expected != actual {
                        return Err(BindingError::CountMismatch {
                            member: self.graph.path_name(id),
                            expected,
                            actual,
                        }
                        .into());
                    }
                }
            }
        }

        let parts = match &member.item_length {
            None => self.encode_children(id, &children, |_| None)?,
            Some(LengthBinding::Source(s)) if s.is_two_way() => {
                let source = binding::resolve(&self.graph, id, s)?;
                let parts = self.encode_children(id, &children, |_| Some(Sizing::Bounded))?;
                let lengths: Vec<u64> = parts.iter().map(|p| p.len() as u64).collect();
                if self.graph[source].is_collection() {
                    binding::assign_lengths(&mut self.graph, id, source, &lengths)?;
                } else {
                    let first = lengths.first().copied().unwrap_or(0);
                    if let Some((index, other)) =
                        lengths.iter().enumerate().find(|(_, len)| **len != first)
                    {
                        return Err(BindingError::ItemLengthMismatch {
                            member: self.graph.path_name(id),
                            first,
                            index,
                            other: *other,
                        }
                        .into());
                    }
                    binding::assign(&mut self.graph, id, source, Computed::Length(first))?;
                }
                parts
            }
            Some(other) => match binding::item_lengths(&self.graph, id, other)? {
                ItemLengths::Uniform(n) => {
                    self.encode_children(id, &children, |_| Some(Sizing::Fixed(n)))?
                }
                ItemLengths::PerItem(lengths) => {
                    if lengths.len() != children.len() {
                        return Err(BindingError::CountMismatch {
                            member: self.graph.path_name(id),
                            expected: lengths.len() as u64,
                            actual: children.len() as u64,
                        }
                        .into());
                    }
                    self.encode_children(id, &children, |i| lengths.get(i).copied().map(Sizing::Fixed))?
                }
            },
        };
        Ok(parts.concat())
    }

    /// Encode `children` of `parent` in dependency order; returns one buffer
    /// per child in declared order (empty for excluded members).
    fn encode_children(
        &mut self,
        parent: NodeId,
        children: &[NodeId],
        sizing: impl Fn(usize) -> Option<Sizing>,
    ) -> Result<Vec<Vec<u8>>> {
        let order = self.encoding_order(parent, children)?;
        let mut parts = vec![Vec::new(); children.len()];
        for index in order {
            let child = children[index];
            if self.graph[child].excluded {
                continue;
            }
            parts[index] = self.encode_node(child, sizing(index))?;
        }
        Ok(parts)
    }
}
