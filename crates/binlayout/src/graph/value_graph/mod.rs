// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-call value graph.
//!
//! An arena of [`ValueNode`]s mirroring the type graph for one concrete
//! instance. Nodes are pushed parent-first, so arena order is a pre-order
//! walk. The graph lives for a single serialize/deserialize call.

mod decode;
mod encode;

pub(crate) use decode::GraphDecoder;
pub(crate) use encode::GraphEncoder;

use crate::descriptor::{Endianness, MemberDescriptor};
use crate::graph::type_graph::{SubtypeEntry, TypeNode, TypeNodeKind};
use crate::value::{ObjectValue, Value};
use std::borrow::Cow;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

/// Arena index of a value node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(usize);

/// Lifecycle of a value node within one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeState {
    Pending,
    ResolvingBindings,
    Encoding,
    Decoding,
    Done,
}

#[derive(Debug)]
pub(crate) struct ValueNode<'a> {
    pub type_node: Arc<TypeNode>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Leaf value: borrowed from the instance on encode, owned on decode or
    /// when computed by a binding.
    pub value: Option<Cow<'a, Value>>,
    /// Runtime layout of object nodes.
    pub entry: Option<Arc<SubtypeEntry>>,
    pub state: NodeState,
    /// Conditional member whose conditions did not hold.
    pub excluded: bool,
    /// Value was assigned by a two-way binding.
    pub computed: bool,
    pub endianness: Endianness,
    pub depth: usize,
}

impl ValueNode<'_> {
    pub fn name(&self) -> &str {
        self.type_node.name()
    }

    pub fn member(&self) -> Option<&MemberDescriptor> {
        self.type_node.member()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_deref()
    }

    pub fn is_object(&self) -> bool {
        matches!(self.type_node.kind(), TypeNodeKind::Object(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.type_node.kind(), TypeNodeKind::Collection(_))
    }

    /// Runtime type name of an object node.
    pub fn runtime_type(&self) -> Option<&str> {
        self.entry.as_ref().map(|e| e.type_name.as_str())
    }
}

#[derive(Debug)]
pub(crate) struct ValueGraph<'a> {
    nodes: Vec<ValueNode<'a>>,
    decoding: bool,
}

impl<'a> ValueGraph<'a> {
    pub fn for_encode() -> Self {
        Self {
            nodes: Vec::new(),
            decoding: false,
        }
    }

    pub fn for_decode() -> Self {
        Self {
            nodes: Vec::new(),
            decoding: true,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Id of the `index`-th pushed node.
    pub fn id(&self, index: usize) -> Option<NodeId> {
        (index < self.nodes.len()).then_some(NodeId(index))
    }

    /// Append a node, linking it under `parent`.
    pub fn push(
        &mut self,
        type_node: Arc<TypeNode>,
        parent: Option<NodeId>,
        endianness: Endianness,
    ) -> NodeId {
        let depth = parent.map_or(0, |p| self[p].depth + 1);
        let id = NodeId(self.nodes.len());
        self.nodes.push(ValueNode {
            type_node,
            parent,
            children: Vec::new(),
            value: None,
            entry: None,
            state: NodeState::Pending,
            excluded: false,
            computed: false,
            endianness,
            depth,
        });
        if let Some(p) = parent {
            self[p].children.push(id);
        }
        id
    }

    /// Nearest object strictly above `id`, skipping collections.
    pub fn scope_object(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self[id].parent;
        while let Some(node) = current {
            if self[node].is_object() {
                return Some(node);
            }
            current = self[node].parent;
        }
        None
    }

    pub fn child_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self[id]
            .children
            .iter()
            .copied()
            .find(|c| self[*c].name() == name)
    }

    /// `id` followed by its ancestors up to the root.
    fn lineage(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        let mut current = self[id].parent;
        while let Some(node) = current {
            out.push(node);
            current = self[node].parent;
        }
        out
    }

    /// Lowest common ancestor of `a` and `b` with the children of it that
    /// lead to each. `None` when one node contains the other.
    pub fn lca_children(&self, a: NodeId, b: NodeId) -> Option<(NodeId, NodeId, NodeId)> {
        let mut path_a = self.lineage(a);
        let mut path_b = self.lineage(b);
        path_a.reverse();
        path_b.reverse();
        let shared = path_a
            .iter()
            .zip(&path_b)
            .take_while(|(x, y)| x == y)
            .count();
        if shared == 0 || shared == path_a.len() || shared == path_b.len() {
            return None;
        }
        Some((path_a[shared - 1], path_a[shared], path_b[shared]))
    }

    /// Check if `id` or one of its ancestors is excluded.
    pub fn is_excluded(&self, id: NodeId) -> bool {
        self.lineage(id).into_iter().any(|n| self[n].excluded)
    }

    /// Check if a binding may read `id` now.
    pub fn is_readable(&self, id: NodeId) -> bool {
        !self.is_excluded(id) && (!self.decoding || self[id].state == NodeState::Done)
    }

    /// Member path for messages, e.g. `Packet.items[2].name`.
    pub fn path_name(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(parent) = self[current].parent {
            if self[parent].is_collection() {
                let index = self[parent]
                    .children
                    .iter()
                    .position(|c| *c == current)
                    .unwrap_or(0);
                segments.push(format!("[{index}]"));
            } else {
                segments.push(format!(".{}", self[current].name()));
            }
            current = parent;
        }
        segments.push(self[current].name().to_string());
        segments.reverse();
        segments.concat()
    }

    /// Copy of the value under `id`.
    pub fn snapshot(&self, id: NodeId) -> Value {
        let node = &self[id];
        if let Some(value) = node.value() {
            return value.clone();
        }
        match node.type_node.kind() {
            TypeNodeKind::Object(obj) => {
                let mut object =
                    ObjectValue::new(node.runtime_type().unwrap_or(obj.declared()));
                for child in &node.children {
                    if !self[*child].excluded {
                        object.set(self[*child].name(), self.snapshot(*child));
                    }
                }
                Value::Object(object)
            }
            TypeNodeKind::Collection(_) => {
                Value::List(node.children.iter().map(|c| self.snapshot(*c)).collect())
            }
            _ => Value::Null,
        }
    }

    /// Move the value under `id` out of the graph.
    pub fn into_value(mut self, id: NodeId) -> Value {
        self.take(id)
    }

    fn take(&mut self, id: NodeId) -> Value {
        if let Some(value) = self[id].value.take() {
            return value.into_owned();
        }
        let children = std::mem::take(&mut self[id].children);
        let type_node = Arc::clone(&self[id].type_node);
        match type_node.kind() {
            TypeNodeKind::Object(obj) => {
                let type_name = self[id]
                    .runtime_type()
                    .unwrap_or(obj.declared())
                    .to_string();
                let mut object = ObjectValue::new(type_name);
                for child in children {
                    if self[child].excluded {
                        continue;
                    }
                    let name = self[child].name().to_string();
                    let value = self.take(child);
                    object.set(name, value);
                }
                Value::Object(object)
            }
            TypeNodeKind::Collection(_) => {
                Value::List(children.into_iter().map(|c| self.take(c)).collect())
            }
            _ => Value::Null,
        }
    }
}

impl<'a> Index<NodeId> for ValueGraph<'a> {
    type Output = ValueNode<'a>;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for ValueGraph<'_> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        &mut self.nodes[id.0]
    }
}
