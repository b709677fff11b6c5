// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layout construction and validation.
//!
//! Turns descriptors into type nodes. A type's layout is its base chain's
//! members followed by its own, each level sorted by field order.

use super::node::{CollectionTypeNode, ObjectTypeNode, TypeNode, TypeNodeKind};
use super::subtype::SubtypeEntry;
use crate::descriptor::{
    LengthBinding, MemberDescriptor, PrimitiveKind, StringEncoding, TypeDescriptor, TypeRef,
    TypeRegistry,
};
use crate::error::SchemaError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Root node for `type_name`.
pub(crate) fn root_node(
    registry: &dyn TypeRegistry,
    type_name: &str,
) -> Result<TypeNode, SchemaError> {
    if registry.lookup(type_name).is_none() {
        return Err(SchemaError::UnknownType(type_name.to_string()));
    }
    let object = ObjectTypeNode::new(type_name, type_name, None)?;
    Ok(TypeNode::new(type_name, None, TypeNodeKind::Object(object)))
}

/// Build the layout of `type_name`, base members first.
pub(crate) fn build_entry(
    registry: &dyn TypeRegistry,
    type_name: &str,
) -> Result<SubtypeEntry, SchemaError> {
    let leaf = registry
        .lookup(type_name)
        .ok_or_else(|| SchemaError::UnknownType(type_name.to_string()))?;
    let chain = inheritance_chain(registry, &leaf)?;

    let mut children: Vec<Arc<TypeNode>> = Vec::new();
    let mut read_only = Vec::new();
    for desc in chain.iter().rev() {
        for member in own_members(registry, desc)? {
            if children.iter().any(|c| c.name() == member.name) {
                return Err(SchemaError::InvalidMember {
                    type_name: desc.name.clone(),
                    member: member.name.clone(),
                    reason: "redeclares an inherited member".into(),
                });
            }
            if !member.settable {
                read_only.push(member.name.clone());
            }
            children.push(Arc::new(member_node(&desc.name, member)?));
        }
    }

    check_computed_conditions(&leaf.name, &children)?;
    check_unbounded_members(&leaf.name, &children)?;

    for constructor in &leaf.constructors {
        for param in &constructor.parameters {
            if !children.iter().any(|c| c.name() == param) {
                return Err(SchemaError::InvalidMember {
                    type_name: leaf.name.clone(),
                    member: param.clone(),
                    reason: "constructor parameter names no serialized member".into(),
                });
            }
        }
    }

    Ok(SubtypeEntry {
        type_name: leaf.name.clone(),
        children,
        constructors: leaf.constructors.clone(),
        read_only,
        is_abstract: leaf.is_abstract,
        codec: leaf.codec.clone(),
    })
}

/// `leaf` followed by its bases, most derived first.
fn inheritance_chain(
    registry: &dyn TypeRegistry,
    leaf: &Arc<TypeDescriptor>,
) -> Result<Vec<Arc<TypeDescriptor>>, SchemaError> {
    let mut visited = HashSet::from([leaf.name.clone()]);
    let mut chain = vec![Arc::clone(leaf)];
    let mut next = leaf.base.clone();
    while let Some(base) = next {
        if !visited.insert(base.clone()) {
            return Err(SchemaError::InheritanceCycle(base));
        }
        let desc = registry
            .lookup(&base)
            .ok_or_else(|| SchemaError::UnknownType(base.clone()))?;
        next = desc.base.clone();
        chain.push(desc);
    }
    Ok(chain)
}

/// Serializable members declared by `desc` itself, validated and sorted.
fn own_members<'d>(
    registry: &dyn TypeRegistry,
    desc: &'d TypeDescriptor,
) -> Result<Vec<&'d MemberDescriptor>, SchemaError> {
    let mut members: Vec<&MemberDescriptor> = desc.serializable_members().collect();

    if members.len() > 1 {
        let mut seen: HashMap<i32, &str> = HashMap::new();
        for member in &members {
            let order = member.order.ok_or_else(|| SchemaError::MissingOrder {
                type_name: desc.name.clone(),
                member: member.name.clone(),
            })?;
            if let Some(first) = seen.insert(order, &member.name) {
                return Err(SchemaError::DuplicateOrder {
                    type_name: desc.name.clone(),
                    order,
                    first: first.to_string(),
                    second: member.name.clone(),
                });
            }
        }
        members.sort_by_key(|m| m.order);
    }

    for member in &members {
        validate_member(registry, desc, member)?;
    }
    check_binding_cycles(desc, &members)?;
    Ok(members)
}

fn validate_member(
    registry: &dyn TypeRegistry,
    desc: &TypeDescriptor,
    member: &MemberDescriptor,
) -> Result<(), SchemaError> {
    let invalid = |reason: &str| SchemaError::InvalidMember {
        type_name: desc.name.clone(),
        member: member.name.clone(),
        reason: reason.to_string(),
    };

    if (member.count.is_some() || member.item_length.is_some()) && !member.type_ref.is_collection()
    {
        return Err(invalid("count and item-length bindings require a collection"));
    }
    if member.subtypes.is_some() && !matches!(member.type_ref, TypeRef::Named(_)) {
        return Err(invalid("subtype bindings require a named object type"));
    }
    if member.serialize_as.is_some() && !matches!(member.type_ref, TypeRef::Primitive(_)) {
        return Err(invalid("serialize_as requires a primitive member"));
    }

    let mut type_ref = &member.type_ref;
    loop {
        match type_ref {
            TypeRef::Primitive(_) => break,
            TypeRef::Named(name) => {
                if registry.lookup(name).is_none() {
                    return Err(SchemaError::UnknownType(name.clone()));
                }
                break;
            }
            TypeRef::Collection(element) => type_ref = element,
        }
    }
    Ok(())
}

/// Two-way bindings of `member` to siblings.
fn sibling_sources(member: &MemberDescriptor) -> impl Iterator<Item = &str> {
    member
        .binding_sources()
        .filter(|s| s.is_two_way() && s.is_sibling())
        .map(|s| s.path[0].as_str())
}

/// Reject sibling bindings that depend on each other.
fn check_binding_cycles(
    desc: &TypeDescriptor,
    members: &[&MemberDescriptor],
) -> Result<(), SchemaError> {
    let edges: HashMap<&str, Vec<&str>> = members
        .iter()
        .map(|m| (m.name.as_str(), sibling_sources(m).collect()))
        .collect();

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'n>(
        node: &'n str,
        edges: &HashMap<&'n str, Vec<&'n str>>,
        marks: &mut HashMap<&'n str, Mark>,
        stack: &mut Vec<&'n str>,
    ) -> Option<String> {
        match marks.get(node) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<&str> = stack[start..].to_vec();
                cycle.push(node);
                return Some(cycle.join(" -> "));
            }
            None => {}
        }
        marks.insert(node, Mark::Visiting);
        stack.push(node);
        for next in edges.get(node).into_iter().flatten() {
            if let Some(cycle) = visit(next, edges, marks, stack) {
                return Some(cycle);
            }
        }
        stack.pop();
        marks.insert(node, Mark::Done);
        None
    }

    let mut marks = HashMap::new();
    for member in members {
        let mut stack = Vec::new();
        if let Some(cycle) = visit(&member.name, &edges, &mut marks, &mut stack) {
            return Err(SchemaError::CyclicBinding {
                type_name: desc.name.clone(),
                cycle,
            });
        }
    }
    Ok(())
}

/// Reject conditions that read a sibling the writer computes.
///
/// Conditions are evaluated before two-way sources are assigned.
fn check_computed_conditions(type_name: &str, children: &[Arc<TypeNode>]) -> Result<(), SchemaError> {
    let members: Vec<&MemberDescriptor> = children.iter().filter_map(|c| c.member()).collect();
    let computed: HashSet<&str> = members
        .iter()
        .flat_map(|m| {
            sibling_sources(m).chain(
                m.subtypes
                    .iter()
                    .filter(|s| s.source.is_two_way() && s.source.is_sibling())
                    .map(|s| s.source.path[0].as_str()),
            )
        })
        .collect();

    for &member in &members {
        let source = member
            .conditions
            .iter()
            .map(|c| &c.source)
            .find(|s| s.is_sibling() && computed.contains(s.path[0].as_str()));
        if let Some(source) = source {
            return Err(SchemaError::InvalidMember {
                type_name: type_name.to_string(),
                member: member.name.clone(),
                reason: format!("condition reads '{source}', which the writer computes"),
            });
        }
    }
    Ok(())
}

/// Check if a value of `type_ref` without a bound reads to the end of its
/// region.
fn reads_to_end(type_ref: &TypeRef, serialize_as: Option<PrimitiveKind>) -> bool {
    match type_ref {
        TypeRef::Primitive(kind) => matches!(
            serialize_as.unwrap_or(*kind),
            PrimitiveKind::Bytes | PrimitiveKind::String(StringEncoding::Sized)
        ),
        TypeRef::Collection(_) => true,
        TypeRef::Named(_) => false,
    }
}

/// Reject members whose decoding would swallow the members after them.
///
/// Raw bytes, sized strings and uncounted collections read until their
/// region ends; without a length they must come last. Items of that kind
/// always need an item length.
fn check_unbounded_members(type_name: &str, children: &[Arc<TypeNode>]) -> Result<(), SchemaError> {
    let members: Vec<&MemberDescriptor> = children.iter().filter_map(|c| c.member()).collect();
    let invalid = |member: &MemberDescriptor, reason: String| SchemaError::InvalidMember {
        type_name: type_name.to_string(),
        member: member.name.clone(),
        reason,
    };
    // A collection source yields one length per item, which also fixes the count.
    let per_item = |member: &MemberDescriptor| match &member.item_length {
        Some(LengthBinding::Source(s)) if s.is_sibling() => members
            .iter()
            .any(|m| m.name == s.path[0] && m.type_ref.is_collection()),
        _ => false,
    };

    for (index, &member) in members.iter().enumerate() {
        if member.codec.is_some() {
            continue;
        }
        if let TypeRef::Collection(element) = &member.type_ref {
            if member.item_length.is_none() && reads_to_end(element, None) {
                return Err(invalid(
                    member,
                    "items read to the end of the region and need an item length".into(),
                ));
            }
        }

        let unbounded = member.length.is_none()
            && match &member.type_ref {
                TypeRef::Collection(_) => member.count.is_none() && !per_item(member),
                other => reads_to_end(other, member.serialize_as),
            };
        if let (true, Some(next)) = (unbounded, members.get(index + 1)) {
            return Err(invalid(
                member,
                format!("reads to the end of the region but is followed by '{}'", next.name),
            ));
        }
    }
    Ok(())
}

fn member_node(owner: &str, member: &MemberDescriptor) -> Result<TypeNode, SchemaError> {
    let path = format!("{owner}.{}", member.name);
    let kind = match (&member.codec, &member.type_ref) {
        (Some(codec), _) => TypeNodeKind::Custom(codec.clone()),
        (None, type_ref) => match type_ref {
            TypeRef::Named(name) => TypeNodeKind::Object(ObjectTypeNode::new(
                name,
                &path,
                member.subtypes.clone(),
            )?),
            other => element_kind(other, &path)?,
        },
    };
    Ok(TypeNode::new(
        member.name.clone(),
        Some(Arc::new(member.clone())),
        kind,
    ))
}

fn element_kind(type_ref: &TypeRef, path: &str) -> Result<TypeNodeKind, SchemaError> {
    Ok(match type_ref {
        TypeRef::Primitive(kind) => TypeNodeKind::Primitive(*kind),
        TypeRef::Named(name) => TypeNodeKind::Object(ObjectTypeNode::new(name, path, None)?),
        TypeRef::Collection(element) => {
            let kind = element_kind(element, path)?;
            TypeNodeKind::Collection(CollectionTypeNode::new(TypeNode::new("item", None, kind)))
        }
    })
}
