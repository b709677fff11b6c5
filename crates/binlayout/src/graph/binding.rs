// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binding resolution against a value graph.
//!
//! A binding source is found by starting at the object that declares the
//! bound member, climbing `ancestor` enclosing objects, then following the
//! member path. Readers (decode, one-way bindings, conditions) require the
//! source to hold a value; writers (two-way bindings on encode) assign it.

use super::value_graph::{NodeId, NodeState, ValueGraph};
use crate::codec::primitive;
use crate::descriptor::{BindingSource, Condition, LengthBinding, PrimitiveKind, SubtypeKey};
use crate::error::BindingError;
use crate::value::Value;
use std::borrow::Cow;
use std::sync::Arc;

type Result<T> = std::result::Result<T, BindingError>;

static NULL: Value = Value::Null;

/// Item lengths of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ItemLengths {
    /// Every item has the same length.
    Uniform(u64),
    /// One length per item (source is a collection).
    PerItem(Vec<u64>),
}

/// Locate the source node of `source` for the member at `target`.
pub(crate) fn resolve(graph: &ValueGraph<'_>, target: NodeId, source: &BindingSource) -> Result<NodeId> {
    let not_found = || BindingError::SourceNotFound {
        member: graph.path_name(target),
        path: source.to_string(),
    };

    let mut current = graph.scope_object(target).ok_or_else(not_found)?;
    for _ in 0..source.ancestor {
        current = graph.scope_object(current).ok_or_else(not_found)?;
    }
    for name in &source.path {
        current = match graph.child_by_name(current, name) {
            Some(child) => child,
            None => {
                let declared = graph[current]
                    .entry
                    .as_ref()
                    .is_some_and(|e| e.child(name).is_some());
                return Err(if declared {
                    unresolved(graph, target, source)
                } else {
                    not_found()
                });
            }
        };
    }
    Ok(current)
}

fn unresolved(graph: &ValueGraph<'_>, target: NodeId, source: &BindingSource) -> BindingError {
    BindingError::Unresolved {
        member: graph.path_name(target),
        path: source.to_string(),
    }
}

/// Resolve `source` and borrow its current value.
fn source_value<'g>(
    graph: &'g ValueGraph<'_>,
    target: NodeId,
    source: &BindingSource,
) -> Result<&'g Value> {
    let id = resolve(graph, target, source)?;
    if !graph.is_readable(id) {
        return Err(unresolved(graph, target, source));
    }
    graph[id]
        .value()
        .ok_or_else(|| unresolved(graph, target, source))
}

fn invalid_source(
    graph: &ValueGraph<'_>,
    target: NodeId,
    source: &BindingSource,
    expected: &'static str,
    found: &'static str,
) -> BindingError {
    BindingError::InvalidSource {
        member: graph.path_name(target),
        path: source.to_string(),
        expected,
        found,
    }
}

/// Read a non-negative integer from `source`.
pub(crate) fn bound_u64(graph: &ValueGraph<'_>, target: NodeId, source: &BindingSource) -> Result<u64> {
    let value = source_value(graph, target, source)?;
    value
        .as_u64()
        .ok_or_else(|| invalid_source(graph, target, source, "non-negative integer", value.kind_name()))
}

/// Value of a length or count binding.
pub(crate) fn length_value(graph: &ValueGraph<'_>, target: NodeId, binding: &LengthBinding) -> Result<u64> {
    match binding {
        LengthBinding::Constant(n) => Ok(*n),
        LengthBinding::Source(source) => bound_u64(graph, target, source),
    }
}

/// Value of an item-length binding; a collection source yields one length
/// per item.
pub(crate) fn item_lengths(
    graph: &ValueGraph<'_>,
    target: NodeId,
    binding: &LengthBinding,
) -> Result<ItemLengths> {
    let source = match binding {
        LengthBinding::Constant(n) => return Ok(ItemLengths::Uniform(*n)),
        LengthBinding::Source(source) => source,
    };
    let id = resolve(graph, target, source)?;
    if !graph[id].is_collection() {
        return bound_u64(graph, target, source).map(ItemLengths::Uniform);
    }
    if !graph.is_readable(id) {
        return Err(unresolved(graph, target, source));
    }
    graph[id]
        .children
        .iter()
        .map(|c| {
            let value = graph[*c].value().unwrap_or(&NULL);
            value
                .as_u64()
                .ok_or_else(|| invalid_source(graph, target, source, "non-negative integer", value.kind_name()))
        })
        .collect::<Result<Vec<_>>>()
        .map(ItemLengths::PerItem)
}

/// Discriminator read from `source`.
pub(crate) fn subtype_key(graph: &ValueGraph<'_>, target: NodeId, source: &BindingSource) -> Result<SubtypeKey> {
    let value = source_value(graph, target, source)?;
    SubtypeKey::from_value(value)
        .ok_or_else(|| invalid_source(graph, target, source, "integer or string", value.kind_name()))
}

/// Check if any of `conditions` holds for the member at `target`.
pub(crate) fn condition_holds(graph: &ValueGraph<'_>, target: NodeId, conditions: &[Condition]) -> Result<bool> {
    if conditions.is_empty() {
        return Ok(true);
    }
    for condition in conditions {
        if condition.matches(source_value(graph, target, &condition.source)?) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Writer-computed source value.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Computed<'k> {
    /// Byte length, item count or common item length.
    Length(u64),
    /// Discriminator of the runtime subtype.
    Key(&'k SubtypeKey),
}

/// Store a writer-computed value in the source node.
pub(crate) fn assign(
    graph: &mut ValueGraph<'_>,
    target: NodeId,
    source: NodeId,
    value: Computed<'_>,
) -> Result<()> {
    let path = graph.path_name(source);
    let member = graph.path_name(target);
    let kind = graph[source]
        .type_node
        .primitive()
        .ok_or_else(|| BindingError::InvalidSource {
            member: member.clone(),
            path: path.clone(),
            expected: "primitive member",
            found: graph[source].type_node.kind_name(),
        })?;

    let converted = match value {
        Computed::Length(_) if !kind.is_integer() => {
            return Err(BindingError::InvalidSource {
                member,
                path,
                expected: "integer member",
                found: kind.name(),
            })
        }
        Computed::Length(len) => {
            primitive::integer(kind, i128::from(len)).ok_or(BindingError::SourceOverflow {
                path: path.clone(),
                value: len,
                kind: kind.name(),
            })?
        }
        Computed::Key(SubtypeKey::Int(v)) => match primitive::integer(kind, *v) {
            Some(converted) => converted,
            None => {
                return Err(BindingError::InvalidSource {
                    member,
                    path,
                    expected: "integer member able to hold the subtype key",
                    found: kind.name(),
                })
            }
        },
        Computed::Key(SubtypeKey::Str(s)) if matches!(kind, PrimitiveKind::String(_)) => {
            Value::String(s.clone())
        }
        Computed::Key(SubtypeKey::Str(_)) => {
            return Err(BindingError::InvalidSource {
                member,
                path,
                expected: "string member",
                found: kind.name(),
            })
        }
    };

    let node = &mut graph[source];
    if node.state == NodeState::Done {
        // Source already written; the dependency order was not honoured.
        return Err(BindingError::CyclicDependency { member });
    }
    if node.computed {
        if let Some(existing) = node.value() {
            if !existing.loosely_equals(&converted) {
                return Err(BindingError::Conflict {
                    path,
                    existing: existing.to_string(),
                    requested: converted.to_string(),
                });
            }
        }
    }
    log::trace!("[binding] {} = {} (from {})", path, converted, member);
    node.value = Some(Cow::Owned(converted));
    node.computed = true;
    Ok(())
}

/// Rebuild a collection source with one computed length per item.
pub(crate) fn assign_lengths(
    graph: &mut ValueGraph<'_>,
    target: NodeId,
    source: NodeId,
    lengths: &[u64],
) -> Result<()> {
    let path = graph.path_name(source);
    let member = graph.path_name(target);
    let element = match graph[source].type_node.as_collection() {
        Some(col) => Arc::clone(col.element()),
        None => {
            return Err(BindingError::InvalidSource {
                member,
                path,
                expected: "collection",
                found: graph[source].type_node.kind_name(),
            })
        }
    };
    let kind = element
        .primitive()
        .filter(PrimitiveKind::is_integer)
        .ok_or(BindingError::InvalidSource {
            member: member.clone(),
            path: path.clone(),
            expected: "collection of integers",
            found: "collection",
        })?;

    let values = lengths
        .iter()
        .map(|len| {
            primitive::integer(kind, i128::from(*len)).ok_or(BindingError::SourceOverflow {
                path: path.clone(),
                value: *len,
                kind: kind.name(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if graph[source].state == NodeState::Done {
        return Err(BindingError::CyclicDependency { member });
    }
    if graph[source].computed {
        let existing = graph.snapshot(source);
        let requested = Value::List(values);
        if existing != requested {
            return Err(BindingError::Conflict {
                path,
                existing: existing.to_string(),
                requested: requested.to_string(),
            });
        }
        return Ok(());
    }

    let endianness = graph[source].endianness;
    graph[source].children.clear();
    for value in values {
        let item = graph.push(Arc::clone(&element), Some(source), endianness);
        graph[item].value = Some(Cow::Owned(value));
    }
    graph[source].computed = true;
    log::trace!("[binding] {} = {} item lengths (from {})", path, lengths.len(), member);
    Ok(())
}
