// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layout graphs.
//!
//! - [`type_graph`]: per-type layouts, built once and cached
//! - `value_graph`: per-call arena of value nodes walked by the encoder and
//!   decoder
//! - `binding`: resolution of length, count, subtype and condition sources
//!   against a value graph

pub(crate) mod binding;
pub mod type_graph;
pub(crate) mod value_graph;

pub use type_graph::{
    CollectionTypeNode, ObjectTypeNode, SubtypeEntry, SubtypeKeys, SubtypeRegistry, TypeGraph,
    TypeNode, TypeNodeKind,
};
