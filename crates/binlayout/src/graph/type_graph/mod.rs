// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type graph: cached, validated layouts.
//!
//! One root [`TypeNode`] per serialized type, built on first use and shared
//! by every later call. Nested object nodes build their children lazily
//! through their [`SubtypeRegistry`], so recursive types terminate.
//!
//! # Thread Safety
//!
//! Lookups hit the `DashMap` without locking the build path. Builds take
//! `build_lock` and re-check, so each root is built once even under
//! contention. Failed builds are not cached.

mod builder;
mod node;
mod subtype;

pub use node::{CollectionTypeNode, ObjectTypeNode, TypeNode, TypeNodeKind};
pub use subtype::{SubtypeEntry, SubtypeKeys, SubtypeRegistry};

use crate::descriptor::TypeRegistry;
use crate::error::{Result, SchemaError};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cache of root layouts keyed by type name.
pub struct TypeGraph {
    registry: Arc<dyn TypeRegistry>,
    roots: DashMap<String, Arc<TypeNode>>,
    build_lock: Mutex<()>,
}

impl TypeGraph {
    pub fn new(registry: Arc<dyn TypeRegistry>) -> Self {
        Self {
            registry,
            roots: DashMap::new(),
            build_lock: Mutex::new(()),
        }
    }

    /// Descriptor source.
    pub fn registry(&self) -> &dyn TypeRegistry {
        self.registry.as_ref()
    }

    /// Root node for `type_name`, building and validating it on first use.
    pub fn root(&self, type_name: &str) -> Result<Arc<TypeNode>> {
        if let Some(node) = self.roots.get(type_name) {
            return Ok(Arc::clone(node.value()));
        }

        let _guard = self.build_lock.lock();
        if let Some(node) = self.roots.get(type_name) {
            return Ok(Arc::clone(node.value()));
        }

        let node = Arc::new(builder::root_node(self.registry(), type_name)?);
        let object = node
            .as_object()
            .ok_or_else(|| SchemaError::UnknownType(type_name.to_string()))?;
        // Seed the declared layout so schema errors surface here.
        object.subtypes().get_subtype(self.registry(), type_name)?;

        self.roots.insert(type_name.to_string(), Arc::clone(&node));
        log::debug!("[type-graph] built root layout for '{}'", type_name);
        Ok(node)
    }

    /// Check if a root is cached.
    pub fn contains(&self, type_name: &str) -> bool {
        self.roots.contains_key(type_name)
    }

    /// Number of cached roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Drop all cached layouts.
    pub fn clear(&self) {
        let _guard = self.build_lock.lock();
        self.roots.clear();
    }
}

impl std::fmt::Debug for TypeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeGraph")
            .field("roots", &self.roots.len())
            .finish_non_exhaustive()
    }
}
