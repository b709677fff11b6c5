// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-object-node registry of runtime-type layouts.
//!
//! Every object node owns one [`SubtypeRegistry`]. It maps a runtime type
//! name to the [`SubtypeEntry`] describing that type's members in
//! serialization order. Entries are built at most once per node: readers
//! take the `RwLock` fast path, writers serialize on `build_lock` and
//! re-check before building.
//!
//! # Invariants
//!
//! - Entries are append-only; an inserted entry never changes.
//! - The first build seeds the declared type and every declared subtype
//!   case, so bad subtype declarations fail early.
//! - A failed build inserts nothing.

use super::builder;
use super::node::TypeNode;
use crate::codec::CustomCodec;
use crate::descriptor::{ConstructorDescriptor, SubtypeBinding, SubtypeKey, TypeRegistry};
use crate::error::{BindingError, Result, SchemaError};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Layout of one runtime type under an object node.
#[derive(Debug)]
pub struct SubtypeEntry {
    /// Runtime type name.
    pub type_name: String,
    /// Member nodes in serialization order (base members first).
    pub children: Vec<Arc<TypeNode>>,
    /// Declared constructors (empty = implicit parameterless).
    pub constructors: Vec<ConstructorDescriptor>,
    /// Members only a constructor can set.
    pub read_only: Vec<String>,
    pub is_abstract: bool,
    /// Type-level codec.
    pub codec: Option<CustomCodec>,
}

impl SubtypeEntry {
    /// Member node by name.
    pub fn child(&self, name: &str) -> Option<&Arc<TypeNode>> {
        self.children.iter().find(|c| c.name() == name)
    }
}

/// Discriminator tables derived from a [`SubtypeBinding`].
#[derive(Debug, Default)]
pub struct SubtypeKeys {
    by_key: HashMap<SubtypeKey, String>,
    by_type: HashMap<String, SubtypeKey>,
    default: Option<String>,
}

impl SubtypeKeys {
    fn from_binding(member: &str, binding: &SubtypeBinding) -> std::result::Result<Self, SchemaError> {
        let mut keys = Self {
            default: binding.default.clone(),
            ..Self::default()
        };
        for case in &binding.cases {
            if keys
                .by_key
                .insert(case.key.clone(), case.type_name.clone())
                .is_some()
            {
                return Err(SchemaError::InvalidMember {
                    type_name: case.type_name.clone(),
                    member: member.to_string(),
                    reason: format!("subtype key {} is declared twice", case.key),
                });
            }
            // First key wins when a type is listed under several keys.
            keys.by_type
                .entry(case.type_name.clone())
                .or_insert_with(|| case.key.clone());
        }
        Ok(keys)
    }

    /// Key written for `type_name`.
    pub fn key_for(&self, type_name: &str) -> Option<&SubtypeKey> {
        self.by_type.get(type_name)
    }

    /// Type selected by `key`, falling back to the default subtype.
    pub fn type_for(&self, key: &SubtypeKey) -> Option<&str> {
        self.by_key
            .get(key)
            .or(self.default.as_ref())
            .map(String::as_str)
    }
}

/// Runtime-type layouts for one object node.
#[derive(Debug)]
pub struct SubtypeRegistry {
    declared: String,
    member: String,
    binding: Option<SubtypeBinding>,
    keys: SubtypeKeys,
    entries: RwLock<HashMap<String, Arc<SubtypeEntry>>>,
    build_lock: Mutex<()>,
    builds: AtomicUsize,
}

impl SubtypeRegistry {
    pub(crate) fn new(
        declared: &str,
        member: &str,
        binding: Option<SubtypeBinding>,
    ) -> std::result::Result<Self, SchemaError> {
        let keys = match &binding {
            Some(b) => SubtypeKeys::from_binding(member, b)?,
            None => SubtypeKeys::default(),
        };
        Ok(Self {
            declared: declared.to_string(),
            member: member.to_string(),
            binding,
            keys,
            entries: RwLock::new(HashMap::new()),
            build_lock: Mutex::new(()),
            builds: AtomicUsize::new(0),
        })
    }

    /// Declared type of the node.
    pub fn declared(&self) -> &str {
        &self.declared
    }

    /// Subtype binding of the member, if polymorphic.
    pub fn binding(&self) -> Option<&SubtypeBinding> {
        self.binding.as_ref()
    }

    /// Discriminator tables.
    pub fn keys(&self) -> &SubtypeKeys {
        &self.keys
    }

    /// Number of layouts built so far.
    pub fn entry_builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Number of cached layouts.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Layout for `runtime`, building it on first use.
    ///
    /// `runtime` must be the declared type or derive from it.
    pub fn get_subtype(
        &self,
        registry: &dyn TypeRegistry,
        runtime: &str,
    ) -> Result<Arc<SubtypeEntry>> {
        if let Some(entry) = self.entries.read().get(runtime) {
            return Ok(Arc::clone(entry));
        }

        let _guard = self.build_lock.lock();
        if let Some(entry) = self.entries.read().get(runtime) {
            return Ok(Arc::clone(entry));
        }

        let mut fresh = HashMap::new();
        if self.entries.read().is_empty() {
            self.seed(registry, &mut fresh)?;
        }
        if !fresh.contains_key(runtime) {
            if !registry.is_assignable(runtime, &self.declared) {
                if registry.lookup(runtime).is_none() {
                    return Err(SchemaError::UnknownType(runtime.to_string()).into());
                }
                return Err(BindingError::IncompatibleType {
                    member: self.member.clone(),
                    declared: self.declared.clone(),
                    runtime: runtime.to_string(),
                }
                .into());
            }
            fresh.insert(runtime.to_string(), self.build(registry, runtime)?);
        }

        let mut entries = self.entries.write();
        entries.extend(fresh);
        entries
            .get(runtime)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownType(runtime.to_string()).into())
    }

    fn seed(
        &self,
        registry: &dyn TypeRegistry,
        fresh: &mut HashMap<String, Arc<SubtypeEntry>>,
    ) -> Result<()> {
        fresh.insert(self.declared.clone(), self.build(registry, &self.declared)?);

        let Some(binding) = &self.binding else {
            return Ok(());
        };
        let subtypes = binding
            .cases
            .iter()
            .map(|c| c.type_name.as_str())
            .chain(binding.default.as_deref());
        for subtype in subtypes {
            if fresh.contains_key(subtype) {
                continue;
            }
            if registry.lookup(subtype).is_none() {
                return Err(SchemaError::UnknownType(subtype.to_string()).into());
            }
            if !registry.is_assignable(subtype, &self.declared) {
                return Err(SchemaError::NotASubtype {
                    subtype: subtype.to_string(),
                    base: self.declared.clone(),
                }
                .into());
            }
            fresh.insert(subtype.to_string(), self.build(registry, subtype)?);
        }
        log::debug!(
            "[subtypes] seeded '{}' with {} layouts",
            self.member,
            fresh.len()
        );
        Ok(())
    }

    fn build(&self, registry: &dyn TypeRegistry, type_name: &str) -> Result<Arc<SubtypeEntry>> {
        let entry = builder::build_entry(registry, type_name)?;
        self.builds.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "[subtypes] built layout '{}' ({} members) under '{}'",
            type_name,
            entry.children.len(),
            self.member
        );
        Ok(Arc::new(entry))
    }
}
