// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor lookup.

use crate::config::MAX_INHERITANCE_DEPTH;
use crate::descriptor::TypeDescriptor;
use std::collections::HashMap;
use std::sync::Arc;

/// Source of type descriptors for graph construction.
///
/// Implementations must be cheap to query; the type graph calls `lookup`
/// once per built layout, not per serialized value.
pub trait TypeRegistry: Send + Sync {
    /// Look up a type by name.
    fn lookup(&self, name: &str) -> Option<Arc<TypeDescriptor>>;

    /// Check if `runtime` is `declared` or derives from it.
    fn is_assignable(&self, runtime: &str, declared: &str) -> bool {
        let mut current = runtime.to_string();
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if current == declared {
                return true;
            }
            match self.lookup(&current).and_then(|d| d.base.clone()) {
                Some(base) => current = base,
                None => return false,
            }
        }
        false
    }
}

/// In-memory descriptor table keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct DescriptorTable {
    types: HashMap<String, Arc<TypeDescriptor>>,
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, returning the one it replaces.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Option<Arc<TypeDescriptor>> {
        self.types
            .insert(descriptor.name.clone(), Arc::new(descriptor))
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Registered type names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeRegistry for DescriptorTable {
    fn lookup(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TypeDescriptorBuilder;

    fn table() -> DescriptorTable {
        DescriptorTable::new()
            .with(TypeDescriptorBuilder::new("Shape").abstract_type().build())
            .with(TypeDescriptorBuilder::new("Circle").base("Shape").build())
            .with(TypeDescriptorBuilder::new("Unit").base("Circle").build())
            .with(TypeDescriptorBuilder::new("Other").build())
    }

    #[test]
    fn test_lookup() {
        let table = table();
        assert_eq!(table.len(), 4);
        assert!(table.lookup("Circle").is_some());
        assert!(table.lookup("Missing").is_none());
    }

    #[test]
    fn test_assignable_through_base_chain() {
        let table = table();
        assert!(table.is_assignable("Circle", "Circle"));
        assert!(table.is_assignable("Unit", "Shape"));
        assert!(!table.is_assignable("Shape", "Circle"));
        assert!(!table.is_assignable("Other", "Shape"));
        assert!(!table.is_assignable("Missing", "Shape"));
    }

    #[test]
    fn test_assignable_terminates_on_cycle() {
        let table = DescriptorTable::new()
            .with(TypeDescriptorBuilder::new("A").base("B").build())
            .with(TypeDescriptorBuilder::new("B").base("A").build());
        assert!(!table.is_assignable("A", "C"));
    }

    #[test]
    fn test_register_replaces() {
        let mut table = DescriptorTable::new();
        assert!(table
            .register(TypeDescriptorBuilder::new("T").build())
            .is_none());
        let previous = table.register(TypeDescriptorBuilder::new("T").abstract_type().build());
        assert!(previous.is_some_and(|d| !d.is_abstract));
        assert!(table.lookup("T").is_some_and(|d| d.is_abstract));
    }
}
