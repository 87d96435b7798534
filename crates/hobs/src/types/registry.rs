// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide descriptor cache with name lookup.
//!
//! `describe` is idempotent and safe to call concurrently: lookups are
//! lock-free-ish read-locked hits, a miss builds outside the write lock
//! and publication is single-writer (first build wins, losers adopt the
//! published descriptor). A descriptor, once published, is immutable and
//! shared without synchronization.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use super::builtins;
use super::descriptor::TypeDescriptor;
use super::meta::{Portable, TypeMeta};
use super::{DescriptorError, DescriptorResult};

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryStats {
    pub hits: u64,
    pub misses: u64,
}

/// Descriptor registry: explicit process-scoped state, shared via `Arc`.
pub struct TypeRegistry {
    cache: RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>,
    by_name: DashMap<&'static str, &'static TypeMeta>,
    stats: RwLock<RegistryStats>,
}

impl TypeRegistry {
    /// Empty registry pre-loaded with the builtin wrapper types.
    pub fn new() -> Self {
        let registry = TypeRegistry {
            cache: RwLock::new(HashMap::new()),
            by_name: DashMap::new(),
            stats: RwLock::new(RegistryStats::default()),
        };
        for meta in builtins::builtin_metas() {
            registry.by_name.insert(meta.name, meta);
        }
        registry
    }

    /// Make a type resolvable by its wire name on the read side.
    ///
    /// Idempotent for the same type; registering a different type under an
    /// already-taken name is an error.
    pub fn register(&self, meta: &'static TypeMeta) -> DescriptorResult<()> {
        use dashmap::mapref::entry::Entry;
        match self.by_name.entry(meta.name) {
            Entry::Occupied(entry) => {
                if entry.get().id() == meta.id() {
                    Ok(())
                } else {
                    Err(DescriptorError::DuplicateName {
                        name: meta.name.to_string(),
                    })
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(meta);
                Ok(())
            }
        }
    }

    /// Resolve (building and caching on first encounter) the descriptor
    /// for declared metadata. Also registers the name for read-side
    /// resolution.
    pub fn describe(&self, meta: &'static TypeMeta) -> DescriptorResult<Arc<TypeDescriptor>> {
        self.describe_inner(meta, &mut Vec::new())
    }

    /// Descriptor for a live object.
    pub fn describe_value(&self, obj: &dyn Portable) -> DescriptorResult<Arc<TypeDescriptor>> {
        self.describe(obj.meta())
    }

    /// Resolve a fully-qualified wire name received from a peer.
    pub fn lookup_name(&self, name: &str) -> DescriptorResult<Arc<TypeDescriptor>> {
        let meta = self
            .by_name
            .get(name)
            .map(|entry| *entry.value())
            .ok_or_else(|| DescriptorError::NotRegistered {
                name: name.to_string(),
            })?;
        self.describe(meta)
    }

    pub fn stats(&self) -> RegistryStats {
        *self.stats.read()
    }

    /// Test-visible reset: drops cached descriptors and statistics while
    /// keeping name registrations.
    pub fn reset(&self) {
        self.cache.write().clear();
        *self.stats.write() = RegistryStats::default();
    }

    pub(crate) fn describe_inner(
        &self,
        meta: &'static TypeMeta,
        visiting: &mut Vec<TypeId>,
    ) -> DescriptorResult<Arc<TypeDescriptor>> {
        let type_id = meta.id();
        if let Some(hit) = self.cache.read().get(&type_id) {
            self.stats.write().hits += 1;
            return Ok(Arc::clone(hit));
        }

        if visiting.contains(&type_id) {
            return Err(DescriptorError::Introspection {
                name: meta.name.to_string(),
                reason: "cyclic base-type declaration".to_string(),
            });
        }

        visiting.push(type_id);
        let built = TypeDescriptor::build(meta, self, visiting);
        visiting.pop();
        let built = Arc::new(built?);

        self.register(meta)?;
        log::debug!("[registry] described {} as {:?}", meta.name, built.strategy);

        let mut cache = self.cache.write();
        let published = cache.entry(type_id).or_insert(built);
        let published = Arc::clone(published);
        drop(cache);
        self.stats.write().misses += 1;
        Ok(published)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
