// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-stream state: type dictionary, read-side object table, counters.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::builtins::seeded_array_metas;
use crate::types::{ObjRef, TypeDescriptor, TypeRegistry};

use super::CodecResult;

/// Append-only, index-addressable type dictionary.
///
/// Index 0 is reserved unused; indices 1..=8 are seeded with the eight
/// primitive array kinds; custom types are allocated sequentially from 9.
/// Writer and reader each hold their own dictionary, but insertions happen
/// in transmission order on both sides, so the sequences are identical.
pub(crate) struct TypeDict {
    entries: Vec<Option<Arc<TypeDescriptor>>>,
    by_id: HashMap<TypeId, i32>,
}

impl TypeDict {
    pub fn seeded(registry: &TypeRegistry) -> CodecResult<TypeDict> {
        let mut dict = TypeDict {
            entries: vec![None],
            by_id: HashMap::new(),
        };
        for meta in seeded_array_metas() {
            let descriptor = registry.describe(meta)?;
            dict.append(descriptor);
        }
        Ok(dict)
    }

    /// Existing index of a type in this stream, if any.
    pub fn find(&self, type_id: TypeId) -> Option<i32> {
        self.by_id.get(&type_id).copied()
    }

    /// Append a not-yet-seen type, returning its new index.
    pub fn append(&mut self, descriptor: Arc<TypeDescriptor>) -> i32 {
        let index = self.entries.len() as i32;
        self.by_id.insert(descriptor.type_id, index);
        self.entries.push(Some(descriptor));
        index
    }

    pub fn get(&self, index: i32) -> Option<Arc<TypeDescriptor>> {
        self.entries.get(index as usize)?.clone()
    }

    /// Index the next appended type will receive.
    pub fn next_index(&self) -> i32 {
        self.entries.len() as i32
    }

    /// Drop everything and reseed the primitive array kinds.
    pub fn reseed(&mut self, registry: &TypeRegistry) -> CodecResult<()> {
        *self = TypeDict::seeded(registry)?;
        Ok(())
    }
}

/// Read-side handle-indexed object table.
///
/// A slot is populated with a placeholder before the object's descendants
/// are read, overwritten once construction completes, and emptied again by
/// an unshared read.
pub(crate) struct ObjectTable {
    slots: Vec<Option<ObjRef>>,
}

impl ObjectTable {
    pub fn new() -> ObjectTable {
        ObjectTable { slots: Vec::new() }
    }

    pub fn get(&self, handle: i32) -> Option<ObjRef> {
        self.slots.get(handle as usize)?.clone()
    }

    pub fn set(&mut self, handle: i32, obj: ObjRef) {
        let index = handle as usize;
        if index >= self.slots.len() {
            let new_len = (self.slots.len() * 2).max(index + 1);
            self.slots.resize(new_len, None);
        }
        self.slots[index] = Some(obj);
    }

    pub fn invalidate(&mut self, handle: i32) {
        if let Some(slot) = self.slots.get_mut(handle as usize) {
            *slot = None;
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Per-codec instrumentation counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodecCounters {
    /// Full object payloads written or read.
    pub objects: u64,
    /// Back-reference handles emitted or resolved.
    pub back_refs: u64,
    /// Types introduced to the stream dictionary.
    pub types_introduced: u64,
    /// Reset/clear control codes handled.
    pub resets: u64,
}
