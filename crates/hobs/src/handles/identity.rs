// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Write-side identity handle table.
//!
//! An open-chained hash table keyed by object identity, answering "have I
//! already written this exact object" in O(1) before a new handle is
//! minted. The handle-indexed dense arrays double as the write-side
//! handle-to-object table, so one structure serves both roles.

use crate::config;
use crate::types::ObjRef;

use super::{identity_addr, mix_identity, CONTROL_HANDLES};

/// Identity-keyed handle table.
///
/// Layout: `buckets[hash & mask]` holds the most recently inserted handle
/// for that hash, `next[handle]` chains to the previous handle with the
/// same bucket, and `objs[handle]` pins the object assigned that handle.
/// The bucket array doubles on fill-factor overflow; the dense arrays grow
/// independently whenever a handle lands at or beyond their length.
pub struct IdentityTable {
    buckets: Vec<i32>,
    next: Vec<i32>,
    objs: Vec<Option<ObjRef>>,
    population: usize,
    /// One past the highest handle inserted; bounds clear and rehash scans.
    high: usize,
    initial_buckets: usize,
    initial_dense: usize,
    fill_factor: f32,
    grown: bool,
}

impl IdentityTable {
    pub fn new() -> Self {
        Self::with_capacity(
            config::table_size(),
            config::DEFAULT_DENSE_SIZE,
            config::DEFAULT_FILL_FACTOR,
        )
    }

    /// Table with explicit initial sizes; `buckets` is rounded up to a
    /// power of two.
    pub fn with_capacity(buckets: usize, dense: usize, fill_factor: f32) -> Self {
        let buckets = buckets.max(16).next_power_of_two();
        let dense = dense.max(16);
        IdentityTable {
            buckets: vec![0; buckets],
            next: vec![0; dense],
            objs: vec![None; dense],
            population: 0,
            high: CONTROL_HANDLES as usize,
            initial_buckets: buckets,
            initial_dense: dense,
            fill_factor,
            grown: false,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.population
    }

    pub fn is_empty(&self) -> bool {
        self.population == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Handle previously assigned to this exact object instance, if any.
    pub fn find(&self, obj: &ObjRef) -> Option<i32> {
        let addr = identity_addr(obj);
        let mut cur = self.buckets[self.bucket_of(addr)];
        while cur != 0 {
            let idx = cur as usize;
            if let Some(existing) = &self.objs[idx] {
                if identity_addr(existing) == addr {
                    return Some(cur);
                }
            }
            cur = self.next[idx];
        }
        None
    }

    /// Record `handle` for this object identity.
    pub fn insert(&mut self, obj: &ObjRef, handle: i32) {
        debug_assert!(handle >= CONTROL_HANDLES, "reserved handle range");
        let idx = handle as usize;
        self.ensure_dense(idx);
        let bucket = self.bucket_of(identity_addr(obj));
        self.objs[idx] = Some(obj.clone());
        self.next[idx] = self.buckets[bucket];
        self.buckets[bucket] = handle;
        self.population += 1;
        self.high = self.high.max(idx + 1);
        if self.population as f32 > self.buckets.len() as f32 * self.fill_factor {
            self.grow_buckets();
        }
    }

    /// Object assigned a handle, write-side table role.
    pub fn get(&self, handle: i32) -> Option<&ObjRef> {
        self.objs.get(handle as usize)?.as_ref()
    }

    /// Drop all entries.
    ///
    /// While the table has not grown past its initial sizes the live
    /// prefix is zeroed in place; after growth everything is reallocated
    /// at the initial sizes instead of zeroing large arrays.
    pub fn clear(&mut self) {
        if self.grown {
            self.buckets = vec![0; self.initial_buckets];
            self.next = vec![0; self.initial_dense];
            self.objs = vec![None; self.initial_dense];
            self.grown = false;
        } else {
            self.buckets.fill(0);
            for idx in (CONTROL_HANDLES as usize)..self.high {
                self.next[idx] = 0;
                self.objs[idx] = None;
            }
        }
        self.population = 0;
        self.high = CONTROL_HANDLES as usize;
    }

    fn bucket_of(&self, addr: usize) -> usize {
        (mix_identity(addr) as usize) & (self.buckets.len() - 1)
    }

    fn ensure_dense(&mut self, idx: usize) {
        if idx < self.objs.len() {
            return;
        }
        let new_len = (self.objs.len() * 2).max(idx + 1);
        log::debug!("[handles] dense arrays {} -> {}", self.objs.len(), new_len);
        self.next.resize(new_len, 0);
        self.objs.resize(new_len, None);
        self.grown = true;
    }

    fn grow_buckets(&mut self) {
        let new_size = self.buckets.len() * 2;
        log::debug!("[handles] rehash {} -> {} buckets", self.buckets.len(), new_size);
        let mask = new_size - 1;
        let mut new_buckets = vec![0i32; new_size];
        for idx in (CONTROL_HANDLES as usize)..self.high {
            if let Some(obj) = &self.objs[idx] {
                let bucket = (mix_identity(identity_addr(obj)) as usize) & mask;
                self.next[idx] = new_buckets[bucket];
                new_buckets[bucket] = idx as i32;
            }
        }
        self.buckets = new_buckets;
        self.grown = true;
    }
}

impl Default for IdentityTable {
    fn default() -> Self {
        Self::new()
    }
}
