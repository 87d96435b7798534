// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HOBS Global Configuration - Single Source of Truth
//!
//! This module centralizes the tunable sizes of the serialization core.
//! **NEVER hardcode elsewhere!**
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Compile-time defaults (buffer capacity, table sizes)
//! - **Level 2 (Dynamic)**: Environment overrides (`HOBS_BUFFER_SIZE`,
//!   `HOBS_TABLE_SIZE`), clamped to safe ranges at first use.

// =======================================================================
// Binary Channel
// =======================================================================

/// Default capacity of the channel's internal byte buffer.
///
/// Array requests at least this large bypass buffering entirely.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Smallest accepted buffer capacity.
///
/// Must hold at least one 8-byte primitive plus headroom; smaller values
/// from the environment are clamped up to this.
pub const MIN_BUFFER_SIZE: usize = 64;

// =======================================================================
// Identity Handle Table
// =======================================================================

/// Initial bucket count of the identity handle table (power of two).
pub const DEFAULT_TABLE_SIZE: usize = 1024;

/// Initial length of the handle-indexed dense arrays.
pub const DEFAULT_DENSE_SIZE: usize = 1024;

/// Bucket-array doubling threshold: grow once `population > buckets * factor`.
pub const DEFAULT_FILL_FACTOR: f32 = 1.0;

// =======================================================================
// Wire sanity limits
// =======================================================================

/// Upper bound accepted for a length-prefixed text payload (type names,
/// strings, enum variant names). Anything above this is treated as
/// protocol corruption rather than an allocation request.
pub const MAX_TEXT_BYTES: usize = 1 << 30;

/// Channel buffer capacity: `HOBS_BUFFER_SIZE` env override, clamped to
/// [`MIN_BUFFER_SIZE`], falling back to [`DEFAULT_BUFFER_SIZE`].
pub fn buffer_size() -> usize {
    match std::env::var("HOBS_BUFFER_SIZE") {
        Ok(v) => match v.parse::<usize>() {
            Ok(n) => n.max(MIN_BUFFER_SIZE),
            Err(_) => {
                log::warn!("[config] HOBS_BUFFER_SIZE={} is not a number, using default", v);
                DEFAULT_BUFFER_SIZE
            }
        },
        Err(_) => DEFAULT_BUFFER_SIZE,
    }
}

/// Identity table initial bucket count: `HOBS_TABLE_SIZE` env override,
/// rounded up to a power of two, falling back to [`DEFAULT_TABLE_SIZE`].
pub fn table_size() -> usize {
    match std::env::var("HOBS_TABLE_SIZE") {
        Ok(v) => match v.parse::<usize>() {
            Ok(n) => n.max(16).next_power_of_two(),
            Err(_) => {
                log::warn!("[config] HOBS_TABLE_SIZE={} is not a number, using default", v);
                DEFAULT_TABLE_SIZE
            }
        },
        Err(_) => DEFAULT_TABLE_SIZE,
    }
}
