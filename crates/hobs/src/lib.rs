// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # HOBS - High-performance Object-graph Binary Serialization
//!
//! The serialization core of a distributed-computing middleware: arbitrary
//! in-memory object graphs, including cycles and shared references, encoded
//! into a compact binary wire format and back, without a reflective walk on
//! every call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hobs::{deep_copy, GraphReader, GraphWriter, Text, TypeRegistry};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(TypeRegistry::new());
//!
//!     // Write a graph into a byte vector...
//!     let greeting: hobs::ObjRef = Rc::new(RefCell::new(Text("hello".into())));
//!     let mut writer = GraphWriter::new(Arc::clone(&registry), Vec::new())?;
//!     writer.write_object(Some(&greeting))?;
//!     let bytes = writer.into_inner()?;
//!
//!     // ...and read it back.
//!     let mut reader = GraphReader::new(Arc::clone(&registry), &bytes[..])?;
//!     let copy = reader.read_object()?;
//!
//!     // Or copy in one step through the in-memory queue.
//!     let clone = deep_copy(&registry, &greeting)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |                        Graph Codec                            |
//! |  GraphWriter/GraphReader - handle & type-table wire protocol  |
//! +---------------------------------------------------------------+
//! |   Type Descriptor Registry    |    Identity Handle Table      |
//! |   per-type cached strategy    |    O(1) duplicate detection   |
//! +---------------------------------------------------------------+
//! |                       Binary Channel                          |
//! |   buffered, endianness-aware primitive and array encoding     |
//! +---------------------------------------------------------------+
//! |              std::io::Read / std::io::Write                   |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`GraphWriter`] | Serializes object graphs over any byte sink |
//! | [`GraphReader`] | Reconstructs object graphs from any byte source |
//! | [`TypeRegistry`] | Process-wide cache of per-type descriptors |
//! | [`TypeMeta`] | Declared metadata a participating type publishes |
//! | [`ChannelWriter`] / [`ChannelReader`] | Buffered primitive codec |
//!
//! ## Modules Overview
//!
//! - [`codec`] - the handle/type-table graph protocol (start here)
//! - [`types`] - descriptor registry and declared metadata
//! - [`handles`] - wire handle constants and the identity table
//! - [`channel`] - buffered binary channel and the in-memory byte queue
//! - [`config`] - tunable sizes, single source of truth

/// Buffered binary channel over byte sinks/sources.
pub mod channel;
/// Graph codec: handle/type-table wire protocol.
pub mod codec;
/// Global configuration (buffer and table sizes).
pub mod config;
/// Handle constants and the write-side identity table.
pub mod handles;
/// Type descriptor registry and declared type metadata.
pub mod types;

pub use channel::{byte_queue, ByteOrder, ChannelError, ChannelReader, ChannelWriter};
pub use codec::{
    deep_copy, CodecCounters, CodecError, CodecResult, GraphRead, GraphReader, GraphWrite,
    GraphWriter,
};
pub use types::{
    downcast, downcast_mut, type_id_of, ArrayKind, BaseSpec, BoolArray, CharArray, CustomCodec,
    DescriptorError, EnumMeta, F32Array, F64Array, FastCodec, FieldAccessError, FieldKind,
    FieldSpec, I16Array, I32Array, I64Array, I8Array, MetaKind, ObjRef, Portable, RefArray,
    RegistryStats, Strategy, StructMeta, Text, TypeDescriptor, TypeMeta, TypeRegistry, TypeValue,
    Value,
};

/// HOBS version string.
pub const VERSION: &str = "0.3.1";
