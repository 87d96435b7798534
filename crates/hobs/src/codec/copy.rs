// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Deep copy: a write-side and a read-side codec wired back to back
//! through the in-memory byte queue instead of a network channel.

use std::sync::Arc;

use crate::channel::byte_queue;
use crate::types::{ObjRef, TypeRegistry};

use super::reader::GraphReader;
use super::writer::GraphWriter;
use super::{CodecError, CodecResult};

/// Structurally copy a graph, preserving sharing and cycles.
///
/// Graph objects are single-thread shared (`Rc`), so the writer drains
/// fully into the queue before the reader starts; the byte path is the
/// same as a two-thread pipe.
pub fn deep_copy(registry: &Arc<TypeRegistry>, obj: &ObjRef) -> CodecResult<ObjRef> {
    let (queue_writer, queue_reader) = byte_queue();

    let mut writer = GraphWriter::new(Arc::clone(registry), queue_writer)?;
    writer.write_object(Some(obj))?;
    writer.flush()?;
    // Dropping the writer closes the queue; the reader sees EOF after the
    // last byte.
    drop(writer);

    let mut reader = GraphReader::new(Arc::clone(registry), queue_reader)?;
    reader.read_object()?.ok_or_else(|| CodecError::Corrupt {
        reason: "deep copy produced a null graph".to_string(),
    })
}
