// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Graph codec: the handle/type-table wire protocol.
//!
//! Walks an object graph top-down on write and reconstructs it bottom-up
//! on read. Both sides allocate handles in the same sequence, so a
//! back-reference on the wire maps unambiguously to the right object;
//! cycles terminate because the cycle-forming reference is emitted as a
//! back-reference to an ancestor's handle instead of being walked again.
//!
//! Wire format per object: `handle-or-type-tag` (signed 32-bit), then the
//! type's fully-qualified name if this is its first occurrence in the
//! stream, then the strategy-specific payload.

pub mod copy;
pub mod reader;
pub mod stream;
pub mod writer;

pub use copy::deep_copy;
pub use reader::GraphReader;
pub use stream::CodecCounters;
pub use writer::GraphWriter;

use std::fmt;

use crate::channel::ChannelError;
use crate::types::{DescriptorError, ObjRef};

/// Codec-layer error taxonomy.
///
/// Protocol corruption is always fatal to the current stream: every
/// subsequent handle depends on perfect agreement of prior allocations,
/// so no local repair is attempted.
#[derive(Debug)]
pub enum CodecError {
    // ========================================================================
    // Propagated lower layers
    // ========================================================================
    /// Channel failure, including end-of-stream.
    Channel(ChannelError),
    /// Descriptor construction or name resolution failure.
    Descriptor(DescriptorError),

    // ========================================================================
    // Type errors
    // ========================================================================
    /// The type classified as not-serializable.
    NotSerializable { name: String },
    /// A field accessor refused a read or write.
    FieldAccess {
        type_name: String,
        field: String,
        reason: String,
    },

    // ========================================================================
    // Protocol corruption
    // ========================================================================
    /// Back-reference to an unpopulated or invalidated handle.
    BadBackReference { handle: i32 },
    /// Type index outside the expected monotonic sequence.
    TypeOutOfSequence { index: i32, expected: i32 },
    /// Declared and received array lengths disagree.
    LengthMismatch { declared: usize, received: i64 },
    /// Any other malformed wire data.
    Corrupt { reason: String },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Channel(err) => write!(f, "channel: {}", err),
            CodecError::Descriptor(err) => write!(f, "descriptor: {}", err),
            CodecError::NotSerializable { name } => {
                write!(f, "type {} is not serializable", name)
            }
            CodecError::FieldAccess {
                type_name,
                field,
                reason,
            } => write!(
                f,
                "type {} not fully serializable: field {}: {}",
                type_name, field, reason
            ),
            CodecError::BadBackReference { handle } => {
                write!(f, "back-reference to absent or invalidated handle {}", handle)
            }
            CodecError::TypeOutOfSequence { index, expected } => {
                write!(f, "type index {} out of sequence (expected {})", index, expected)
            }
            CodecError::LengthMismatch { declared, received } => {
                write!(
                    f,
                    "array length mismatch: declared {}, received {}",
                    declared, received
                )
            }
            CodecError::Corrupt { reason } => write!(f, "protocol corruption: {}", reason),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Channel(err) => Some(err),
            CodecError::Descriptor(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ChannelError> for CodecError {
    fn from(err: ChannelError) -> Self {
        CodecError::Channel(err)
    }
}

impl From<DescriptorError> for CodecError {
    fn from(err: DescriptorError) -> Self {
        CodecError::Descriptor(err)
    }
}

pub type CodecResult<T> = core::result::Result<T, CodecError>;

/// Object-safe write seam handed to hooks, custom codecs and fast paths.
///
/// `write_default_fields` encodes the current level's fields of the
/// object on top of the current-object stack; a hook must call it exactly
/// once.
pub trait GraphWrite {
    fn write_ref(&mut self, r: Option<&ObjRef>) -> CodecResult<()>;
    fn write_ref_unshared(&mut self, r: Option<&ObjRef>) -> CodecResult<()>;
    fn write_default_fields(&mut self) -> CodecResult<()>;
    /// Object and level currently being written, if any.
    fn current(&self) -> Option<(ObjRef, u32)>;
    fn write_bool(&mut self, v: bool) -> CodecResult<()>;
    fn write_i8(&mut self, v: i8) -> CodecResult<()>;
    fn write_i16(&mut self, v: i16) -> CodecResult<()>;
    fn write_char(&mut self, v: u16) -> CodecResult<()>;
    fn write_i32(&mut self, v: i32) -> CodecResult<()>;
    fn write_i64(&mut self, v: i64) -> CodecResult<()>;
    fn write_f32(&mut self, v: f32) -> CodecResult<()>;
    fn write_f64(&mut self, v: f64) -> CodecResult<()>;
    /// Length-prefixed UTF-8.
    fn write_str(&mut self, s: &str) -> CodecResult<()>;
    fn write_bytes(&mut self, data: &[u8]) -> CodecResult<()>;
}

/// Object-safe read seam, mirror of [`GraphWrite`].
pub trait GraphRead {
    fn read_ref(&mut self) -> CodecResult<Option<ObjRef>>;
    fn read_ref_unshared(&mut self) -> CodecResult<Option<ObjRef>>;
    fn read_default_fields(&mut self) -> CodecResult<()>;
    fn current(&self) -> Option<(ObjRef, u32)>;
    fn read_bool(&mut self) -> CodecResult<bool>;
    fn read_i8(&mut self) -> CodecResult<i8>;
    fn read_i16(&mut self) -> CodecResult<i16>;
    fn read_char(&mut self) -> CodecResult<u16>;
    fn read_i32(&mut self) -> CodecResult<i32>;
    fn read_i64(&mut self) -> CodecResult<i64>;
    fn read_f32(&mut self) -> CodecResult<f32>;
    fn read_f64(&mut self) -> CodecResult<f64>;
    fn read_str(&mut self) -> CodecResult<String>;
    fn read_bytes(&mut self, out: &mut [u8]) -> CodecResult<()>;
}
