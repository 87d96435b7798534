// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Buffered, endianness-aware binary channel over a byte sink/source.
//!
//! The channel knows primitives and contiguous runs of primitives; it has
//! no notion of object graphs. `ChannelWriter`/`ChannelReader` convert
//! through a fixed-capacity buffer and fall through to the underlying
//! `std::io` stream for requests at least as large as the whole buffer.

pub mod order;
pub mod queue;
pub mod reader;
pub mod writer;

pub use order::ByteOrder;
pub use queue::{byte_queue, QueueReader, QueueWriter};
pub use reader::ChannelReader;
pub use writer::ChannelWriter;

use std::fmt;

/// Channel-layer error.
#[derive(Debug)]
pub enum ChannelError {
    /// The underlying source ran dry before the requested length was
    /// satisfied. There is no partial return.
    EndOfStream { needed: usize, available: usize },
    /// I/O failure from the underlying sink/source.
    Io(std::io::Error),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::EndOfStream { needed, available } => {
                write!(
                    f,
                    "end of stream: needed {} bytes, {} available",
                    needed, available
                )
            }
            ChannelError::Io(err) => write!(f, "channel i/o error: {}", err),
        }
    }
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChannelError::Io(err) => Some(err),
            ChannelError::EndOfStream { .. } => None,
        }
    }
}

impl From<std::io::Error> for ChannelError {
    fn from(err: std::io::Error) -> Self {
        ChannelError::Io(err)
    }
}

pub type ChannelResult<T> = core::result::Result<T, ChannelError>;
