// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Buffered primitive/array reader over a byte source.

use std::io::Read;

use super::order::ByteOrder;
use super::{ChannelError, ChannelResult};
use crate::config;

/// Generate a buffered read method for one fixed-width primitive.
macro_rules! impl_read_prim {
    ($name:ident, $ty:ty, $size:expr, $get:ident) => {
        pub fn $name(&mut self) -> ChannelResult<$ty> {
            self.fill_at_least($size)?;
            let value = self.order.$get(&self.buf[self.start..]);
            self.start += $size;
            self.consumed += $size as u64;
            Ok(value)
        }
    };
}

/// Generate an array read method for one element type.
///
/// Small runs convert element-by-element; each refill compacts any
/// leftover unconverted bytes to the buffer start, so a run may span a
/// refill boundary mid-element. A run at least as large as the whole
/// buffer streams in full-buffer conversions instead.
macro_rules! impl_read_array {
    ($name:ident, $elem:ty, $size:expr, $conv:expr) => {
        pub fn $name(&mut self, out: &mut [$elem]) -> ChannelResult<()> {
            let conv: fn(ByteOrder, &[u8]) -> $elem = $conv;
            if out.len() * $size >= self.buf.len() {
                return self.read_direct(out, $size, conv);
            }
            for slot in out.iter_mut() {
                self.fill_at_least($size)?;
                *slot = conv(self.order, &self.buf[self.start..]);
                self.start += $size;
                self.consumed += $size as u64;
            }
            Ok(())
        }
    };
}

/// Buffered, endianness-aware reader of primitives and primitive runs.
pub struct ChannelReader<R: Read> {
    source: R,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    order: ByteOrder,
    consumed: u64,
}

impl<R: Read> ChannelReader<R> {
    /// Reader with the default byte order and configured buffer capacity.
    pub fn new(source: R) -> Self {
        Self::with(source, ByteOrder::default(), config::buffer_size())
    }

    /// Reader with an explicit byte order and buffer capacity.
    pub fn with(source: R, order: ByteOrder, capacity: usize) -> Self {
        let capacity = capacity.max(config::MIN_BUFFER_SIZE);
        ChannelReader {
            source,
            buf: vec![0u8; capacity],
            start: 0,
            end: 0,
            order,
            consumed: 0,
        }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Logical bytes consumed so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    pub fn read_u8(&mut self) -> ChannelResult<u8> {
        self.fill_at_least(1)?;
        let value = self.buf[self.start];
        self.start += 1;
        self.consumed += 1;
        Ok(value)
    }

    pub fn read_i8(&mut self) -> ChannelResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> ChannelResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    impl_read_prim!(read_i16, i16, 2, get_i16);
    impl_read_prim!(read_char, u16, 2, get_u16);
    impl_read_prim!(read_i32, i32, 4, get_i32);
    impl_read_prim!(read_i64, i64, 8, get_i64);
    impl_read_prim!(read_f32, f32, 4, get_f32);
    impl_read_prim!(read_f64, f64, 8, get_f64);

    impl_read_array!(read_bool_array, bool, 1, |_, b| b[0] != 0);
    impl_read_array!(read_i8_array, i8, 1, |_, b| b[0] as i8);
    impl_read_array!(read_i16_array, i16, 2, |o, b| o.get_i16(b));
    impl_read_array!(read_char_array, u16, 2, |o, b| o.get_u16(b));
    impl_read_array!(read_i32_array, i32, 4, |o, b| o.get_i32(b));
    impl_read_array!(read_i64_array, i64, 8, |o, b| o.get_i64(b));
    impl_read_array!(read_f32_array, f32, 4, |o, b| o.get_f32(b));
    impl_read_array!(read_f64_array, f64, 8, |o, b| o.get_f64(b));

    /// Opaque byte-buffer transfer into `out`, draining buffered bytes
    /// first. A large remainder reads directly against the source.
    pub fn read_bytes(&mut self, out: &mut [u8]) -> ChannelResult<()> {
        let drained = self.available().min(out.len());
        out[..drained].copy_from_slice(&self.buf[self.start..self.start + drained]);
        self.start += drained;
        self.consumed += drained as u64;

        let mut filled = drained;
        let remainder = out.len() - filled;
        if remainder == 0 {
            return Ok(());
        }
        if remainder >= self.buf.len() {
            while filled < out.len() {
                let got = self.source.read(&mut out[filled..]).map_err(ChannelError::Io)?;
                if got == 0 {
                    return Err(ChannelError::EndOfStream {
                        needed: out.len(),
                        available: filled,
                    });
                }
                filled += got;
                self.consumed += got as u64;
            }
            return Ok(());
        }
        self.fill_at_least(remainder)?;
        out[filled..].copy_from_slice(&self.buf[self.start..self.start + remainder]);
        self.start += remainder;
        self.consumed += remainder as u64;
        Ok(())
    }

    fn available(&self) -> usize {
        self.end - self.start
    }

    /// Make at least `n` contiguous bytes available at `start`, compacting
    /// leftovers and refilling from the source as needed.
    fn fill_at_least(&mut self, n: usize) -> ChannelResult<()> {
        debug_assert!(n <= self.buf.len(), "request exceeds buffer capacity");
        if self.available() >= n {
            return Ok(());
        }
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        while self.end < n {
            let got = self.source.read(&mut self.buf[self.end..]).map_err(ChannelError::Io)?;
            if got == 0 {
                return Err(ChannelError::EndOfStream {
                    needed: n,
                    available: self.end,
                });
            }
            self.end += got;
        }
        Ok(())
    }

    /// Chunked path for runs at least as large as the buffer: full-buffer
    /// reads from the source, converted in place.
    fn read_direct<T>(
        &mut self,
        out: &mut [T],
        size: usize,
        conv: fn(ByteOrder, &[u8]) -> T,
    ) -> ChannelResult<()> {
        let per_run = self.buf.len() / size;
        for chunk in out.chunks_mut(per_run) {
            let need = chunk.len() * size;
            self.fill_at_least(need)?;
            for slot in chunk.iter_mut() {
                *slot = conv(self.order, &self.buf[self.start..]);
                self.start += size;
            }
            self.consumed += need as u64;
        }
        Ok(())
    }
}
