// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endianness conversion strategy, fixed at channel construction.
//!
//! Every strategy agrees on the canonical byte widths per primitive
//! (1/2/2/4/4/8/8 for byte/short/char/int/float/long/double); only the
//! byte order within a primitive differs.

/// Byte order applied to every multi-byte primitive on a channel.
///
/// Selected once at construction; writer and reader of the same stream
/// must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Network order, the default for cross-host streams.
    Big,
    /// Host order on commodity hardware; cheaper when both ends share it.
    Little,
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::Big
    }
}

/// Generate `ByteOrder::put_*`/`ByteOrder::get_*` conversion pairs for one
/// primitive type.
macro_rules! impl_order_conv {
    ($put:ident, $get:ident, $ty:ty, $size:expr) => {
        #[inline]
        pub fn $put(self, out: &mut [u8], value: $ty) {
            let bytes = match self {
                ByteOrder::Big => value.to_be_bytes(),
                ByteOrder::Little => value.to_le_bytes(),
            };
            out[..$size].copy_from_slice(&bytes);
        }

        #[inline]
        pub fn $get(self, input: &[u8]) -> $ty {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(&input[..$size]);
            match self {
                ByteOrder::Big => <$ty>::from_be_bytes(bytes),
                ByteOrder::Little => <$ty>::from_le_bytes(bytes),
            }
        }
    };
}

impl ByteOrder {
    impl_order_conv!(put_u16, get_u16, u16, 2);
    impl_order_conv!(put_i16, get_i16, i16, 2);
    impl_order_conv!(put_i32, get_i32, i32, 4);
    impl_order_conv!(put_i64, get_i64, i64, 8);
    impl_order_conv!(put_f32, get_f32, f32, 4);
    impl_order_conv!(put_f64, get_f64, f64, 8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_layout() {
        let mut buf = [0u8; 4];
        ByteOrder::Big.put_i32(&mut buf, 0x0102_0304);
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04]);
        assert_eq!(ByteOrder::Big.get_i32(&buf), 0x0102_0304);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buf = [0u8; 4];
        ByteOrder::Little.put_i32(&mut buf, 0x0102_0304);
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);
        assert_eq!(ByteOrder::Little.get_i32(&buf), 0x0102_0304);
    }

    #[test]
    fn test_float_roundtrip_both_orders() {
        let mut buf = [0u8; 8];
        for order in [ByteOrder::Big, ByteOrder::Little] {
            order.put_f64(&mut buf, core::f64::consts::PI);
            assert_eq!(order.get_f64(&buf), core::f64::consts::PI);
        }
    }

    #[test]
    fn test_default_is_network_order() {
        assert_eq!(ByteOrder::default(), ByteOrder::Big);
    }
}
