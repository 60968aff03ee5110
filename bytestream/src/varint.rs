//! Varint and zig-zag primitives.
//!
//! A varint stores 7 payload bits per byte, least-significant group first. The
//! high bit of every byte except the last is set. Signed values are zig-zag
//! mapped before varint encoding so that small negative numbers stay short.
//!
//! The length calculators in this module return exactly the number of bytes
//! the matching encoder writes, so a writer can size its output up front.

use crate::error::{CodecError, CodecResult};

/// Maximum encoded length of an 8-bit varint.
pub const MAX_VARINT8_LEN: usize = 2;
/// Maximum encoded length of a 16-bit varint.
pub const MAX_VARINT16_LEN: usize = 3;
/// Maximum encoded length of a 32-bit varint.
pub const MAX_VARINT32_LEN: usize = 5;
/// Maximum encoded length of a 64-bit varint.
pub const MAX_VARINT64_LEN: usize = 10;

const PAYLOAD_MASK: u8 = 0x7F;
const CONTINUATION: u8 = 0x80;

macro_rules! zigzag {
    ($encode:ident, $decode:ident, $signed:ty, $unsigned:ty) => {
        #[doc = concat!("Maps an `", stringify!($signed), "` onto an `", stringify!($unsigned), "` so that small magnitudes stay small.")]
        #[inline]
        #[must_use]
        #[allow(clippy::cast_sign_loss)]
        pub const fn $encode(value: $signed) -> $unsigned {
            ((value << 1) ^ (value >> (<$signed>::BITS - 1))) as $unsigned
        }

        #[doc = concat!("Inverse of [`", stringify!($encode), "`].")]
        #[inline]
        #[must_use]
        #[allow(clippy::cast_possible_wrap)]
        pub const fn $decode(value: $unsigned) -> $signed {
            ((value >> 1) as $signed) ^ -((value & 1) as $signed)
        }
    };
}

zigzag!(zigzag_encode8, zigzag_decode8, i8, u8);
zigzag!(zigzag_encode16, zigzag_decode16, i16, u16);
zigzag!(zigzag_encode32, zigzag_decode32, i32, u32);
zigzag!(zigzag_encode64, zigzag_decode64, i64, u64);

/// Encoded length of an 8-bit varint.
#[inline]
#[must_use]
pub const fn varint8_len(value: u8) -> usize {
    if value < 1 << 7 {
        1
    } else {
        2
    }
}

/// Encoded length of a 16-bit varint.
#[inline]
#[must_use]
pub const fn varint16_len(value: u16) -> usize {
    if value < 1 << 7 {
        1
    } else if value < 1 << 14 {
        2
    } else {
        3
    }
}

/// Encoded length of a 32-bit varint.
#[inline]
#[must_use]
pub const fn varint32_len(value: u32) -> usize {
    if value < 1 << 7 {
        1
    } else if value < 1 << 14 {
        2
    } else if value < 1 << 21 {
        3
    } else if value < 1 << 28 {
        4
    } else {
        5
    }
}

/// Encoded length of a 64-bit varint.
#[inline]
#[must_use]
pub const fn varint64_len(value: u64) -> usize {
    if value < 1 << 7 {
        1
    } else if value < 1 << 14 {
        2
    } else if value < 1 << 21 {
        3
    } else if value < 1 << 28 {
        4
    } else if value < 1 << 35 {
        5
    } else if value < 1 << 42 {
        6
    } else if value < 1 << 49 {
        7
    } else if value < 1 << 56 {
        8
    } else if value < 1 << 63 {
        9
    } else {
        10
    }
}

/// Encoded length of a zig-zag 8-bit integer.
#[inline]
#[must_use]
pub const fn optimal_i8_len(value: i8) -> usize {
    varint8_len(zigzag_encode8(value))
}

/// Encoded length of a zig-zag 16-bit integer.
#[inline]
#[must_use]
pub const fn optimal_i16_len(value: i16) -> usize {
    varint16_len(zigzag_encode16(value))
}

/// Encoded length of a zig-zag 32-bit integer.
#[inline]
#[must_use]
pub const fn optimal_i32_len(value: i32) -> usize {
    varint32_len(zigzag_encode32(value))
}

/// Encoded length of a zig-zag 64-bit integer.
#[inline]
#[must_use]
pub const fn optimal_i64_len(value: i64) -> usize {
    varint64_len(zigzag_encode64(value))
}

/// Encoded length of a sign-extended 8-bit varint.
///
/// Negative values are widened to a full 64-bit varint.
#[inline]
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn varint8_sign_extended_len(value: i8) -> usize {
    if value < 0 {
        MAX_VARINT64_LEN
    } else {
        varint8_len(value as u8)
    }
}

/// Encoded length of a sign-extended 16-bit varint.
#[inline]
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn varint16_sign_extended_len(value: i16) -> usize {
    if value < 0 {
        MAX_VARINT64_LEN
    } else {
        varint16_len(value as u16)
    }
}

/// Encoded length of a sign-extended 32-bit varint.
#[inline]
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn varint32_sign_extended_len(value: i32) -> usize {
    if value < 0 {
        MAX_VARINT64_LEN
    } else {
        varint32_len(value as u32)
    }
}

/// Encoded length of a Counter holding `len`.
///
/// A Counter is a zig-zag varint of a non-negative length, so the encoded
/// value is `2 * len`. The width changes at lengths 64, 8192, 2^20 and 2^27.
#[inline]
#[must_use]
pub const fn counter_len(len: usize) -> usize {
    varint64_len((len as u64).saturating_mul(2))
}

/// Encoded length of a Counter prefix plus a `len`-byte payload.
#[inline]
#[must_use]
pub const fn length_prefixed_len(len: usize) -> usize {
    counter_len(len) + len
}

/// Writes `value` as a varint into the front of `out` and returns the number
/// of bytes written.
///
/// # Panics
///
/// Panics if `out` is shorter than [`varint64_len`] of `value`.
#[inline]
pub fn encode_u64(value: u64, out: &mut [u8]) -> usize {
    if value < u64::from(CONTINUATION) {
        out[0] = value as u8;
        return 1;
    }
    if value >> 63 != 0 {
        let mut rest = value;
        for byte in &mut out[..MAX_VARINT64_LEN - 1] {
            *byte = (rest as u8) | CONTINUATION;
            rest >>= 7;
        }
        out[MAX_VARINT64_LEN - 1] = 1;
        return MAX_VARINT64_LEN;
    }

    let len = varint64_len(value);
    let mut rest = value;
    for byte in &mut out[..len - 1] {
        *byte = (rest as u8) | CONTINUATION;
        rest >>= 7;
    }
    out[len - 1] = rest as u8;
    len
}

/// Writes a 32-bit varint; see [`encode_u64`].
#[inline]
pub fn encode_u32(value: u32, out: &mut [u8]) -> usize {
    encode_u64(u64::from(value), out)
}

/// Writes a 16-bit varint; see [`encode_u64`].
#[inline]
pub fn encode_u16(value: u16, out: &mut [u8]) -> usize {
    encode_u64(u64::from(value), out)
}

/// Writes an 8-bit varint; see [`encode_u64`].
#[inline]
pub fn encode_u8(value: u8, out: &mut [u8]) -> usize {
    encode_u64(u64::from(value), out)
}

/// Decodes a varint of at most `bits` significant bits from the front of
/// `bytes`, returning the value and the number of bytes consumed.
///
/// Fails with [`CodecError::TruncatedMessage`] when `bytes` ends before the
/// final byte, and with [`CodecError::MalformedVarint`] when the encoding is
/// longer than `max_len` or sets bits beyond `bits`.
fn decode(bytes: &[u8], bits: u32, max_len: usize) -> CodecResult<(u64, usize)> {
    if let Some(&first) = bytes.first() {
        if first & CONTINUATION == 0 {
            return Ok((u64::from(first), 1));
        }
    }

    let mut value = 0u64;
    for (index, &byte) in bytes.iter().take(max_len).enumerate() {
        let shift = 7 * index as u32;
        let payload = byte & PAYLOAD_MASK;
        if index + 1 == max_len {
            // Last permitted byte: no continuation, no bits past the width.
            let room = bits - shift;
            if byte & CONTINUATION != 0 || u32::from(payload) >> room != 0 {
                return Err(CodecError::MalformedVarint { max_len });
            }
        }
        value |= u64::from(payload) << shift;
        if byte & CONTINUATION == 0 {
            return Ok((value, index + 1));
        }
    }

    Err(CodecError::TruncatedMessage {
        needed: bytes.len() + 1,
        available: bytes.len(),
    })
}

/// Decodes an 8-bit varint. See [`decode_u64`] for the failure modes.
pub fn decode_u8(bytes: &[u8]) -> CodecResult<(u8, usize)> {
    decode(bytes, u8::BITS, MAX_VARINT8_LEN).map(|(value, len)| (value as u8, len))
}

/// Decodes a 16-bit varint. See [`decode_u64`] for the failure modes.
pub fn decode_u16(bytes: &[u8]) -> CodecResult<(u16, usize)> {
    decode(bytes, u16::BITS, MAX_VARINT16_LEN).map(|(value, len)| (value as u16, len))
}

/// Decodes a 32-bit varint. See [`decode_u64`] for the failure modes.
pub fn decode_u32(bytes: &[u8]) -> CodecResult<(u32, usize)> {
    decode(bytes, u32::BITS, MAX_VARINT32_LEN).map(|(value, len)| (value as u32, len))
}

/// Decodes a 64-bit varint from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
///
/// - [`CodecError::TruncatedMessage`] if `bytes` ends mid-varint.
/// - [`CodecError::MalformedVarint`] if the encoding is longer than
///   [`MAX_VARINT64_LEN`] or carries bits past 64.
pub fn decode_u64(bytes: &[u8]) -> CodecResult<(u64, usize)> {
    decode(bytes, u64::BITS, MAX_VARINT64_LEN)
}
