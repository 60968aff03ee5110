//! Sequential message writer.

use tracing::debug;
use uuid::Uuid;

use crate::buffer::GrowableBuffer;
use crate::config::CodecConfig;
use crate::encoding::Encode;
use crate::error::{CodecError, CodecResult, MisuseReason};
use crate::varint::{self, MAX_VARINT32_LEN};

/// An append-only encoder over a [`GrowableBuffer`].
///
/// The writer keeps its written region equal to the buffer length and refuses
/// any operation that would take that length past its message ceiling. Every
/// write resolves its target slice only after the buffer has grown, so no
/// slice outlives a reallocation.
///
/// Besides plain appends the writer supports reserve-then-patch writes:
/// [`Writer::make_hole`] reserves bytes at the cursor and the `poke_*`
/// methods fill them in once the value is known.
#[derive(Debug, Clone)]
pub struct Writer<'a> {
    buffer: GrowableBuffer<'a>,
    max_message_len: usize,
}

impl Default for Writer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Writer<'a> {
    /// Creates a writer with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&CodecConfig::default())
    }

    /// Creates a writer with the given configuration.
    ///
    /// No storage is allocated until the first write, which allocates at
    /// least `config.min_initial_len` bytes.
    #[must_use]
    pub fn with_config(config: &CodecConfig) -> Self {
        let mut buffer = GrowableBuffer::with_policy(config.growth_policy);
        buffer.set_min_capacity(config.min_initial_len);
        Self {
            buffer,
            max_message_len: config.max_message_len,
        }
    }

    /// Creates a writer with `capacity` bytes allocated up front.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_buffer(GrowableBuffer::with_capacity(capacity), &CodecConfig::default())
    }

    /// Creates a writer over caller-provided storage.
    ///
    /// The writer can never hold more than `storage.len()` bytes; writes past
    /// that fail with [`MisuseReason::BufferNotGrowable`].
    #[must_use]
    pub fn with_external(storage: &'a mut [u8]) -> Self {
        Self::from_buffer(GrowableBuffer::external(storage), &CodecConfig::default())
    }

    /// Creates a writer over an existing buffer, treating its content as
    /// already written.
    ///
    /// Content past `config.max_message_len` is truncated, as with
    /// [`Writer::set_max_message_len`].
    #[must_use]
    pub fn from_buffer(mut buffer: GrowableBuffer<'a>, config: &CodecConfig) -> Self {
        buffer.truncate(config.max_message_len);
        Self {
            buffer,
            max_message_len: config.max_message_len,
        }
    }

    /// Returns the number of bytes written.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the capacity of the underlying buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Returns how many more bytes may be written before the message ceiling.
    #[must_use]
    pub const fn writable_len(&self) -> usize {
        self.max_message_len.saturating_sub(self.buffer.len())
    }

    /// Returns the message ceiling.
    #[must_use]
    pub const fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    /// Changes the message ceiling. Lowering it below the written length
    /// truncates the message.
    pub fn set_max_message_len(&mut self, max_message_len: usize) {
        self.max_message_len = max_message_len;
        self.buffer.truncate(max_message_len);
    }

    /// Moves the written length back to `len`.
    ///
    /// # Errors
    ///
    /// Returns [`MisuseReason::TruncateForward`] if `len` is past the current
    /// length; the written region only grows through writes.
    pub fn set_len(&mut self, len: usize) -> CodecResult<()> {
        let written = self.buffer.len();
        if len > written {
            return Err(CodecError::Misuse(MisuseReason::TruncateForward {
                requested: len,
                written,
            }));
        }
        self.buffer.set_len(len)
    }

    /// Discards everything written, keeping the storage.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Makes sure `additional` more bytes can be written without reallocating.
    ///
    /// # Errors
    ///
    /// Fails with [`CodecError::MessageInSizeLimited`] if the bytes would not
    /// fit under the message ceiling, or with
    /// [`MisuseReason::BufferNotGrowable`] for external storage that is too small.
    pub fn ensure_capacity(&mut self, additional: usize) -> CodecResult<()> {
        let start = self.buffer.len();
        let end = self.check_limit(additional)?;
        self.buffer.set_len(end)?;
        self.buffer.set_len(start)
    }

    fn check_limit(&self, additional: usize) -> CodecResult<usize> {
        let written = self.buffer.len();
        match written.checked_add(additional) {
            Some(end) if end <= self.max_message_len => Ok(end),
            _ => {
                let size = written.saturating_add(additional);
                debug!(size, limit = self.max_message_len, "message ceiling reached");
                Err(CodecError::MessageInSizeLimited {
                    size,
                    limit: self.max_message_len,
                })
            }
        }
    }

    /// Returns `true` if `additional` bytes fit under the message ceiling and,
    /// for external storage, inside the slice.
    fn has_room(&self, additional: usize) -> bool {
        if self.check_limit(additional).is_err() {
            return false;
        }
        !self.buffer.is_external() || additional <= self.buffer.capacity() - self.buffer.len()
    }

    /// Extends the written region by `len` bytes and returns its start.
    fn reserve(&mut self, len: usize) -> CodecResult<usize> {
        self.check_limit(len)?;
        self.buffer.reserve_tail(len)
    }

    fn put(&mut self, bytes: &[u8]) -> CodecResult<()> {
        let start = self.reserve(bytes.len())?;
        self.buffer.as_mut_slice()[start..].copy_from_slice(bytes);
        Ok(())
    }

    fn put_varint(&mut self, value: u64) -> CodecResult<()> {
        let len = varint::varint64_len(value);
        let start = self.reserve(len)?;
        varint::encode_u64(value, &mut self.buffer.as_mut_slice()[start..]);
        Ok(())
    }

    // Fixed width

    /// Writes one byte.
    pub fn write_fixed8(&mut self, value: u8) -> CodecResult<()> {
        self.put(&[value])
    }

    /// Writes 2 bytes, little-endian.
    pub fn write_fixed16(&mut self, value: u16) -> CodecResult<()> {
        self.put(&value.to_le_bytes())
    }

    /// Writes 4 bytes, little-endian.
    pub fn write_fixed32(&mut self, value: u32) -> CodecResult<()> {
        self.put(&value.to_le_bytes())
    }

    /// Writes 8 bytes, little-endian.
    pub fn write_fixed64(&mut self, value: u64) -> CodecResult<()> {
        self.put(&value.to_le_bytes())
    }

    // Varints

    /// Writes an 8-bit varint (1 or 2 bytes).
    pub fn write_varint8(&mut self, value: u8) -> CodecResult<()> {
        self.put_varint(u64::from(value))
    }

    /// Writes a 16-bit varint (1 to 3 bytes).
    pub fn write_varint16(&mut self, value: u16) -> CodecResult<()> {
        self.put_varint(u64::from(value))
    }

    /// Writes a 32-bit varint (1 to 5 bytes).
    pub fn write_varint32(&mut self, value: u32) -> CodecResult<()> {
        self.put_varint(u64::from(value))
    }

    /// Writes a 64-bit varint (1 to 10 bytes).
    pub fn write_varint64(&mut self, value: u64) -> CodecResult<()> {
        self.put_varint(value)
    }

    /// Writes an 8-bit value as a varint, widening negatives to 64 bits.
    #[allow(clippy::cast_sign_loss)]
    pub fn write_varint8_sign_extended(&mut self, value: i8) -> CodecResult<()> {
        self.put_varint(i64::from(value) as u64)
    }

    /// Writes a 16-bit value as a varint, widening negatives to 64 bits.
    #[allow(clippy::cast_sign_loss)]
    pub fn write_varint16_sign_extended(&mut self, value: i16) -> CodecResult<()> {
        self.put_varint(i64::from(value) as u64)
    }

    /// Writes a 32-bit value as a varint, widening negatives to 64 bits.
    ///
    /// Non-negative values take the narrow varint form; negative ones always
    /// take [`MAX_VARINT64_LEN`](crate::varint::MAX_VARINT64_LEN) bytes.
    #[allow(clippy::cast_sign_loss)]
    pub fn write_varint32_sign_extended(&mut self, value: i32) -> CodecResult<()> {
        self.put_varint(i64::from(value) as u64)
    }

    // Zig-zag ("optimal") integers

    /// Writes a zig-zag mapped 8-bit integer.
    pub fn write_optimal_i8(&mut self, value: i8) -> CodecResult<()> {
        self.put_varint(u64::from(varint::zigzag_encode8(value)))
    }

    /// Writes a zig-zag mapped 16-bit integer.
    pub fn write_optimal_i16(&mut self, value: i16) -> CodecResult<()> {
        self.put_varint(u64::from(varint::zigzag_encode16(value)))
    }

    /// Writes a zig-zag mapped 32-bit integer.
    pub fn write_optimal_i32(&mut self, value: i32) -> CodecResult<()> {
        self.put_varint(u64::from(varint::zigzag_encode32(value)))
    }

    /// Writes a zig-zag mapped 64-bit integer.
    pub fn write_optimal_i64(&mut self, value: i64) -> CodecResult<()> {
        self.put_varint(varint::zigzag_encode64(value))
    }

    /// Writes a length or count as a 32-bit Counter.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MessageInSizeLimited`] if `len` does not fit in
    /// an `i32`.
    pub fn write_counter32(&mut self, len: usize) -> CodecResult<()> {
        let value = counter32(len)?;
        self.write_optimal_i32(value)
    }

    /// Writes a length or count as a 64-bit Counter.
    pub fn write_counter64(&mut self, len: u64) -> CodecResult<()> {
        let value = i64::try_from(len).map_err(|_| CodecError::MessageInSizeLimited {
            size: usize::try_from(len).unwrap_or(usize::MAX),
            limit: usize::try_from(i64::MAX).unwrap_or(usize::MAX),
        })?;
        self.write_optimal_i64(value)
    }

    // Holes and pokes

    /// Reserves `len` bytes at the cursor and returns their offset.
    ///
    /// The reserved bytes are left as they are; fill them with `poke_*`.
    pub fn make_hole(&mut self, len: usize) -> CodecResult<usize> {
        self.reserve(len)
    }

    /// Grows the written region by `len` bytes on behalf of an insertion at
    /// `pos`.
    ///
    /// Bytes after `pos` are not moved; the caller shifts them through
    /// [`Writer::as_mut_bytes`] if needed.
    pub fn insert_hole(&mut self, pos: usize, len: usize) -> CodecResult<()> {
        let written = self.buffer.len();
        if pos > written {
            return Err(CodecError::out_of_range(pos, len, written));
        }
        self.reserve(len).map(drop)
    }

    fn poke(&mut self, pos: usize, bytes: &[u8]) -> CodecResult<()> {
        let written = self.buffer.len();
        match pos.checked_add(bytes.len()) {
            Some(end) if end <= written => {
                self.buffer.as_mut_slice()[pos..end].copy_from_slice(bytes);
                Ok(())
            }
            _ => Err(CodecError::out_of_range(pos, bytes.len(), written)),
        }
    }

    /// Overwrites one byte at `pos` inside the written region.
    pub fn poke_fixed8(&mut self, pos: usize, value: u8) -> CodecResult<()> {
        self.poke(pos, &[value])
    }

    /// Overwrites 2 bytes at `pos` inside the written region.
    pub fn poke_fixed16(&mut self, pos: usize, value: u16) -> CodecResult<()> {
        self.poke(pos, &value.to_le_bytes())
    }

    /// Overwrites 4 bytes at `pos` inside the written region.
    pub fn poke_fixed32(&mut self, pos: usize, value: u32) -> CodecResult<()> {
        self.poke(pos, &value.to_le_bytes())
    }

    /// Overwrites 8 bytes at `pos` inside the written region.
    pub fn poke_fixed64(&mut self, pos: usize, value: u64) -> CodecResult<()> {
        self.poke(pos, &value.to_le_bytes())
    }

    /// Overwrites a 32-bit varint at `pos` and returns its length.
    ///
    /// The encoded varint must fit inside the written region.
    pub fn poke_varint32(&mut self, pos: usize, value: u32) -> CodecResult<usize> {
        let mut scratch = [0u8; MAX_VARINT32_LEN];
        let len = varint::encode_u32(value, &mut scratch);
        self.poke(pos, &scratch[..len])?;
        Ok(len)
    }

    /// Removes `len` written bytes at `pos`, shifting the tail left.
    pub fn remove_range(&mut self, pos: usize, len: usize) -> CodecResult<()> {
        self.buffer.remove(pos, len)
    }

    // Byte sequences and strings

    /// Appends bytes with no length prefix.
    pub fn write_raw_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.put(bytes)
    }

    /// Writes a Counter length followed by the bytes.
    ///
    /// The prefix and body are reserved together, so a failed write leaves
    /// nothing behind.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        let counter = varint::zigzag_encode32(counter32(bytes.len())?);
        let start = self.reserve(varint::length_prefixed_len(bytes.len()))?;
        let out = &mut self.buffer.as_mut_slice()[start..];
        let prefix = varint::encode_u32(counter, out);
        out[prefix..].copy_from_slice(bytes);
        Ok(())
    }

    /// Writes a Counter byte length followed by the UTF-8 bytes of `value`.
    pub fn write_str(&mut self, value: &str) -> CodecResult<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Writes characters as a length-prefixed UTF-8 string, encoding straight
    /// into the buffer.
    ///
    /// The prefix width is predicted from the character count before encoding.
    /// Once the byte length is known the prefix is re-encoded, and the body is
    /// moved if the real width differs from the prediction. The output is
    /// byte-identical to [`Writer::write_str`] on the collected string.
    ///
    /// Falls back to collecting into a `String` when the worst-case reservation
    /// would not fit under the message ceiling or inside external storage.
    pub fn write_chars(&mut self, chars: &[char]) -> CodecResult<()> {
        let reservation = chars
            .len()
            .checked_mul(4)
            .map(|body| varint::counter_len(body) + body)
            .filter(|&len| self.has_room(len));
        let Some(reservation) = reservation else {
            let collected: String = chars.iter().collect();
            return self.write_str(&collected);
        };

        let prefix_pos = self.buffer.len();
        let predicted = varint::counter_len(chars.len());
        let body_start = prefix_pos + predicted;
        self.reserve(reservation)?;

        let mut cursor = body_start;
        {
            let bytes = self.buffer.as_mut_slice();
            for ch in chars {
                cursor += ch.encode_utf8(&mut bytes[cursor..]).len();
            }
        }
        self.buffer.truncate(cursor);
        let result = self.patch_length_prefix(prefix_pos, predicted, cursor - body_start);
        if result.is_err() {
            self.buffer.truncate(prefix_pos);
        }
        result
    }

    /// Writes a length-prefixed sub-message produced by `body`.
    ///
    /// A one-byte prefix is reserved, `body` writes the payload, then the
    /// Counter is patched in and the payload moved if the prefix needs more
    /// room. If `body` fails, everything it wrote is discarded.
    pub fn write_nested<F>(&mut self, body: F) -> CodecResult<()>
    where
        F: FnOnce(&mut Self) -> CodecResult<()>,
    {
        let prefix_pos = self.buffer.len();
        let predicted = varint::counter_len(0);
        self.reserve(predicted)?;
        let body_start = self.buffer.len();

        let result = body(self).and_then(|()| {
            let body_len = self.buffer.len() - body_start;
            self.patch_length_prefix(prefix_pos, predicted, body_len)
        });
        if result.is_err() {
            self.buffer.truncate(prefix_pos);
        }
        result
    }

    /// Encodes the Counter for `body_len` at `prefix_pos`, where `predicted`
    /// bytes were set aside for it, moving the body if the width differs.
    fn patch_length_prefix(
        &mut self,
        prefix_pos: usize,
        predicted: usize,
        body_len: usize,
    ) -> CodecResult<()> {
        let counter = varint::zigzag_encode32(counter32(body_len)?);
        let actual = varint::varint32_len(counter);
        let body_start = prefix_pos + predicted;
        if actual > predicted {
            let extra = actual - predicted;
            self.check_limit(extra)?;
            self.buffer.insert_uninit(body_start, extra)?;
        } else if actual < predicted {
            self.buffer.remove(prefix_pos + actual, predicted - actual)?;
        }
        varint::encode_u32(counter, &mut self.buffer.as_mut_slice()[prefix_pos..]);
        Ok(())
    }

    // Typed values

    /// Writes a value through its [`Encode`] implementation.
    pub fn write<T: Encode + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        value.encode(self)
    }

    /// Writes a Counter element count followed by each element.
    pub fn write_seq<T: Encode>(&mut self, items: &[T]) -> CodecResult<()> {
        self.write_counter32(items.len())?;
        items.iter().try_for_each(|item| item.encode(self))
    }

    /// Writes a 128-bit identifier in the legacy layout: Counter(16) followed by
    /// the 16 identifier bytes.
    pub fn write_uuid_length_prefixed(&mut self, value: &Uuid) -> CodecResult<()> {
        self.write_bytes(&value.to_bytes_le())
    }

    // Output

    /// Returns the written bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Returns the written bytes, mutably.
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        self.buffer.as_mut_slice()
    }

    /// Copies the written bytes into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.buffer.as_slice().to_vec()
    }

    /// Consumes the writer and returns exactly the written bytes.
    ///
    /// Owned storage is handed over without copying.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_vec()
    }

    /// Consumes the writer and returns its buffer.
    #[must_use]
    pub fn into_buffer(self) -> GrowableBuffer<'a> {
        self.buffer
    }
}

/// Converts a length to the `i32` a Counter32 carries.
fn counter32(len: usize) -> CodecResult<i32> {
    i32::try_from(len).map_err(|_| CodecError::MessageInSizeLimited {
        size: len,
        limit: i32::MAX as usize,
    })
}
