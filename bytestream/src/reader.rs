//! Bounded message reader with scoped views and recursion accounting.

use std::borrow::Cow;

use tracing::{debug, trace};

use crate::config::{CodecConfig, UuidFormat, MAX_RECURSION_LIMIT};
use crate::encoding::Decode;
use crate::error::{CodecError, CodecResult, MalformedReason, MisuseReason};
use crate::varint;
use crate::writer::Writer;

/// A readable window `[offset, end)` of a [`Reader`].
///
/// Obtained from [`Reader::push_view`] and handed back to [`Reader::pop_view`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View {
    offset: usize,
    end: usize,
}

impl View {
    /// First readable position.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }

    /// One past the last readable position.
    #[must_use]
    pub const fn end(self) -> usize {
        self.end
    }

    /// Number of bytes inside the view.
    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.offset
    }

    /// Returns `true` if the view covers no bytes.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.end == self.offset
    }
}

/// A sequential decoder over a byte buffer.
///
/// Reads never go past the current [`View`]. A nested sub-message is read by
/// saving the view, narrowing it to the declared length, reading, checking
/// [`Reader::at_end`] and restoring the saved view; [`Reader::read_nested`]
/// does all of that and also bounds the nesting depth.
///
/// Every read has a strict form returning [`CodecResult`]. Reads of fixed
/// width and varint values also have a `try_` form returning `Option`, and
/// reads of length-prefixed data have a `try_` form returning
/// `CodecResult<Option<_>>`: running out of input yields `None` while limit
/// violations are still raised. Failed reads never move the cursor.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: Cow<'a, [u8]>,
    position: usize,
    view: View,
    recursion_depth: u32,
    recursion_limit: u32,
    max_message_len: usize,
    max_collection_count: usize,
    uuid_format: UuidFormat,
}

impl<'a> Reader<'a> {
    /// Creates a reader over `data` with the default configuration.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self::from_parts(Cow::Borrowed(data), &CodecConfig::default())
    }

    /// Creates a reader over `data` with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MisuseReason::RecursionLimitOutOfRange`] if the configured
    /// recursion limit exceeds [`MAX_RECURSION_LIMIT`].
    pub fn with_config(data: &'a [u8], config: &CodecConfig) -> CodecResult<Self> {
        validate_recursion_limit(config.recursion_limit)?;
        Ok(Self::from_parts(Cow::Borrowed(data), config))
    }

    /// Creates a reader that owns `data`.
    pub fn from_vec(data: Vec<u8>, config: &CodecConfig) -> CodecResult<Reader<'static>> {
        validate_recursion_limit(config.recursion_limit)?;
        Ok(Reader::from_parts(Cow::Owned(data), config))
    }

    /// Creates a reader over everything `writer` wrote, taking its storage
    /// without copying when the writer owns it.
    pub fn from_writer(writer: Writer<'_>, config: &CodecConfig) -> CodecResult<Reader<'static>> {
        Reader::from_vec(writer.into_bytes(), config)
    }

    fn from_parts(data: Cow<'a, [u8]>, config: &CodecConfig) -> Self {
        let end = data.len();
        Self {
            data,
            position: 0,
            view: View { offset: 0, end },
            recursion_depth: 0,
            recursion_limit: config.recursion_limit,
            max_message_len: config.max_message_len,
            max_collection_count: config.max_collection_count,
            uuid_format: config.uuid_format,
        }
    }

    /// Returns a reader borrowing the same bytes, with the same cursor, view
    /// and limits. Reading from the fork does not move this reader.
    #[must_use]
    pub fn fork(&self) -> Reader<'_> {
        Reader {
            data: Cow::Borrowed(&*self.data),
            position: self.position,
            view: self.view,
            recursion_depth: self.recursion_depth,
            recursion_limit: self.recursion_limit,
            max_message_len: self.max_message_len,
            max_collection_count: self.max_collection_count,
            uuid_format: self.uuid_format,
        }
    }

    // Position

    /// Returns the cursor position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Moves the cursor to `position` inside the current view.
    pub fn set_position(&mut self, position: usize) -> CodecResult<()> {
        if position < self.view.offset || position > self.view.end {
            return Err(CodecError::out_of_range(position, 0, self.view.end));
        }
        self.position = position;
        Ok(())
    }

    /// Returns the total number of bytes behind the reader.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of bytes left in the current view.
    #[must_use]
    pub const fn readable_len(&self) -> usize {
        self.view.end - self.position
    }

    /// Returns `true` if `len` more bytes can be read in the current view.
    #[must_use]
    pub const fn can_read(&self, len: usize) -> bool {
        len <= self.readable_len()
    }

    /// Returns `true` if the cursor is at the end of the current view.
    #[must_use]
    pub const fn at_end(&self) -> bool {
        self.position == self.view.end
    }

    /// Advances the cursor by `len` bytes.
    pub fn skip(&mut self, len: usize) -> CodecResult<()> {
        self.take(len).map(drop)
    }

    /// Moves the cursor to the start of the current view.
    pub fn seek_to_begin(&mut self) {
        self.position = self.view.offset;
    }

    /// Moves the cursor to the end of the current view.
    pub fn seek_to_end(&mut self) {
        self.position = self.view.end;
    }

    /// Rewinds to the start of the data, dropping any narrowed view and
    /// resetting the recursion depth.
    pub fn reset(&mut self) {
        self.position = 0;
        self.view = View {
            offset: 0,
            end: self.data.len(),
        };
        self.recursion_depth = 0;
    }

    /// Returns every byte behind the reader, regardless of view.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the unread bytes of the current view.
    #[must_use]
    pub fn remaining_bytes(&self) -> &[u8] {
        &self.data[self.position..self.view.end]
    }

    // Limits

    /// Returns the ceiling applied to declared lengths.
    #[must_use]
    pub const fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    /// Returns the ceiling applied to declared element counts.
    #[must_use]
    pub const fn max_collection_count(&self) -> usize {
        self.max_collection_count
    }

    /// Returns the layout expected for 128-bit identifiers.
    #[must_use]
    pub const fn uuid_format(&self) -> UuidFormat {
        self.uuid_format
    }

    // Views

    /// Returns the current view.
    #[must_use]
    pub const fn view(&self) -> View {
        self.view
    }

    /// Returns `true` if the view is narrower than the whole buffer.
    #[must_use]
    pub fn is_view_adjusted(&self) -> bool {
        self.view.offset != 0 || self.view.end != self.data.len()
    }

    /// Saves the current view so it can be restored with [`Reader::pop_view`].
    #[must_use]
    pub const fn push_view(&self) -> View {
        self.view
    }

    /// Narrows the view to exactly `len` bytes starting at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedMessage`] if fewer than `len` bytes
    /// remain in the current view.
    pub fn adjust_view(&mut self, len: usize) -> CodecResult<()> {
        if !self.can_read(len) {
            return Err(self.truncated(len));
        }
        self.view = View {
            offset: self.position,
            end: self.position + len,
        };
        trace!(offset = self.view.offset, end = self.view.end, "view narrowed");
        Ok(())
    }

    /// Restores a view saved by [`Reader::push_view`].
    ///
    /// # Errors
    ///
    /// Returns [`MisuseReason::StaleView`] if `saved` ends before the current
    /// view, which means views were restored out of order, and
    /// [`MisuseReason::OutOfRange`] if the cursor lies outside `saved`.
    pub fn pop_view(&mut self, saved: View) -> CodecResult<()> {
        if saved.end < self.view.end {
            return Err(CodecError::Misuse(MisuseReason::StaleView {
                saved_end: saved.end,
                current_end: self.view.end,
            }));
        }
        if saved.end > self.data.len() || self.position < saved.offset {
            return Err(CodecError::out_of_range(
                saved.offset,
                saved.len(),
                self.data.len(),
            ));
        }
        self.view = saved;
        trace!(offset = saved.offset, end = saved.end, "view restored");
        Ok(())
    }

    // Recursion

    /// Returns the current nesting depth.
    #[must_use]
    pub const fn recursion_depth(&self) -> u32 {
        self.recursion_depth
    }

    /// Returns the nesting limit.
    #[must_use]
    pub const fn recursion_limit(&self) -> u32 {
        self.recursion_limit
    }

    /// Changes the nesting limit.
    ///
    /// # Errors
    ///
    /// Returns [`MisuseReason::RecursionLimitOutOfRange`] if `limit` exceeds
    /// [`MAX_RECURSION_LIMIT`].
    pub fn set_recursion_limit(&mut self, limit: u32) -> CodecResult<()> {
        validate_recursion_limit(limit)?;
        self.recursion_limit = limit;
        Ok(())
    }

    /// Enters one nesting level.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::RecursionLimitExceeded`] if the depth is already
    /// at the limit. The depth is left unchanged.
    pub fn increase_recursion_depth(&mut self) -> CodecResult<()> {
        if self.recursion_depth >= self.recursion_limit {
            debug!(limit = self.recursion_limit, "recursion limit exceeded");
            return Err(CodecError::RecursionLimitExceeded {
                limit: self.recursion_limit,
            });
        }
        self.recursion_depth += 1;
        Ok(())
    }

    /// Leaves one nesting level.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnderflowRecursionDepth`] if the depth is zero.
    pub fn decrease_recursion_depth(&mut self) -> CodecResult<()> {
        if self.recursion_depth == 0 {
            return Err(CodecError::UnderflowRecursionDepth);
        }
        self.recursion_depth -= 1;
        Ok(())
    }

    // Raw access

    fn truncated(&self, needed: usize) -> CodecError {
        CodecError::TruncatedMessage {
            needed,
            available: self.readable_len(),
        }
    }

    fn take(&mut self, len: usize) -> CodecResult<&[u8]> {
        if !self.can_read(len) {
            return Err(self.truncated(len));
        }
        let start = self.position;
        self.position += len;
        Ok(&self.data[start..self.position])
    }

    fn take_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn peek_array<const N: usize>(&self) -> Option<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.remaining_bytes().get(..N)?);
        Some(out)
    }

    /// Runs `read`, restoring the cursor if it fails. Running out of input
    /// becomes `Ok(None)`; every other failure is passed through.
    pub(crate) fn attempt<T, F>(&mut self, read: F) -> CodecResult<Option<T>>
    where
        F: FnOnce(&mut Self) -> CodecResult<T>,
    {
        let start = self.position;
        match read(self) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                self.position = start;
                if err.is_truncation() {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Reads exactly `len` bytes with no length prefix.
    pub fn read_raw_bytes(&mut self, len: usize) -> CodecResult<&[u8]> {
        self.take(len)
    }

    /// Fills `out` with the next `out.len()` bytes.
    pub fn read_raw_into(&mut self, out: &mut [u8]) -> CodecResult<()> {
        out.copy_from_slice(self.take(out.len())?);
        Ok(())
    }

    // Fixed width

    /// Reads one byte.
    pub fn read_fixed8(&mut self) -> CodecResult<u8> {
        self.take_array().map(u8::from_le_bytes)
    }

    /// Reads a little-endian `u16`.
    pub fn read_fixed16(&mut self) -> CodecResult<u16> {
        self.take_array().map(u16::from_le_bytes)
    }

    /// Reads a little-endian `u32`.
    pub fn read_fixed32(&mut self) -> CodecResult<u32> {
        self.take_array().map(u32::from_le_bytes)
    }

    /// Reads a little-endian `u64`.
    pub fn read_fixed64(&mut self) -> CodecResult<u64> {
        self.take_array().map(u64::from_le_bytes)
    }

    /// Reads one byte, or returns `None` at the end of the view.
    pub fn try_read_fixed8(&mut self) -> Option<u8> {
        self.read_fixed8().ok()
    }

    /// Reads a little-endian `u16`, or returns `None` if fewer than 2 bytes remain.
    pub fn try_read_fixed16(&mut self) -> Option<u16> {
        self.read_fixed16().ok()
    }

    /// Reads a little-endian `u32`, or returns `None` if fewer than 4 bytes remain.
    pub fn try_read_fixed32(&mut self) -> Option<u32> {
        self.read_fixed32().ok()
    }

    /// Reads a little-endian `u64`, or returns `None` if fewer than 8 bytes remain.
    pub fn try_read_fixed64(&mut self) -> Option<u64> {
        self.read_fixed64().ok()
    }

    /// Returns the next byte without consuming it.
    #[must_use]
    pub fn peek_fixed8(&self) -> Option<u8> {
        self.peek_array().map(u8::from_le_bytes)
    }

    /// Returns the next `u16` without consuming it.
    #[must_use]
    pub fn peek_fixed16(&self) -> Option<u16> {
        self.peek_array().map(u16::from_le_bytes)
    }

    /// Returns the next `u32` without consuming it.
    #[must_use]
    pub fn peek_fixed32(&self) -> Option<u32> {
        self.peek_array().map(u32::from_le_bytes)
    }

    /// Returns the next `u64` without consuming it.
    #[must_use]
    pub fn peek_fixed64(&self) -> Option<u64> {
        self.peek_array().map(u64::from_le_bytes)
    }

    // Varints

    fn read_varint_with<T>(&mut self, decode: fn(&[u8]) -> CodecResult<(T, usize)>) -> CodecResult<T> {
        let (value, len) = decode(self.remaining_bytes())?;
        self.position += len;
        Ok(value)
    }

    /// Reads an 8-bit varint.
    pub fn read_varint8(&mut self) -> CodecResult<u8> {
        self.read_varint_with(varint::decode_u8)
    }

    /// Reads a 16-bit varint.
    pub fn read_varint16(&mut self) -> CodecResult<u16> {
        self.read_varint_with(varint::decode_u16)
    }

    /// Reads a 32-bit varint.
    ///
    /// # Errors
    ///
    /// - [`CodecError::TruncatedMessage`] if the view ends mid-varint.
    /// - [`CodecError::MalformedVarint`] if the encoding is longer than 5 bytes
    ///   or overflows 32 bits.
    pub fn read_varint32(&mut self) -> CodecResult<u32> {
        self.read_varint_with(varint::decode_u32)
    }

    /// Reads a 64-bit varint.
    pub fn read_varint64(&mut self) -> CodecResult<u64> {
        self.read_varint_with(varint::decode_u64)
    }

    /// Reads an 8-bit varint, or returns `None` without moving the cursor.
    pub fn try_read_varint8(&mut self) -> Option<u8> {
        self.read_varint8().ok()
    }

    /// Reads a 16-bit varint, or returns `None` without moving the cursor.
    pub fn try_read_varint16(&mut self) -> Option<u16> {
        self.read_varint16().ok()
    }

    /// Reads a 32-bit varint, or returns `None` without moving the cursor.
    ///
    /// A caller may retry at a different width after a `None`.
    pub fn try_read_varint32(&mut self) -> Option<u32> {
        self.read_varint32().ok()
    }

    /// Reads a 64-bit varint, or returns `None` without moving the cursor.
    pub fn try_read_varint64(&mut self) -> Option<u64> {
        self.read_varint64().ok()
    }

    /// Reads a 64-bit varint and narrows it to `T`.
    ///
    /// Only a non-negative value that fits `T` or a negative one widened to
    /// 64 bits is accepted. Anything else fails with
    /// [`CodecError::MalformedVarint`] and leaves the cursor where it was.
    #[allow(clippy::cast_possible_wrap)]
    fn read_sign_extended<T: TryFrom<i64>>(&mut self) -> CodecResult<T> {
        let (raw, len) = varint::decode_u64(self.remaining_bytes())?;
        let value = T::try_from(raw as i64).map_err(|_| {
            debug!(raw, "sign-extended varint out of range");
            CodecError::MalformedVarint {
                max_len: varint::MAX_VARINT64_LEN,
            }
        })?;
        self.position += len;
        Ok(value)
    }

    /// Reads a varint written by [`Writer::write_varint8_sign_extended`].
    pub fn read_varint8_sign_extended(&mut self) -> CodecResult<i8> {
        self.read_sign_extended()
    }

    /// Reads a varint written by [`Writer::write_varint16_sign_extended`].
    pub fn read_varint16_sign_extended(&mut self) -> CodecResult<i16> {
        self.read_sign_extended()
    }

    /// Reads a varint written by [`Writer::write_varint32_sign_extended`].
    pub fn read_varint32_sign_extended(&mut self) -> CodecResult<i32> {
        self.read_sign_extended()
    }

    /// Reads a zig-zag mapped 8-bit integer.
    pub fn read_optimal_i8(&mut self) -> CodecResult<i8> {
        self.read_varint8().map(varint::zigzag_decode8)
    }

    /// Reads a zig-zag mapped 16-bit integer.
    pub fn read_optimal_i16(&mut self) -> CodecResult<i16> {
        self.read_varint16().map(varint::zigzag_decode16)
    }

    /// Reads a zig-zag mapped 32-bit integer.
    pub fn read_optimal_i32(&mut self) -> CodecResult<i32> {
        self.read_varint32().map(varint::zigzag_decode32)
    }

    /// Reads a zig-zag mapped 64-bit integer.
    pub fn read_optimal_i64(&mut self) -> CodecResult<i64> {
        self.read_varint64().map(varint::zigzag_decode64)
    }

    /// Reads a zig-zag mapped 32-bit integer, or returns `None` without moving
    /// the cursor.
    pub fn try_read_optimal_i32(&mut self) -> Option<i32> {
        self.read_optimal_i32().ok()
    }

    /// Reads a zig-zag mapped 64-bit integer, or returns `None` without moving
    /// the cursor.
    pub fn try_read_optimal_i64(&mut self) -> Option<i64> {
        self.read_optimal_i64().ok()
    }

    /// Reads a raw 32-bit Counter without validating it.
    pub fn read_counter32(&mut self) -> CodecResult<i32> {
        self.read_optimal_i32()
    }

    /// Reads a raw 64-bit Counter without validating it.
    pub fn read_counter64(&mut self) -> CodecResult<i64> {
        self.read_optimal_i64()
    }

    // Lengths and counts

    /// Reads a Counter holding a byte length and validates it.
    ///
    /// The checks run in a fixed order before anything is allocated: the
    /// length must be non-negative, within the message ceiling, and no larger
    /// than what is left in the view. The cursor is restored on failure.
    ///
    /// # Errors
    ///
    /// [`CodecError::NegativeSize`], [`CodecError::MessageInSizeLimited`] or
    /// [`CodecError::TruncatedMessage`], in that order of precedence.
    pub fn read_length(&mut self) -> CodecResult<usize> {
        let start = self.position;
        let result = self
            .read_counter32()
            .and_then(|declared| self.check_length(i64::from(declared)));
        if result.is_err() {
            self.position = start;
        }
        result
    }

    fn check_length(&self, declared: i64) -> CodecResult<usize> {
        let len = non_negative(declared)?;
        if len > self.max_message_len {
            debug!(len, limit = self.max_message_len, "declared length over limit");
            return Err(CodecError::MessageInSizeLimited {
                size: len,
                limit: self.max_message_len,
            });
        }
        if !self.can_read(len) {
            return Err(self.truncated(len));
        }
        Ok(len)
    }

    /// Reads a Counter holding an element count and validates it against the
    /// collection ceiling. The cursor is restored on failure.
    pub fn read_collection_count(&mut self) -> CodecResult<usize> {
        let start = self.position;
        let result = self.read_counter32().and_then(|declared| {
            let count = non_negative(i64::from(declared))?;
            if count > self.max_collection_count {
                debug!(count, limit = self.max_collection_count, "declared count over limit");
                return Err(CodecError::CollectionCountLimited {
                    count,
                    limit: self.max_collection_count,
                });
            }
            Ok(count)
        });
        if result.is_err() {
            self.position = start;
        }
        result
    }

    // Byte sequences and strings

    /// Reads a length-prefixed byte sequence, borrowing it from the buffer.
    pub fn read_byte_slice(&mut self) -> CodecResult<&[u8]> {
        let len = self.read_length()?;
        let start = self.position;
        self.position += len;
        Ok(&self.data[start..self.position])
    }

    /// Reads a length-prefixed byte sequence into a new vector.
    pub fn read_bytes(&mut self) -> CodecResult<Vec<u8>> {
        self.read_byte_slice().map(<[u8]>::to_vec)
    }

    /// Reads a length-prefixed byte sequence, or returns `Ok(None)` if the
    /// input ends early.
    pub fn try_read_bytes(&mut self) -> CodecResult<Option<Vec<u8>>> {
        self.attempt(Self::read_bytes)
    }

    /// Reads a length-prefixed UTF-8 string, borrowing it from the buffer.
    ///
    /// # Errors
    ///
    /// Besides the [`Reader::read_length`] failures, returns
    /// [`MalformedReason::InvalidUtf8`] if the bytes are not UTF-8.
    pub fn read_str(&mut self) -> CodecResult<&str> {
        let start = self.position;
        let len = self.read_length()?;
        let body = self.position;
        match std::str::from_utf8(&self.data[body..body + len]) {
            Ok(text) => {
                self.position = body + len;
                Ok(text)
            }
            Err(err) => {
                self.position = start;
                Err(CodecError::Malformed(MalformedReason::InvalidUtf8 {
                    valid_up_to: err.valid_up_to(),
                }))
            }
        }
    }

    /// Reads a length-prefixed UTF-8 string into a new `String`.
    pub fn read_string(&mut self) -> CodecResult<String> {
        self.read_str().map(str::to_owned)
    }

    /// Reads a length-prefixed UTF-8 string, or returns `Ok(None)` if the
    /// input ends early.
    pub fn try_read_string(&mut self) -> CodecResult<Option<String>> {
        self.attempt(Self::read_string)
    }

    // Nesting and typed values

    /// Reads a length-prefixed sub-message with `body`.
    ///
    /// Enters one nesting level, narrows the view to the declared length and
    /// runs `body`, which must consume the whole span. The view and the depth
    /// are restored whether or not `body` succeeds.
    ///
    /// # Errors
    ///
    /// Fails with [`CodecError::RecursionLimitExceeded`] when nested too
    /// deeply, with [`CodecError::MoreDataAvailable`] when `body` leaves bytes
    /// unread, or with whatever `body` returns.
    pub fn read_nested<T, F>(&mut self, body: F) -> CodecResult<T>
    where
        F: FnOnce(&mut Self) -> CodecResult<T>,
    {
        self.increase_recursion_depth()?;
        let result = self.read_scoped(body);
        self.recursion_depth -= 1;
        result
    }

    fn read_scoped<T, F>(&mut self, body: F) -> CodecResult<T>
    where
        F: FnOnce(&mut Self) -> CodecResult<T>,
    {
        let len = self.read_length()?;
        let saved = self.push_view();
        self.adjust_view(len)?;

        let result = body(self).and_then(|value| {
            if self.at_end() {
                Ok(value)
            } else {
                Err(CodecError::MoreDataAvailable {
                    remaining: self.readable_len(),
                })
            }
        });
        let restored = self.pop_view(saved);
        let value = result?;
        restored.map(|()| value)
    }

    /// Reads a value through its [`Decode`] implementation.
    pub fn read<T: Decode>(&mut self) -> CodecResult<T> {
        T::decode(self)
    }

    /// Reads a value, or returns `Ok(None)` without moving the cursor if the
    /// input ends early.
    pub fn try_read<T: Decode>(&mut self) -> CodecResult<Option<T>> {
        T::try_decode(self)
    }

    /// Reads a Counter element count followed by that many values.
    ///
    /// The count is checked against the collection ceiling before anything is
    /// allocated.
    pub fn read_seq<T: Decode>(&mut self) -> CodecResult<Vec<T>> {
        let count = self.read_collection_count()?;
        let mut items = Vec::with_capacity(count.min(self.readable_len()));
        for _ in 0..count {
            items.push(T::decode(self)?);
        }
        Ok(items)
    }
}

fn non_negative(declared: i64) -> CodecResult<usize> {
    usize::try_from(declared).map_err(|_| {
        debug!(declared, "negative size");
        CodecError::NegativeSize { size: declared }
    })
}

const fn validate_recursion_limit(limit: u32) -> CodecResult<()> {
    if limit > MAX_RECURSION_LIMIT {
        return Err(CodecError::Misuse(MisuseReason::RecursionLimitOutOfRange { limit }));
    }
    Ok(())
}
