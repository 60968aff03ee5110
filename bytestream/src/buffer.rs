//! Growable byte buffer with selectable growth policies.

use std::fmt;

use tracing::trace;

use crate::error::{CodecError, CodecResult, MisuseReason};

/// Rule used to pick a new capacity when a buffer must grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GrowthPolicy {
    /// Slack of one eighth of the current length, clamped to `4..=1024` bytes.
    #[default]
    Normal,
    /// Slack of one eighth of the current length, at least 64 bytes.
    ForSpeed,
    /// No slack: capacity tracks the requested length exactly.
    ForMemoryUsage,
}

impl GrowthPolicy {
    /// Computes the capacity to allocate for a buffer currently holding
    /// `current_len` bytes that must hold `desired` bytes.
    ///
    /// The result is never below `min_capacity` and never below `desired`.
    #[must_use]
    pub fn recommended_capacity(self, current_len: usize, desired: usize, min_capacity: usize) -> usize {
        let expand = match self {
            Self::Normal => (current_len / 8).clamp(4, 1024),
            Self::ForSpeed => (current_len / 8).max(64),
            Self::ForMemoryUsage => 0,
        };
        min_capacity.max(desired.saturating_add(expand))
    }
}

enum Storage<'a> {
    /// Owned bytes; the vector length is the capacity.
    Owned(Vec<u8>),
    /// Caller-provided bytes with a fixed capacity.
    External(&'a mut [u8]),
}

/// An append/resize-capable byte container.
///
/// The buffer distinguishes its *length* (bytes in use) from its *capacity*
/// (bytes backed by storage). Growing past the capacity reallocates owned
/// storage according to the [`GrowthPolicy`]; shrinking only moves the length.
///
/// A buffer can instead be backed by an external slice. Such a buffer never
/// grows: any request beyond the slice length fails with
/// [`MisuseReason::BufferNotGrowable`].
pub struct GrowableBuffer<'a> {
    storage: Storage<'a>,
    len: usize,
    min_capacity: usize,
    growth_policy: GrowthPolicy,
}

impl Default for GrowableBuffer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> GrowableBuffer<'a> {
    /// Creates an empty buffer with no storage.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_policy(GrowthPolicy::Normal)
    }

    /// Creates an empty buffer that grows with `policy`.
    #[must_use]
    pub const fn with_policy(growth_policy: GrowthPolicy) -> Self {
        Self {
            storage: Storage::Owned(Vec::new()),
            len: 0,
            min_capacity: 0,
            growth_policy,
        }
    }

    /// Creates an empty buffer with `capacity` bytes of zeroed storage.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Storage::Owned(vec![0; capacity]),
            len: 0,
            min_capacity: 0,
            growth_policy: GrowthPolicy::Normal,
        }
    }

    /// Creates a buffer of `len` zeroed bytes with exactly that capacity.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self {
            storage: Storage::Owned(vec![0; len]),
            len,
            min_capacity: 0,
            growth_policy: GrowthPolicy::Normal,
        }
    }

    /// Creates an owned buffer holding a copy of `data`.
    #[must_use]
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            storage: Storage::Owned(data.to_vec()),
            len: data.len(),
            min_capacity: 0,
            growth_policy: GrowthPolicy::Normal,
        }
    }

    /// Creates an empty buffer backed by `storage`, which fixes its capacity.
    #[must_use]
    pub fn external(storage: &'a mut [u8]) -> Self {
        Self {
            storage: Storage::External(storage),
            len: 0,
            min_capacity: 0,
            growth_policy: GrowthPolicy::Normal,
        }
    }

    /// Attaches external storage to a buffer that has none yet.
    ///
    /// Attaching an empty slice is a no-op. The buffer length is reset to zero.
    ///
    /// # Errors
    ///
    /// Returns [`MisuseReason::StorageAlreadyOwned`] if the buffer already
    /// holds storage of either kind.
    pub fn attach_external(&mut self, storage: &'a mut [u8]) -> CodecResult<()> {
        if self.capacity() > 0 || self.is_external() {
            return Err(CodecError::Misuse(MisuseReason::StorageAlreadyOwned));
        }
        if storage.is_empty() {
            return Ok(());
        }
        self.storage = Storage::External(storage);
        self.len = 0;
        Ok(())
    }

    /// Returns the number of bytes in use.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bytes are in use.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of bytes backed by storage.
    #[must_use]
    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Owned(bytes) => bytes.len(),
            Storage::External(bytes) => bytes.len(),
        }
    }

    /// Returns `true` if the buffer is backed by external storage.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(self.storage, Storage::External(_))
    }

    /// Returns the growth policy.
    #[must_use]
    pub const fn growth_policy(&self) -> GrowthPolicy {
        self.growth_policy
    }

    /// Changes the growth policy used by future reallocations.
    pub fn set_growth_policy(&mut self, growth_policy: GrowthPolicy) {
        self.growth_policy = growth_policy;
    }

    /// Returns the smallest capacity a reallocation will choose.
    #[must_use]
    pub const fn min_capacity(&self) -> usize {
        self.min_capacity
    }

    /// Sets the smallest capacity a reallocation will choose.
    pub fn set_min_capacity(&mut self, min_capacity: usize) {
        self.min_capacity = min_capacity;
    }

    /// Sets the number of bytes in use, growing storage if required.
    ///
    /// Bytes exposed by growing are zero when freshly allocated and otherwise
    /// hold whatever was last stored there.
    ///
    /// # Errors
    ///
    /// Returns [`MisuseReason::BufferNotGrowable`] if `len` exceeds the
    /// capacity of external storage.
    ///
    /// # Panics
    ///
    /// Panics if the allocator cannot provide the recommended capacity.
    pub fn set_len(&mut self, len: usize) -> CodecResult<()> {
        if len > self.capacity() {
            self.grow(len)?;
        }
        self.len = len;
        Ok(())
    }

    /// Shortens the length to `len`; does nothing if `len` is not shorter.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
        }
    }

    /// Sets the length to zero without releasing storage.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Appends `data` at the end.
    pub fn append(&mut self, data: &[u8]) -> CodecResult<()> {
        let start = self.reserve_tail(data.len())?;
        self.as_mut_slice()[start..].copy_from_slice(data);
        Ok(())
    }

    /// Extends the length by `len` bytes without initializing them and returns
    /// the offset of the first new byte.
    pub fn reserve_tail(&mut self, len: usize) -> CodecResult<usize> {
        let start = self.len;
        let end = start
            .checked_add(len)
            .ok_or_else(|| CodecError::out_of_range(start, len, start))?;
        self.set_len(end)?;
        Ok(start)
    }

    /// Inserts `data` at `pos`, shifting the tail right.
    pub fn insert(&mut self, pos: usize, data: &[u8]) -> CodecResult<()> {
        self.insert_uninit(pos, data.len())?;
        self.as_mut_slice()[pos..pos + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Opens a gap of `len` bytes at `pos`, shifting the tail right.
    ///
    /// The gap keeps whatever bytes were previously stored there.
    pub fn insert_uninit(&mut self, pos: usize, len: usize) -> CodecResult<()> {
        let old_len = self.len;
        let new_len = match old_len.checked_add(len) {
            Some(new_len) if pos <= old_len => new_len,
            _ => return Err(CodecError::out_of_range(pos, len, old_len)),
        };
        self.set_len(new_len)?;
        self.as_mut_slice().copy_within(pos..old_len, pos + len);
        Ok(())
    }

    /// Removes `len` bytes at `pos`, shifting the tail left.
    pub fn remove(&mut self, pos: usize, len: usize) -> CodecResult<()> {
        let old_len = self.len;
        match pos.checked_add(len) {
            Some(end) if end <= old_len => {
                self.as_mut_slice().copy_within(end..old_len, pos);
                self.len = old_len - len;
                Ok(())
            }
            _ => Err(CodecError::out_of_range(pos, len, old_len)),
        }
    }

    /// Returns the bytes in use.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(bytes) => &bytes[..self.len],
            Storage::External(bytes) => &bytes[..self.len],
        }
    }

    /// Returns the bytes in use, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let len = self.len;
        match &mut self.storage {
            Storage::Owned(bytes) => &mut bytes[..len],
            Storage::External(bytes) => &mut bytes[..len],
        }
    }

    /// Consumes the buffer and returns the bytes in use.
    ///
    /// Owned storage is truncated in place; external storage is copied.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        match self.storage {
            Storage::Owned(mut bytes) => {
                bytes.truncate(self.len);
                bytes
            }
            Storage::External(bytes) => bytes[..self.len].to_vec(),
        }
    }

    fn grow(&mut self, desired: usize) -> CodecResult<()> {
        let new_capacity =
            self.growth_policy
                .recommended_capacity(self.len, desired, self.min_capacity);
        match &mut self.storage {
            Storage::External(bytes) => Err(CodecError::Misuse(MisuseReason::BufferNotGrowable {
                requested: desired,
                capacity: bytes.len(),
            })),
            Storage::Owned(bytes) => {
                trace!(
                    from = bytes.len(),
                    to = new_capacity,
                    policy = ?self.growth_policy,
                    "growing buffer"
                );
                bytes.resize(new_capacity, 0);
                Ok(())
            }
        }
    }
}

/// Cloning always produces owned storage holding a copy of the bytes, so the
/// clone never aliases the source buffer. A clone of an externally backed buffer
/// is therefore growable.
impl Clone for GrowableBuffer<'_> {
    fn clone(&self) -> Self {
        let storage = match &self.storage {
            Storage::Owned(bytes) => bytes.clone(),
            Storage::External(bytes) => bytes.to_vec(),
        };
        Self {
            storage: Storage::Owned(storage),
            len: self.len,
            min_capacity: self.min_capacity,
            growth_policy: self.growth_policy,
        }
    }
}

impl fmt::Debug for GrowableBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowableBuffer")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("external", &self.is_external())
            .field("growth_policy", &self.growth_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_policy_clamps_slack() {
        let policy = GrowthPolicy::Normal;
        // Small buffers get at least 4 bytes of slack.
        assert_eq!(policy.recommended_capacity(0, 10, 0), 14);
        // One eighth of the current length in the middle range.
        assert_eq!(policy.recommended_capacity(800, 900, 0), 1000);
        // At most 1024 bytes of slack.
        assert_eq!(policy.recommended_capacity(100_000, 100_001, 0), 101_025);
    }

    #[test]
    fn speed_policy_has_large_slack() {
        let policy = GrowthPolicy::ForSpeed;
        assert_eq!(policy.recommended_capacity(0, 10, 0), 74);
        assert_eq!(policy.recommended_capacity(8000, 8001, 0), 9001);
    }

    #[test]
    fn memory_policy_has_no_slack() {
        let policy = GrowthPolicy::ForMemoryUsage;
        assert_eq!(policy.recommended_capacity(50, 77, 0), 77);
    }

    #[test]
    fn min_capacity_wins() {
        for policy in [
            GrowthPolicy::Normal,
            GrowthPolicy::ForSpeed,
            GrowthPolicy::ForMemoryUsage,
        ] {
            assert_eq!(policy.recommended_capacity(0, 1, 4096), 4096);
        }
    }

    #[test]
    fn set_len_grows_and_shrinks() {
        let mut buffer = GrowableBuffer::new();
        buffer.set_len(10).unwrap();
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.capacity(), 14);

        buffer.set_len(3).unwrap();
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.capacity(), 14, "shrinking keeps storage");
    }

    #[test]
    fn append_and_slice() {
        let mut buffer = GrowableBuffer::new();
        buffer.append(&[1, 2, 3]).unwrap();
        buffer.append(&[]).unwrap();
        buffer.append(&[4]).unwrap();
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn insert_shifts_tail() {
        let mut buffer = GrowableBuffer::from_slice(&[1, 2, 5]);
        buffer.insert(2, &[3, 4]).unwrap();
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4, 5]);

        buffer.insert(5, &[6]).unwrap();
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn insert_past_end_fails() {
        let mut buffer = GrowableBuffer::from_slice(&[1]);
        let err = buffer.insert(2, &[0]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Misuse(MisuseReason::OutOfRange { pos: 2, .. })
        ));
    }

    #[test]
    fn remove_shifts_tail() {
        let mut buffer = GrowableBuffer::from_slice(&[1, 2, 3, 4, 5]);
        buffer.remove(1, 2).unwrap();
        assert_eq!(buffer.as_slice(), &[1, 4, 5]);

        let err = buffer.remove(2, 2).unwrap_err();
        assert!(matches!(err, CodecError::Misuse(MisuseReason::OutOfRange { .. })));
    }

    #[test]
    fn external_buffer_cannot_grow() {
        let mut storage = [0u8; 4];
        let mut buffer = GrowableBuffer::external(&mut storage);
        buffer.append(&[9, 9, 9, 9]).unwrap();
        let err = buffer.append(&[1]).unwrap_err();
        assert_eq!(
            err,
            CodecError::Misuse(MisuseReason::BufferNotGrowable {
                requested: 5,
                capacity: 4
            })
        );
        assert_eq!(buffer.len(), 4, "failed growth leaves length unchanged");
        drop(buffer);
        assert_eq!(storage, [9, 9, 9, 9]);
    }

    #[test]
    fn attach_external_once() {
        let mut first = [0u8; 8];
        let mut second = [0u8; 8];
        let mut buffer = GrowableBuffer::new();
        buffer.attach_external(&mut first).unwrap();
        assert!(buffer.is_external());
        assert_eq!(buffer.capacity(), 8);

        let err = buffer.attach_external(&mut second).unwrap_err();
        assert_eq!(err, CodecError::Misuse(MisuseReason::StorageAlreadyOwned));
    }

    #[test]
    fn attach_external_after_owned_fails() {
        let mut storage = [0u8; 8];
        let mut buffer = GrowableBuffer::with_len(2);
        let err = buffer.attach_external(&mut storage).unwrap_err();
        assert_eq!(err, CodecError::Misuse(MisuseReason::StorageAlreadyOwned));
    }

    #[test]
    fn clone_does_not_alias() {
        let mut original = GrowableBuffer::from_slice(&[1, 2, 3]);
        let copy = original.clone();
        original.as_mut_slice()[0] = 42;
        assert_eq!(copy.as_slice(), &[1, 2, 3]);
        assert_eq!(original.as_slice(), &[42, 2, 3]);
    }

    #[test]
    fn clone_of_external_is_owned() {
        let mut storage = [0u8; 2];
        let mut buffer = GrowableBuffer::external(&mut storage);
        buffer.append(&[7, 8]).unwrap();
        let mut copy = buffer.clone();
        assert!(!copy.is_external());
        copy.append(&[9]).unwrap();
        assert_eq!(copy.as_slice(), &[7, 8, 9]);
    }

    #[test]
    fn into_vec_returns_used_bytes() {
        let mut buffer = GrowableBuffer::new();
        buffer.append(&[5, 6, 7]).unwrap();
        assert_eq!(buffer.into_vec(), vec![5, 6, 7]);
    }

    #[test]
    fn debug_omits_contents() {
        let buffer = GrowableBuffer::from_slice(&[0xAB; 3]);
        let debug = format!("{buffer:?}");
        assert!(debug.contains("GrowableBuffer"));
        assert!(debug.contains("len: 3"));
    }
}
