//! Error types for byte stream operations.

use std::fmt;

/// Result type for byte stream operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding a message.
///
/// Every failure raised by the buffer, writer, reader and typed accessors
/// belongs to this one family. Decoding failures describe corrupt or hostile
/// input; [`CodecError::Misuse`] describes a broken API contract on the
/// caller's side.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    /// The input ended in the middle of a field.
    TruncatedMessage {
        /// Number of bytes the field needed.
        needed: usize,
        /// Number of bytes left in the current view.
        available: usize,
    },

    /// A varint was longer than its type allows or carried bits past the type width.
    MalformedVarint {
        /// Maximum encoded length for the requested width.
        max_len: usize,
    },

    /// A length or count prefix decoded to a negative value.
    NegativeSize {
        /// The decoded value.
        size: i64,
    },

    /// A declared or written size exceeded the configured message ceiling.
    MessageInSizeLimited {
        /// The offending size in bytes.
        size: usize,
        /// The configured maximum message length.
        limit: usize,
    },

    /// A declared element count exceeded the configured collection ceiling.
    CollectionCountLimited {
        /// The declared count.
        count: usize,
        /// The configured maximum element count.
        limit: usize,
    },

    /// Nested messages went deeper than the reader's recursion limit.
    RecursionLimitExceeded {
        /// The configured recursion limit.
        limit: u32,
    },

    /// The recursion depth was decreased more often than it was increased.
    UnderflowRecursionDepth,

    /// A field identifier was outside `1..=u32::MAX`.
    InvalidFieldId {
        /// The rejected identifier.
        field_id: i64,
    },

    /// A scoped sub-message finished while bytes of its declared span were unread.
    MoreDataAvailable {
        /// Unread bytes left in the span.
        remaining: usize,
    },

    /// A tag byte did not name any known variant.
    InvalidTag {
        /// The rejected tag.
        tag: u8,
    },

    /// A value was well-framed but its content is invalid.
    Malformed(MalformedReason),

    /// The API was used in a way its contract forbids.
    Misuse(MisuseReason),
}

/// Details for [`CodecError::Malformed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// String bytes were not valid UTF-8.
    InvalidUtf8 {
        /// Length of the valid prefix.
        valid_up_to: usize,
    },
    /// A network address length byte was neither 4 nor 16.
    InvalidAddressLength {
        /// The rejected length byte.
        len: u8,
    },
    /// A length-prefixed 128-bit identifier did not declare 16 bytes.
    InvalidIdentifierLength {
        /// The declared length.
        len: usize,
    },
}

/// Details for [`CodecError::Misuse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MisuseReason {
    /// The buffer is backed by external storage and cannot grow.
    BufferNotGrowable {
        /// Requested length in bytes.
        requested: usize,
        /// Fixed capacity of the external storage.
        capacity: usize,
    },
    /// External storage was attached to a buffer that already owns storage.
    StorageAlreadyOwned,
    /// A position or range fell outside the accessible region.
    OutOfRange {
        /// Start of the rejected range.
        pos: usize,
        /// Length of the rejected range.
        len: usize,
        /// End of the accessible region.
        limit: usize,
    },
    /// A saved view ends before the current one; it is stale or popped out of order.
    StaleView {
        /// End of the saved view.
        saved_end: usize,
        /// End of the current view.
        current_end: usize,
    },
    /// A recursion limit outside `0..=MAX_RECURSION_LIMIT` was requested.
    RecursionLimitOutOfRange {
        /// The rejected limit.
        limit: u32,
    },
    /// The written length can only move backward.
    TruncateForward {
        /// Requested length.
        requested: usize,
        /// Current written length.
        written: usize,
    },
}

impl CodecError {
    /// Shorthand for a [`CodecError::Misuse`] out-of-range error.
    pub(crate) const fn out_of_range(pos: usize, len: usize, limit: usize) -> Self {
        Self::Misuse(MisuseReason::OutOfRange { pos, len, limit })
    }

    /// Returns `true` if the error came from input ending early.
    #[must_use]
    pub const fn is_truncation(&self) -> bool {
        matches!(self, Self::TruncatedMessage { .. })
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedMessage { needed, available } => {
                write!(
                    f,
                    "truncated message: field needs {needed} bytes but only {available} remain"
                )
            }
            Self::MalformedVarint { max_len } => {
                write!(f, "malformed varint: longer than {max_len} bytes or overflowing")
            }
            Self::NegativeSize { size } => {
                write!(f, "embedded string or message claimed negative size {size}")
            }
            Self::MessageInSizeLimited { size, limit } => {
                write!(f, "message too large: {size} bytes exceeds limit {limit}")
            }
            Self::CollectionCountLimited { count, limit } => {
                write!(f, "collection count {count} exceeds limit {limit}")
            }
            Self::RecursionLimitExceeded { limit } => {
                write!(f, "message nesting exceeded recursion limit {limit}")
            }
            Self::UnderflowRecursionDepth => {
                write!(f, "recursion depth decreased below zero")
            }
            Self::InvalidFieldId { field_id } => {
                write!(f, "invalid field id {field_id}, must be in 1..=4294967295")
            }
            Self::MoreDataAvailable { remaining } => {
                write!(
                    f,
                    "finished reading a message with {remaining} bytes of its span unread"
                )
            }
            Self::InvalidTag { tag } => write!(f, "invalid tag: {tag}"),
            Self::Malformed(reason) => write!(f, "malformed value: {reason}"),
            Self::Misuse(reason) => write!(f, "api misuse: {reason}"),
        }
    }
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUtf8 { valid_up_to } => {
                write!(f, "invalid utf-8 after {valid_up_to} bytes")
            }
            Self::InvalidAddressLength { len } => {
                write!(f, "address length {len} is neither 4 nor 16")
            }
            Self::InvalidIdentifierLength { len } => {
                write!(f, "identifier length {len} is not 16")
            }
        }
    }
}

impl fmt::Display for MisuseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferNotGrowable {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "external buffer cannot grow: requested {requested} bytes, capacity {capacity}"
                )
            }
            Self::StorageAlreadyOwned => {
                write!(f, "cannot attach external storage to a buffer that owns storage")
            }
            Self::OutOfRange { pos, len, limit } => {
                write!(f, "range {pos}+{len} is outside 0..{limit}")
            }
            Self::StaleView {
                saved_end,
                current_end,
            } => {
                write!(
                    f,
                    "saved view ends at {saved_end}, before current view end {current_end}"
                )
            }
            Self::RecursionLimitOutOfRange { limit } => {
                write!(f, "recursion limit {limit} is outside 0..=1024")
            }
            Self::TruncateForward { requested, written } => {
                write!(
                    f,
                    "cannot extend written length from {written} to {requested} without writing"
                )
            }
        }
    }
}

impl std::error::Error for CodecError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_truncated() {
        let err = CodecError::TruncatedMessage {
            needed: 8,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("8 bytes"), "should mention needed bytes");
        assert!(msg.contains('3'), "should mention available bytes");
        assert!(msg.contains("truncated"));
    }

    #[test]
    fn error_display_size_limited() {
        let err = CodecError::MessageInSizeLimited {
            size: 2048,
            limit: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("2048"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn error_display_misuse_not_growable() {
        let err = CodecError::Misuse(MisuseReason::BufferNotGrowable {
            requested: 100,
            capacity: 64,
        });
        let msg = err.to_string();
        assert!(msg.contains("cannot grow"));
        assert!(msg.contains("100"));
        assert!(msg.contains("64"));
    }

    #[test]
    fn error_display_malformed_utf8() {
        let err = CodecError::Malformed(MalformedReason::InvalidUtf8 { valid_up_to: 2 });
        assert!(err.to_string().contains("utf-8"));
    }

    #[test]
    fn error_equality() {
        let err1 = CodecError::NegativeSize { size: -1 };
        let err2 = CodecError::NegativeSize { size: -1 };
        let err3 = CodecError::NegativeSize { size: -2 };
        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }

    #[test]
    fn truncation_predicate() {
        assert!(CodecError::TruncatedMessage {
            needed: 1,
            available: 0
        }
        .is_truncation());
        assert!(!CodecError::MalformedVarint { max_len: 5 }.is_truncation());
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<CodecError>();
    }
}
