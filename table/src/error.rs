//! Error types for table messages.

use std::fmt;

use bytestream::CodecError;

use crate::field::FieldKind;

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Errors raised while encoding or decoding a table message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TableError {
    /// The underlying byte stream failed.
    Codec(CodecError),

    /// The message carries a format version this crate does not read.
    UnsupportedVersion { found: u32 },

    /// Reserved flag bits are set.
    InvalidFlags { flags: u8 },

    /// A row has a different number of values than there are columns.
    FieldCountMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A value does not match its column's kind.
    FieldKindMismatch {
        row: usize,
        column: usize,
        expected: FieldKind,
        found: FieldKind,
    },

    /// The number of rows written differs from the count in the header.
    RowCountMismatch { declared: usize, actual: usize },

    /// Bytes remain after the last declared row.
    TrailingData { remaining: usize },
}

impl TableError {
    /// Returns the byte-stream error behind this one, if any.
    #[must_use]
    pub const fn as_codec(&self) -> Option<&CodecError> {
        match self {
            Self::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(err) => write!(f, "codec error: {err}"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported table format version: {found}")
            }
            Self::InvalidFlags { flags } => write!(f, "invalid table flags: 0x{flags:02X}"),
            Self::FieldCountMismatch {
                row,
                expected,
                actual,
            } => {
                write!(f, "row {row} has {actual} values, expected {expected}")
            }
            Self::FieldKindMismatch {
                row,
                column,
                expected,
                found,
            } => {
                write!(
                    f,
                    "row {row} column {column}: expected {expected} value, found {found}"
                )
            }
            Self::RowCountMismatch { declared, actual } => {
                write!(f, "header declares {declared} rows but {actual} were written")
            }
            Self::TrailingData { remaining } => {
                write!(f, "{remaining} trailing bytes after last row")
            }
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CodecError> for TableError {
    fn from(err: CodecError) -> Self {
        Self::Codec(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn display_version() {
        let err = TableError::UnsupportedVersion { found: 7 };
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn display_kind_mismatch() {
        let err = TableError::FieldKindMismatch {
            row: 3,
            column: 1,
            expected: FieldKind::Int32,
            found: FieldKind::String,
        };
        let msg = err.to_string();
        assert!(msg.contains("int32"));
        assert!(msg.contains("string"));
        assert!(msg.contains("row 3"));
    }

    #[test]
    fn codec_errors_convert_and_chain() {
        let err: TableError = CodecError::TruncatedMessage {
            needed: 4,
            available: 1,
        }
        .into();
        assert!(err.source().is_some());
        assert!(err.as_codec().is_some_and(CodecError::is_truncation));
        assert!(TableError::TrailingData { remaining: 1 }.source().is_none());
    }
}
