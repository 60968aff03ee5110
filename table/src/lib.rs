//! Versioned row tables on top of the litewire byte stream.
//!
//! A table message carries a fixed header followed by rows of typed values:
//!
//! ```text
//! fixed32 version (100) | fixed8 flags (0) | Counter row_count | rows...
//! ```
//!
//! Column kinds are agreed out of band and passed to both sides as a slice of
//! [`FieldKind`].
//!
//! # Design Principles
//!
//! - **Versioned header** - Unknown versions and reserved flag bits are rejected.
//! - **Bounded decoding** - The row count is checked against the collection
//!   ceiling before any row is decoded.
//! - **Whole-message checks** - Trailing bytes after the last row are an error.
//!
//! # Example
//!
//! ```
//! use bytestream::CodecConfig;
//! use table::{decode_table, encode_table, FieldKind, FieldValue};
//!
//! let kinds = [FieldKind::Int32, FieldKind::String];
//! let rows = vec![vec![FieldValue::Int32(1), FieldValue::from("café")]];
//!
//! let config = CodecConfig::default();
//! let bytes = encode_table(&kinds, &rows, &config).unwrap();
//! assert_eq!(decode_table(&bytes, &kinds, &config).unwrap(), rows);
//! ```

mod error;
mod field;
mod header;
mod table;

pub use error::{TableError, TableResult};
pub use field::{FieldKind, FieldValue, ParseFieldKindError};
pub use header::{TableFlags, TableHeader, FORMAT_VERSION, HEADER_MIN_SIZE};
pub use table::{decode_header, decode_table, encode_table, Row, TableReader, TableWriter};
