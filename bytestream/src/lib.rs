//! Compact binary wire codec for the litewire format.
//!
//! This crate provides a [`GrowableBuffer`], a [`Writer`] and a [`Reader`] that
//! encode and decode fixed-width integers, varints, zig-zag integers,
//! length-prefixed strings and byte sequences, and a few wide value types
//! (ticks, identifiers, network addresses).
//!
//! # Design Principles
//!
//! - **No unsafe code** - Bit reinterpretation uses `to_bits`/`from_bits`.
//! - **Little-endian on the wire** - Fixed-width values never depend on host byte order.
//! - **Validate before allocating** - Declared lengths are checked against the
//!   message ceiling and the remaining input before any buffer is created.
//! - **Explicit configuration** - Limits travel in a [`CodecConfig`] handed to
//!   each writer and reader; there is no global state.
//! - **Structured errors** - Every failure is a [`CodecError`] carrying the
//!   numbers involved.
//!
//! # Example
//!
//! ```
//! use bytestream::{Optimal, Reader, Writer};
//!
//! let mut writer = Writer::new();
//! writer.write(&7u32).unwrap();
//! writer.write("café").unwrap();
//! writer.write(&Optimal(-2i32)).unwrap();
//!
//! let bytes = writer.into_bytes();
//!
//! let mut reader = Reader::new(&bytes);
//! assert_eq!(reader.read::<u32>().unwrap(), 7);
//! assert_eq!(reader.read_str().unwrap(), "café");
//! assert_eq!(reader.read::<Optimal<i32>>().unwrap().0, -2);
//! assert!(reader.at_end());
//! ```

mod buffer;
mod config;
mod encoding;
mod error;
mod reader;
mod types;
pub mod varint;
mod writer;

pub use buffer::{GrowableBuffer, GrowthPolicy};
pub use config::{
    CodecConfig, UuidFormat, DEFAULT_MAX_COLLECTION_COUNT, DEFAULT_MAX_MESSAGE_LEN,
    DEFAULT_MIN_INITIAL_LEN, DEFAULT_RECURSION_LIMIT, MAX_RECURSION_LIMIT,
};
pub use encoding::{Decode, Encode};
pub use error::{CodecError, CodecResult, MalformedReason, MisuseReason};
pub use reader::{Reader, View};
pub use types::{DateTime, Optimal, TimeSpan};
pub use uuid::Uuid;
pub use writer::Writer;
