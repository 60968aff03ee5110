//! Table header layout and constants.

use bytestream::{varint, Reader, Writer};

use crate::error::{TableError, TableResult};

/// Current table format version.
pub const FORMAT_VERSION: u32 = 100;

/// Smallest possible header: version(4) + flags(1) + one-byte row count.
pub const HEADER_MIN_SIZE: usize = 4 + 1 + 1;

/// Header flag byte.
///
/// Every bit is reserved in version 100 and must be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableFlags(u8);

impl TableFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);

    const RESERVED_MASK: u8 = 0xFF;

    /// Creates flags from a raw byte.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw flag byte.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns `true` if no reserved bits are set.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 & Self::RESERVED_MASK == 0
    }
}

/// Table header: `fixed32 version | fixed8 flags | Counter row_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableHeader {
    /// Format version, always [`FORMAT_VERSION`] when written by this crate.
    pub version: u32,
    /// Reserved flags.
    pub flags: TableFlags,
    /// Number of rows that follow.
    pub row_count: usize,
}

impl TableHeader {
    /// Creates a current-version header for `row_count` rows.
    #[must_use]
    pub const fn new(row_count: usize) -> Self {
        Self {
            version: FORMAT_VERSION,
            flags: TableFlags::NONE,
            row_count,
        }
    }

    /// Number of bytes this header occupies on the wire.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        4 + 1 + varint::counter_len(self.row_count)
    }

    /// Writes the header.
    pub fn encode(&self, writer: &mut Writer<'_>) -> TableResult<()> {
        writer.write_fixed32(self.version)?;
        writer.write_fixed8(self.flags.raw())?;
        writer.write_counter32(self.row_count)?;
        Ok(())
    }

    /// Reads and validates a header.
    ///
    /// The row count is checked against the reader's collection ceiling
    /// before any row is decoded.
    ///
    /// # Errors
    ///
    /// [`TableError::UnsupportedVersion`] for any version other than
    /// [`FORMAT_VERSION`], [`TableError::InvalidFlags`] if reserved bits are
    /// set, and [`TableError::Codec`] for truncation or an oversized count.
    pub fn decode(reader: &mut Reader<'_>) -> TableResult<Self> {
        let version = reader.read_fixed32()?;
        if version != FORMAT_VERSION {
            return Err(TableError::UnsupportedVersion { found: version });
        }
        let flags = TableFlags::from_raw(reader.read_fixed8()?);
        if !flags.is_valid() {
            return Err(TableError::InvalidFlags { flags: flags.raw() });
        }
        let row_count = reader.read_collection_count()?;
        Ok(Self {
            version,
            flags,
            row_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use bytestream::CodecError;

    use super::*;

    #[test]
    fn version_is_one_hundred() {
        assert_eq!(FORMAT_VERSION, 100);
    }

    #[test]
    fn empty_header_layout() {
        let mut writer = Writer::new();
        TableHeader::new(0).encode(&mut writer).unwrap();
        assert_eq!(writer.as_bytes(), &[0x64, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(writer.len(), HEADER_MIN_SIZE);
    }

    #[test]
    fn encoded_len_tracks_row_count() {
        for rows in [0, 63, 64, 8191, 8192] {
            let header = TableHeader::new(rows);
            let mut writer = Writer::new();
            header.encode(&mut writer).unwrap();
            assert_eq!(writer.len(), header.encoded_len(), "rows {rows}");
        }
    }

    #[test]
    fn decode_roundtrip() {
        let mut writer = Writer::new();
        TableHeader::new(3).encode(&mut writer).unwrap();
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        assert_eq!(TableHeader::decode(&mut reader).unwrap(), TableHeader::new(3));
        assert!(reader.at_end());
    }

    #[test]
    fn rejects_other_versions() {
        let bytes = [0x65, 0, 0, 0, 0, 0];
        let err = TableHeader::decode(&mut Reader::new(&bytes)).unwrap_err();
        assert_eq!(err, TableError::UnsupportedVersion { found: 101 });
    }

    #[test]
    fn rejects_reserved_flags() {
        let bytes = [0x64, 0, 0, 0, 0x01, 0];
        let err = TableHeader::decode(&mut Reader::new(&bytes)).unwrap_err();
        assert_eq!(err, TableError::InvalidFlags { flags: 1 });
    }

    #[test]
    fn rejects_negative_row_count() {
        // Counter 1 is zig-zag for -1.
        let bytes = [0x64, 0, 0, 0, 0, 0x01];
        let err = TableHeader::decode(&mut Reader::new(&bytes)).unwrap_err();
        assert_eq!(err, TableError::Codec(CodecError::NegativeSize { size: -1 }));
    }

    #[test]
    fn flags_default_is_valid() {
        assert!(TableFlags::default().is_valid());
        assert!(!TableFlags::from_raw(0x80).is_valid());
    }
}
