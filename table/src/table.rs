//! Table encoding and decoding.
//!
//! A table message is a [`TableHeader`] followed by `row_count` rows. Each row
//! holds one value per column, in column order, with no per-row framing. The
//! column kinds are not stored; both sides must agree on them.

use bytestream::{CodecConfig, CodecError, Reader, Writer};
use tracing::{debug, trace};

use crate::error::{TableError, TableResult};
use crate::field::{FieldKind, FieldValue};
use crate::header::TableHeader;

/// One decoded row.
pub type Row = Vec<FieldValue>;

/// Checks that `row` has one value of the right kind per column.
fn check_row(kinds: &[FieldKind], row: &[FieldValue], index: usize) -> TableResult<()> {
    if row.len() != kinds.len() {
        return Err(TableError::FieldCountMismatch {
            row: index,
            expected: kinds.len(),
            actual: row.len(),
        });
    }
    for (column, (kind, value)) in kinds.iter().zip(row).enumerate() {
        if value.kind() != *kind {
            return Err(TableError::FieldKindMismatch {
                row: index,
                column,
                expected: *kind,
                found: value.kind(),
            });
        }
    }
    Ok(())
}

/// Streams rows into a table message.
///
/// The row count is fixed up front and written into the header immediately;
/// [`TableWriter::finish`] fails unless exactly that many rows were written.
#[derive(Debug)]
pub struct TableWriter<'k> {
    writer: Writer<'static>,
    kinds: &'k [FieldKind],
    declared: usize,
    written: usize,
}

impl<'k> TableWriter<'k> {
    /// Starts a table with `row_count` rows of `kinds`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::CollectionCountLimited`] if `row_count` exceeds
    /// the configured collection ceiling, since no reader with the same
    /// configuration could accept it.
    pub fn new(
        kinds: &'k [FieldKind],
        row_count: usize,
        config: &CodecConfig,
    ) -> TableResult<Self> {
        if row_count > config.max_collection_count {
            return Err(CodecError::CollectionCountLimited {
                count: row_count,
                limit: config.max_collection_count,
            }
            .into());
        }
        let mut writer = Writer::with_config(config);
        TableHeader::new(row_count).encode(&mut writer)?;
        Ok(Self {
            writer,
            kinds,
            declared: row_count,
            written: 0,
        })
    }

    /// Column kinds this table was started with.
    #[must_use]
    pub const fn kinds(&self) -> &'k [FieldKind] {
        self.kinds
    }

    /// Rows written so far.
    #[must_use]
    pub const fn rows_written(&self) -> usize {
        self.written
    }

    /// Bytes written so far, header included.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.writer.len()
    }

    /// Returns `true` if nothing has been written, which never holds once
    /// the header is in place.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    /// Appends one row.
    ///
    /// The row is validated in full before any byte is written, and a row
    /// that fails to encode is removed again, so a failed call leaves the
    /// message as it was.
    pub fn write_row(&mut self, row: &[FieldValue]) -> TableResult<()> {
        if self.written == self.declared {
            return Err(TableError::RowCountMismatch {
                declared: self.declared,
                actual: self.written + 1,
            });
        }
        check_row(self.kinds, row, self.written)?;

        let start = self.writer.len();
        let result = row.iter().try_for_each(|value| value.encode(&mut self.writer));
        if let Err(err) = result {
            self.writer.set_len(start)?;
            return Err(err.into());
        }
        trace!(row = self.written, bytes = self.writer.len() - start, "row written");
        self.written += 1;
        Ok(())
    }

    /// Completes the message and returns its bytes.
    pub fn finish(self) -> TableResult<Vec<u8>> {
        if self.written != self.declared {
            return Err(TableError::RowCountMismatch {
                declared: self.declared,
                actual: self.written,
            });
        }
        let bytes = self.writer.into_bytes();
        debug!(rows = self.written, bytes = bytes.len(), "table encoded");
        Ok(bytes)
    }
}

/// Reads rows out of a table message.
///
/// Iterating yields each row in turn. After the last declared row the reader
/// checks that the input is exhausted and reports
/// [`TableError::TrailingData`] otherwise. Iteration stops after the first
/// error.
#[derive(Debug)]
pub struct TableReader<'b, 'k> {
    reader: Reader<'b>,
    kinds: &'k [FieldKind],
    header: TableHeader,
    read: usize,
    done: bool,
}

impl<'b, 'k> TableReader<'b, 'k> {
    /// Reads the header of `bytes` and prepares to decode rows of `kinds`.
    pub fn new(bytes: &'b [u8], kinds: &'k [FieldKind], config: &CodecConfig) -> TableResult<Self> {
        let mut reader = Reader::with_config(bytes, config)?;
        let header = TableHeader::decode(&mut reader)?;
        debug!(rows = header.row_count, bytes = bytes.len(), "table header read");
        Ok(Self {
            reader,
            kinds,
            header,
            read: 0,
            done: false,
        })
    }

    /// The decoded header.
    #[must_use]
    pub const fn header(&self) -> &TableHeader {
        &self.header
    }

    /// Rows not yet read.
    #[must_use]
    pub const fn remaining_rows(&self) -> usize {
        self.header.row_count - self.read
    }

    /// Reads the next row, or returns `Ok(None)` once every declared row has
    /// been read and the input is exhausted.
    pub fn read_row(&mut self) -> TableResult<Option<Row>> {
        if self.read == self.header.row_count {
            if !self.reader.at_end() {
                return Err(TableError::TrailingData {
                    remaining: self.reader.readable_len(),
                });
            }
            return Ok(None);
        }
        let row = self
            .kinds
            .iter()
            .map(|kind| FieldValue::decode(*kind, &mut self.reader))
            .collect::<Result<Row, _>>()?;
        self.read += 1;
        Ok(Some(row))
    }

    /// Reads every remaining row and checks for trailing bytes.
    pub fn read_to_end(mut self) -> TableResult<Vec<Row>> {
        let mut rows = Vec::with_capacity(self.remaining_rows().min(self.reader.readable_len()));
        while let Some(row) = self.read_row()? {
            rows.push(row);
        }
        Ok(rows)
    }
}

impl Iterator for TableReader<'_, '_> {
    type Item = TableResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Encodes `rows` as a complete table message.
pub fn encode_table(
    kinds: &[FieldKind],
    rows: &[Row],
    config: &CodecConfig,
) -> TableResult<Vec<u8>> {
    let mut writer = TableWriter::new(kinds, rows.len(), config)?;
    for row in rows {
        writer.write_row(row)?;
    }
    writer.finish()
}

/// Decodes a complete table message whose columns are `kinds`.
pub fn decode_table(bytes: &[u8], kinds: &[FieldKind], config: &CodecConfig) -> TableResult<Vec<Row>> {
    TableReader::new(bytes, kinds, config)?.read_to_end()
}

/// Reads only the header of a table message.
pub fn decode_header(bytes: &[u8], config: &CodecConfig) -> TableResult<TableHeader> {
    let mut reader = Reader::with_config(bytes, config)?;
    TableHeader::decode(&mut reader)
}
