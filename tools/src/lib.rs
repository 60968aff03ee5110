//! Inspection, decoding and encoding tools for litewire table files.
//!
//! The binary is a thin shell over the functions here:
//!
//! - Inspect a table header and its size breakdown
//! - Decode rows to JSON or a pretty-printed grid
//! - Encode JSON rows into a table file
//!
//! # Design Principles
//!
//! - **Same codec as production** - Everything goes through the `table` and
//!   `bytestream` crates with an explicit [`CodecConfig`].
//! - **Human-readable output** - Make it easy to see what a file contains.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use bytestream::{CodecConfig, DateTime, TimeSpan, Uuid};
use serde::Serialize;
use serde_json::Value;
use table::{FieldKind, FieldValue, Row, TableHeader};
use tracing::debug;

/// Size breakdown of one table file.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub header: TableHeader,
    pub header_len: usize,
    pub body_len: usize,
    pub total_len: usize,
}

/// Decoded rows plus the header they came from.
#[derive(Debug, Clone, Serialize)]
pub struct DecodeOutput {
    pub header: TableHeader,
    pub columns: Vec<FieldKind>,
    pub rows: Vec<Vec<Value>>,
}

/// Reads a [`CodecConfig`] from a JSON file. Missing fields keep their
/// defaults.
pub fn load_config(path: &Path) -> Result<CodecConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let config: CodecConfig = serde_json::from_str(&contents).context("parse config json")?;
    debug!(?config, "loaded codec config");
    Ok(config)
}

/// Parses a comma-separated column list such as `int32,string,enum`.
pub fn parse_columns(list: &str) -> Result<Vec<FieldKind>> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| name.parse::<FieldKind>().map_err(anyhow::Error::from))
        .collect()
}

/// Reads the header of `bytes` and reports how the bytes are split.
pub fn inspect_table(bytes: &[u8], config: &CodecConfig) -> Result<InspectReport> {
    let header = table::decode_header(bytes, config).context("decode table header")?;
    let header_len = header.encoded_len();
    Ok(InspectReport {
        header,
        header_len,
        body_len: bytes.len() - header_len,
        total_len: bytes.len(),
    })
}

/// Decodes every row of `bytes` into JSON values.
pub fn decode_table_json(
    bytes: &[u8],
    columns: &[FieldKind],
    config: &CodecConfig,
) -> Result<DecodeOutput> {
    let header = table::decode_header(bytes, config).context("decode table header")?;
    let rows = table::decode_table(bytes, columns, config).context("decode table rows")?;
    Ok(DecodeOutput {
        header,
        columns: columns.to_vec(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(value_to_json).collect())
            .collect(),
    })
}

/// Encodes a JSON array of row arrays as a table message.
pub fn encode_table_json(
    rows: &Value,
    columns: &[FieldKind],
    config: &CodecConfig,
) -> Result<Vec<u8>> {
    let Some(rows) = rows.as_array() else {
        bail!("expected a JSON array of rows");
    };
    let rows = rows
        .iter()
        .enumerate()
        .map(|(index, row)| row_from_json(row, columns).with_context(|| format!("row {index}")))
        .collect::<Result<Vec<Row>>>()?;
    table::encode_table(columns, &rows, config).context("encode table")
}

fn row_from_json(row: &Value, columns: &[FieldKind]) -> Result<Row> {
    let Some(cells) = row.as_array() else {
        bail!("expected an array of {} values", columns.len());
    };
    if cells.len() != columns.len() {
        bail!("expected {} values, found {}", columns.len(), cells.len());
    }
    columns
        .iter()
        .zip(cells)
        .enumerate()
        .map(|(column, (kind, cell))| {
            value_from_json(*kind, cell).with_context(|| format!("column {column}"))
        })
        .collect()
}

/// Converts a cell to JSON.
///
/// Ticks are written as integers and identifiers as hyphenated strings.
#[must_use]
pub fn value_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::String(v) => Value::from(v.as_str()),
        FieldValue::Bool(v) => Value::from(*v),
        FieldValue::Int32(v) | FieldValue::Enum(v) | FieldValue::ForeignRecord(v) => {
            Value::from(*v)
        }
        FieldValue::Int64(v) => Value::from(*v),
        FieldValue::Float(v) => Value::from(f64::from(*v)),
        FieldValue::Double(v) => Value::from(*v),
        FieldValue::TimeSpan(v) => Value::from(v.ticks()),
        FieldValue::DateTime(v) => Value::from(v.ticks()),
        FieldValue::Uuid(v) => Value::from(v.to_string()),
    }
}

/// Converts a JSON cell to a value of `kind`.
pub fn value_from_json(kind: FieldKind, cell: &Value) -> Result<FieldValue> {
    let mismatch = || anyhow::anyhow!("expected {kind} value, found {cell}");
    let value = match kind {
        FieldKind::String => FieldValue::String(cell.as_str().ok_or_else(mismatch)?.to_owned()),
        FieldKind::Bool => FieldValue::Bool(cell.as_bool().ok_or_else(mismatch)?),
        FieldKind::Int32 => FieldValue::Int32(json_i32(cell).ok_or_else(mismatch)?),
        FieldKind::Int64 => FieldValue::Int64(cell.as_i64().ok_or_else(mismatch)?),
        FieldKind::Float => FieldValue::Float(cell.as_f64().ok_or_else(mismatch)? as f32),
        FieldKind::Double => FieldValue::Double(cell.as_f64().ok_or_else(mismatch)?),
        FieldKind::TimeSpan => {
            FieldValue::TimeSpan(TimeSpan::from_ticks(cell.as_i64().ok_or_else(mismatch)?))
        }
        FieldKind::DateTime => {
            let ticks = cell.as_u64().ok_or_else(mismatch)?;
            if ticks > DateTime::MAX.ticks() {
                bail!("datetime ticks {ticks} out of range");
            }
            FieldValue::DateTime(DateTime::from_ticks(ticks))
        }
        FieldKind::Uuid => {
            let text = cell.as_str().ok_or_else(mismatch)?;
            FieldValue::Uuid(Uuid::parse_str(text).with_context(|| format!("parse uuid {text:?}"))?)
        }
        FieldKind::Enum => FieldValue::Enum(json_i32(cell).ok_or_else(mismatch)?),
        FieldKind::ForeignRecord => FieldValue::ForeignRecord(json_i32(cell).ok_or_else(mismatch)?),
    };
    Ok(value)
}

fn json_i32(cell: &Value) -> Option<i32> {
    cell.as_i64().and_then(|v| i32::try_from(v).ok())
}

/// Renders decoded rows as an aligned text grid.
#[must_use]
pub fn format_decode_pretty(output: &DecodeOutput) -> String {
    let headers: Vec<String> = output
        .columns
        .iter()
        .enumerate()
        .map(|(index, kind)| format!("{index}:{kind}"))
        .collect();
    let cells: Vec<Vec<String>> = output
        .rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(String::len).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "version: {} flags: 0x{:02x} rows: {}",
        output.header.version,
        output.header.flags.raw(),
        output.header.row_count
    );
    push_line(&mut out, &headers, &widths);
    for row in &cells {
        push_line(&mut out, row, &widths);
    }
    out
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_column_list() {
        let kinds = parse_columns("int32, String ,enum,,guid").unwrap();
        assert_eq!(
            kinds,
            vec![
                FieldKind::Int32,
                FieldKind::String,
                FieldKind::Enum,
                FieldKind::Uuid
            ]
        );
        assert!(parse_columns("int32,money").is_err());
    }

    #[test]
    fn json_roundtrip_through_table_bytes() {
        let columns = parse_columns("int32,string,bool,uuid,datetime,enum").unwrap();
        let rows = json!([
            [1, "café", true, "67e55044-10b1-426f-9247-bb680e5fe0c8", 621355968000000000u64, -2],
            [2, "", false, "00000000-0000-0000-0000-000000000000", 0, 0]
        ]);
        let config = CodecConfig::default();
        let bytes = encode_table_json(&rows, &columns, &config).unwrap();

        let report = inspect_table(&bytes, &config).unwrap();
        assert_eq!(report.header.row_count, 2);
        assert_eq!(report.header_len + report.body_len, bytes.len());

        let output = decode_table_json(&bytes, &columns, &config).unwrap();
        assert_eq!(Value::from(output.rows.clone()), rows);
    }

    #[test]
    fn rejects_mismatched_cells() {
        let columns = [FieldKind::Int32];
        let config = CodecConfig::default();
        assert!(encode_table_json(&json!([["one"]]), &columns, &config).is_err());
        assert!(encode_table_json(&json!([[1, 2]]), &columns, &config).is_err());
        assert!(encode_table_json(&json!([[4_000_000_000u64]]), &columns, &config).is_err());
        assert!(encode_table_json(&json!({"rows": []}), &columns, &config).is_err());
    }

    #[test]
    fn pretty_output_aligns_columns() {
        let columns = [FieldKind::Int32, FieldKind::String];
        let config = CodecConfig::default();
        let bytes = encode_table_json(&json!([[7, "seven"], [100, "x"]]), &columns, &config)
            .unwrap();
        let output = decode_table_json(&bytes, &columns, &config).unwrap();
        let text = format_decode_pretty(&output);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "version: 100 flags: 0x00 rows: 2");
        assert_eq!(lines[1], "0:int32 | 1:string");
        assert_eq!(lines[2], "7       | seven");
        assert_eq!(lines[3], "100     | x");
    }

    #[test]
    fn inspect_rejects_garbage() {
        assert!(inspect_table(&[1, 2, 3], &CodecConfig::default()).is_err());
    }
}
