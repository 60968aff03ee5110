//! Column kinds and cell values.

use std::fmt;
use std::str::FromStr;

use bytestream::{varint, CodecResult, DateTime, Reader, TimeSpan, Uuid, Writer};

/// The value type stored in one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldKind {
    /// Length-prefixed UTF-8.
    String,
    /// One byte, nonzero is `true`.
    Bool,
    /// Fixed 4 bytes.
    Int32,
    /// Fixed 8 bytes.
    Int64,
    /// IEEE-754 single, fixed 4 bytes.
    Float,
    /// IEEE-754 double, fixed 8 bytes.
    Double,
    /// Signed 100 ns ticks, fixed 8 bytes.
    TimeSpan,
    /// Unsigned 100 ns ticks since 0001-01-01, fixed 8 bytes.
    DateTime,
    /// 16 bytes in GUID byte order.
    Uuid,
    /// Enumeration ordinal as a zig-zag varint.
    Enum,
    /// Key of a row in another table, fixed 4 bytes.
    ForeignRecord,
}

impl FieldKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::String,
        Self::Bool,
        Self::Int32,
        Self::Int64,
        Self::Float,
        Self::Double,
        Self::TimeSpan,
        Self::DateTime,
        Self::Uuid,
        Self::Enum,
        Self::ForeignRecord,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float => "float",
            Self::Double => "double",
            Self::TimeSpan => "timespan",
            Self::DateTime => "datetime",
            Self::Uuid => "uuid",
            Self::Enum => "enum",
            Self::ForeignRecord => "foreign_record",
        }
    }

    /// Encoded size for kinds whose size does not depend on the value.
    #[must_use]
    pub const fn fixed_len(self) -> Option<usize> {
        match self {
            Self::Bool => Some(1),
            Self::Int32 | Self::Float | Self::ForeignRecord => Some(4),
            Self::Int64 | Self::Double | Self::TimeSpan | Self::DateTime => Some(8),
            Self::Uuid => Some(16),
            Self::String | Self::Enum => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown kind name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFieldKindError {
    name: String,
}

impl fmt::Display for ParseFieldKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field kind: {:?}", self.name)
    }
}

impl std::error::Error for ParseFieldKindError {}

impl FromStr for FieldKind {
    type Err = ParseFieldKindError;

    /// Parses a kind name, ignoring ASCII case. Common aliases such as `int`,
    /// `long`, `guid` and `ref` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Self::String,
            "bool" | "boolean" => Self::Bool,
            "int32" | "int" | "i32" => Self::Int32,
            "int64" | "long" | "i64" => Self::Int64,
            "float" | "f32" => Self::Float,
            "double" | "f64" => Self::Double,
            "timespan" => Self::TimeSpan,
            "datetime" => Self::DateTime,
            "uuid" | "guid" => Self::Uuid,
            "enum" => Self::Enum,
            "foreign_record" | "foreignrecord" | "ref" => Self::ForeignRecord,
            _ => {
                return Err(ParseFieldKindError {
                    name: s.to_owned(),
                })
            }
        };
        Ok(kind)
    }
}

/// One cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    TimeSpan(TimeSpan),
    DateTime(DateTime),
    Uuid(Uuid),
    Enum(i32),
    ForeignRecord(i32),
}

impl FieldValue {
    /// Returns the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::String(_) => FieldKind::String,
            Self::Bool(_) => FieldKind::Bool,
            Self::Int32(_) => FieldKind::Int32,
            Self::Int64(_) => FieldKind::Int64,
            Self::Float(_) => FieldKind::Float,
            Self::Double(_) => FieldKind::Double,
            Self::TimeSpan(_) => FieldKind::TimeSpan,
            Self::DateTime(_) => FieldKind::DateTime,
            Self::Uuid(_) => FieldKind::Uuid,
            Self::Enum(_) => FieldKind::Enum,
            Self::ForeignRecord(_) => FieldKind::ForeignRecord,
        }
    }

    /// Exact number of bytes [`FieldValue::encode`] writes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::String(s) => varint::length_prefixed_len(s.len()),
            Self::Enum(v) => varint::optimal_i32_len(*v),
            other => other.kind().fixed_len().unwrap_or_default(),
        }
    }

    /// Writes the value in its column's wire form.
    pub fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        match self {
            Self::String(v) => writer.write_str(v),
            Self::Bool(v) => writer.write(v),
            Self::Int32(v) | Self::ForeignRecord(v) => writer.write(v),
            Self::Int64(v) => writer.write(v),
            Self::Float(v) => writer.write(v),
            Self::Double(v) => writer.write(v),
            Self::TimeSpan(v) => writer.write(v),
            Self::DateTime(v) => writer.write(v),
            Self::Uuid(v) => writer.write(v),
            Self::Enum(v) => writer.write_optimal_i32(*v),
        }
    }

    /// Reads one value of `kind`.
    pub fn decode(kind: FieldKind, reader: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(match kind {
            FieldKind::String => Self::String(reader.read_string()?),
            FieldKind::Bool => Self::Bool(reader.read()?),
            FieldKind::Int32 => Self::Int32(reader.read()?),
            FieldKind::Int64 => Self::Int64(reader.read()?),
            FieldKind::Float => Self::Float(reader.read()?),
            FieldKind::Double => Self::Double(reader.read()?),
            FieldKind::TimeSpan => Self::TimeSpan(reader.read()?),
            FieldKind::DateTime => Self::DateTime(reader.read()?),
            FieldKind::Uuid => Self::Uuid(reader.read()?),
            FieldKind::Enum => Self::Enum(reader.read_optimal_i32()?),
            FieldKind::ForeignRecord => Self::ForeignRecord(reader.read()?),
        })
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}
