use bytestream::{CodecConfig, CodecError, DateTime, TimeSpan, Uuid, UuidFormat, Writer};
use proptest::prelude::*;
use table::{
    decode_header, decode_table, encode_table, FieldKind, FieldValue, Row, TableError,
    TableHeader, TableReader, TableWriter, FORMAT_VERSION,
};

fn value_strategy(kind: FieldKind) -> BoxedStrategy<FieldValue> {
    match kind {
        FieldKind::String => ".{0,16}".prop_map(FieldValue::String).boxed(),
        FieldKind::Bool => any::<bool>().prop_map(FieldValue::Bool).boxed(),
        FieldKind::Int32 => any::<i32>().prop_map(FieldValue::Int32).boxed(),
        FieldKind::Int64 => any::<i64>().prop_map(FieldValue::Int64).boxed(),
        FieldKind::Float => (-1.0e6f32..1.0e6).prop_map(FieldValue::Float).boxed(),
        FieldKind::Double => (-1.0e12f64..1.0e12).prop_map(FieldValue::Double).boxed(),
        FieldKind::TimeSpan => any::<i64>()
            .prop_map(|t| FieldValue::TimeSpan(TimeSpan::from_ticks(t)))
            .boxed(),
        FieldKind::DateTime => (0..=DateTime::MAX.ticks())
            .prop_map(|t| FieldValue::DateTime(DateTime::from_ticks(t)))
            .boxed(),
        FieldKind::Uuid => any::<u128>()
            .prop_map(|v| FieldValue::Uuid(Uuid::from_u128(v)))
            .boxed(),
        FieldKind::Enum => any::<i32>().prop_map(FieldValue::Enum).boxed(),
        FieldKind::ForeignRecord => any::<i32>().prop_map(FieldValue::ForeignRecord).boxed(),
    }
}

fn table_strategy() -> impl Strategy<Value = (Vec<FieldKind>, Vec<Row>)> {
    prop::collection::vec(prop::sample::select(FieldKind::ALL.to_vec()), 0..6).prop_flat_map(
        |kinds| {
            let row = kinds
                .iter()
                .map(|kind| value_strategy(*kind))
                .collect::<Vec<_>>();
            (Just(kinds), prop::collection::vec(row, 0..12))
        },
    )
}

proptest! {
    #[test]
    fn prop_table_roundtrip((kinds, rows) in table_strategy()) {
        let config = CodecConfig::default();
        let bytes = encode_table(&kinds, &rows, &config).unwrap();
        let header = decode_header(&bytes, &config).unwrap();
        prop_assert_eq!(header.row_count, rows.len());
        prop_assert_eq!(header.version, FORMAT_VERSION);

        let body: usize = rows.iter().flatten().map(FieldValue::encoded_len).sum();
        prop_assert_eq!(bytes.len(), header.encoded_len() + body);
        prop_assert_eq!(decode_table(&bytes, &kinds, &config).unwrap(), rows);
    }

    #[test]
    fn prop_truncated_table_rejected((kinds, rows) in table_strategy(), cut in any::<prop::sample::Index>()) {
        let config = CodecConfig::default();
        let bytes = encode_table(&kinds, &rows, &config).unwrap();
        let cut = cut.index(bytes.len());
        let err = decode_table(&bytes[..cut], &kinds, &config).unwrap_err();
        prop_assert!(err.as_codec().is_some_and(CodecError::is_truncation), "got {err:?}");
    }
}

#[test]
fn empty_table() {
    let config = CodecConfig::default();
    let bytes = encode_table(&[FieldKind::String], &[], &config).unwrap();
    assert_eq!(bytes, [0x64, 0, 0, 0, 0, 0]);
    assert_eq!(decode_header(&bytes, &config).unwrap(), TableHeader::new(0));
    assert!(decode_table(&bytes, &[FieldKind::String], &config)
        .unwrap()
        .is_empty());
}

#[test]
fn streaming_write_and_read() {
    let kinds = [FieldKind::ForeignRecord, FieldKind::Enum, FieldKind::String];
    let config = CodecConfig::default();

    let mut writer = TableWriter::new(&kinds, 100, &config).unwrap();
    for i in 0..100 {
        writer
            .write_row(&[
                FieldValue::ForeignRecord(i),
                FieldValue::Enum(i % 7 - 3),
                FieldValue::String("é".repeat(i as usize)),
            ])
            .unwrap();
    }
    let bytes = writer.finish().unwrap();

    let reader = TableReader::new(&bytes, &kinds, &config).unwrap();
    assert_eq!(reader.header().row_count, 100);
    let mut count = 0;
    for (i, row) in reader.enumerate() {
        let row = row.unwrap();
        assert_eq!(row[0], FieldValue::ForeignRecord(i as i32));
        count += 1;
    }
    assert_eq!(count, 100);
}

#[test]
fn legacy_length_prefixed_identifiers() {
    let id = Uuid::from_u128(0x0011_2233_4455_6677_8899_AABB_CCDD_EEFF);
    let mut writer = Writer::new();
    TableHeader::new(1).encode(&mut writer).unwrap();
    writer.write_uuid_length_prefixed(&id).unwrap();
    let bytes = writer.into_bytes();

    let legacy = CodecConfig::default().with_uuid_format(UuidFormat::LengthPrefixed);
    let rows = decode_table(&bytes, &[FieldKind::Uuid], &legacy).unwrap();
    assert_eq!(rows, vec![vec![FieldValue::Uuid(id)]]);

    // The raw reader sees 17 bytes where it expects 16.
    let err = decode_table(&bytes, &[FieldKind::Uuid], &CodecConfig::default()).unwrap_err();
    assert_eq!(err, TableError::TrailingData { remaining: 1 });
}

#[test]
fn wrong_column_list_detected_by_trailing_bytes() {
    let config = CodecConfig::default();
    let bytes = encode_table(
        &[FieldKind::Int64],
        &[vec![FieldValue::Int64(5)]],
        &config,
    )
    .unwrap();
    let err = decode_table(&bytes, &[FieldKind::Int32], &config).unwrap_err();
    assert_eq!(err, TableError::TrailingData { remaining: 4 });
}

#[test]
fn version_checked_before_rows() {
    let mut bytes = encode_table(&[], &[], &CodecConfig::default()).unwrap();
    bytes[0] = 99;
    assert_eq!(
        decode_header(&bytes, &CodecConfig::default()).unwrap_err(),
        TableError::UnsupportedVersion { found: 99 }
    );
}
