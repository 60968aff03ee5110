#![no_main]

use bytestream::CodecConfig;
use libfuzzer_sys::fuzz_target;
use table::{decode_table, encode_table, FieldKind};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let (columns, payload) = data.split_at(4);
    // Each of the first four bytes picks a column kind; zero ends the list.
    let kinds: Vec<FieldKind> = columns
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| FieldKind::ALL[usize::from(b) % FieldKind::ALL.len()])
        .collect();

    let config = CodecConfig::for_testing();
    if payload.len() > config.max_message_len {
        return;
    }
    if let Ok(rows) = decode_table(payload, &kinds, &config) {
        // Anything that decodes must re-encode and decode again.
        let encoded = encode_table(&kinds, &rows, &config).expect("re-encode decoded rows");
        assert!(encoded.len() <= payload.len());
        let again = decode_table(&encoded, &kinds, &config).expect("decode re-encoded rows");
        assert_eq!(again.len(), rows.len());
    }
});
