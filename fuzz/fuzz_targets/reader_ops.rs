#![no_main]

use bytestream::{CodecConfig, Reader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let config = CodecConfig::for_testing();
    let Ok(mut reader) = Reader::with_config(payload, &config) else {
        return;
    };

    // The selector byte and each consumed byte drive a bounded op sequence.
    let mut op = selector;
    for _ in 0..256 {
        if reader.at_end() {
            break;
        }
        let before = reader.position();
        match op % 10 {
            0 => {
                let _ = reader.read_varint32();
            }
            1 => {
                let _ = reader.read_varint64();
            }
            2 => {
                let _ = reader.read_optimal_i64();
            }
            3 => {
                let _ = reader.try_read_string();
            }
            4 => {
                let _ = reader.read_bytes();
            }
            5 => {
                let _ = reader.read_nested(|r| r.read_seq::<u16>());
            }
            6 => {
                let _ = reader.read::<std::net::SocketAddr>();
            }
            7 => {
                let _ = reader.read::<bytestream::Uuid>();
            }
            8 => {
                if let Ok(len) = reader.read_length() {
                    let saved = reader.push_view();
                    if reader.adjust_view(len).is_ok() {
                        let _ = reader.read_fixed32();
                        reader.seek_to_end();
                    }
                    let _ = reader.pop_view(saved);
                }
            }
            _ => {
                let _ = reader.read_fixed8();
            }
        }
        assert!(reader.position() <= reader.total_len());
        assert_eq!(reader.recursion_depth(), 0);
        assert!(!reader.is_view_adjusted());
        if reader.position() == before {
            // Nothing consumed; skip a byte to make progress.
            if reader.skip(1).is_err() {
                break;
            }
        }
        op = op.wrapping_mul(31).wrapping_add(reader.peek_fixed8().unwrap_or(0));
    }
});
