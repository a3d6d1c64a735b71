#![no_main]
use libfuzzer_sys::fuzz_target;
use stegpng_core::{chunk::find_chunk, embed_bytes, extract_bytes, Direction, DEFAULT_MARKER};

// Holds for any carrier that doesn't already contain a marker
fuzz_target!(|data: (Vec<u8>, Vec<u8>, Vec<u8>)| {
    let (payload, carrier, key) = data;
    if find_chunk(&carrier, DEFAULT_MARKER, Direction::Forward).is_ok() {
        return;
    }
    if let Ok(stego) = embed_bytes(&payload, &carrier, &key) {
        assert_eq!(extract_bytes(&stego, &key).unwrap(), payload);
    }
});
