#![no_main]
use libfuzzer_sys::fuzz_target;
use stegpng_core::{embed_bytes_with, Key, Options, Strategy};

fuzz_target!(|data: (Vec<u8>, Vec<u8>, Vec<u8>)| {
    let Ok(key) = Key::new(data.2) else { return };
    for strategy in [Strategy::Scan, Strategy::Walk] {
        let options = Options::default().strategy(strategy);
        let _ = embed_bytes_with(&data.0, &data.1, &key, &options);
    }
});
