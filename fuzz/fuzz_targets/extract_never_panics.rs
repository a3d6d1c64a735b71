#![no_main]
use libfuzzer_sys::fuzz_target;
use stegpng_core::{extract_bytes_with, Key, Options, Strategy};

fuzz_target!(|data: (Vec<u8>, Vec<u8>)| {
    let Ok(key) = Key::new(data.1) else { return };
    for strategy in [Strategy::Scan, Strategy::Walk] {
        let _ = extract_bytes_with(&data.0, &key, &Options::default().strategy(strategy));
    }
});
