// Hides a PNG inside another one, then recovers it and compares sizes
// `cargo run --example stash -- secret.png cover.png stego.png recovered.png MySecretKey123`
use stegpng_core::{chunk, embed_with, extract_with, Chunk, Key, Options};

// Width and height from the IHDR chunk
fn dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let ihdr: Chunk = chunk::chunks(bytes).ok()?.next()?.ok()?;
    let data = bytes.get(ihdr.data())?;
    Some((
        u32::from_be_bytes(data.get(0..4)?.try_into().ok()?),
        u32::from_be_bytes(data.get(4..8)?.try_into().ok()?),
    ))
}

fn describe(label: &str, path: &str) -> usize {
    let bytes = std::fs::read(path).unwrap();
    match dimensions(&bytes) {
        Some((w, h)) => println!("{} image: {}x{} pixels ({} bytes)", label, w, h, bytes.len()),
        None => println!("{} image: {} bytes", label, bytes.len()),
    }
    bytes.len()
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 5 {
        eprintln!("usage: stash <payload> <carrier> <stego> <recovered> <key>");
        std::process::exit(2);
    }
    let (payload, carrier, stego, recovered) = (&args[0], &args[1], &args[2], &args[3]);
    let key = match Key::try_from(args[4].as_str()) {
        Ok(key) => key,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    let options = Options::default();

    let original = describe("Original", payload);

    if let Err(e) = embed_with(payload, stego, carrier, &key, &options) {
        eprintln!("{}: {}", stego, e);
        std::process::exit(1);
    }
    let hidden = describe("Stego", stego);
    println!("Size ratio (stego/original): {:.2}x", hidden as f64 / original as f64);

    if let Err(e) = extract_with(stego, recovered, &key, &options) {
        eprintln!("{}: {}", recovered, e);
        std::process::exit(1);
    }
    let restored = describe("Recovered", recovered);
    println!("Size ratio (recovered/original): {:.2}x", restored as f64 / original as f64);
}
