//! # stegpng_core
//!
//! Hide a PNG inside another PNG. The payload's pixel data is XORed with a repeating key and the
//! whole payload file is spliced into the carrier as an extra chunk in front of `IEND`. Image
//! viewers skip the unknown chunk, so the carrier still displays as before.
//!
//! The XOR key only obfuscates the payload, it does not encrypt it.
//!
//! ## Usage
//!
//! ```no_run
//! stegpng_core::embed("secret.png", "out.png", "cover.png", b"key")?;
//! stegpng_core::extract("out.png", "recovered.png", b"key")?;
//! # Ok::<(), stegpng_core::Error>(())
//! ```
//!
//! Buffer variants ([`embed_bytes`], [`extract_bytes`]) skip the file system entirely.

#[macro_use]
mod utils;

pub mod chunk;
pub mod error;
pub mod keystream;
pub mod stego;

pub use chunk::{Chunk, Direction, Strategy, Tag};
pub use error::{Error, Result};
pub use keystream::{transform, Key};
pub use stego::{
    embed, embed_bytes, embed_bytes_with, embed_with, extract, extract_bytes, extract_bytes_with,
    extract_with, obfuscate, obfuscate_file, restore_to, Options, DEFAULT_MARKER,
};
