//! # Repeating-key XOR
//!
//! Every byte of the data is XORed with `key[i % key.len()]`, `i` counting from the start of the
//! data. Applying the same key twice restores the original bytes.
//!
//! This is obfuscation, not encryption. Once the chunk boundaries are known, a repeating key is
//! easily recovered with frequency analysis, and zlib streams have plenty of predictable bytes.

use crate::error::{Error, Result};
use std::fmt;

/// A non-empty XOR key.
#[derive(Clone, PartialEq, Eq)]
pub struct Key(Vec<u8>);

impl Key {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Key> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(Error::InvalidKey);
        }
        Ok(Key(bytes))
    }

    /// Transform `data` in place.
    pub fn apply(&self, data: &mut [u8]) {
        for (byte, k) in data.iter_mut().zip(self.0.iter().cycle()) {
            *byte ^= k;
        }
    }
}

// Keys are secrets, keep them out of logs
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key(<{} bytes>)", self.0.len())
    }
}

impl TryFrom<&[u8]> for Key {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Key> {
        Key::new(bytes)
    }
}

impl TryFrom<&str> for Key {
    type Error = Error;

    fn try_from(s: &str) -> Result<Key> {
        Key::new(s.as_bytes())
    }
}

/// Return a transformed copy of `data`.
pub fn transform(data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let key = Key::new(key)?;
    let mut out = data.to_vec();
    key.apply(&mut out);
    Ok(out)
}
