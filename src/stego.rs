//! # Hiding a PNG inside another PNG
//!
//! The payload file gets its `IDAT` data XORed with the key, and the whole transformed file is
//! spliced into the carrier right before the `IEND` tag:
//!
//! ```text
//! carrier[..iend] | marker (4) | payload length (4, big endian) | payload | carrier[iend..]
//! ```
//!
//! `iend` is the offset of the `IEND` tag, so the carrier's own `IEND` length field ends up in
//! front of the marker. The spliced data is not framed like a regular chunk and carries no
//! checksum, and checksums of the transformed `IDAT` are left stale.

use crate::{
    chunk::{self, Direction, Strategy, Tag, DATA_CHUNK, END_CHUNK},
    error::{tag_name, Error, Result},
    keystream::Key,
    utils::read_u32_be,
};
use log::debug;
use std::{fs, io::Write, path::Path};
use tempfile::NamedTempFile;

/// Default tag of the spliced chunk.
pub const DEFAULT_MARKER: &Tag = b"stEG";

/// Knobs shared by embedding and extraction. Both sides must agree on them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub marker: Tag,
    pub strategy: Strategy,
}

impl Default for Options {
    fn default() -> Self {
        Options { marker: *DEFAULT_MARKER, strategy: Strategy::default() }
    }
}

impl Options {
    pub fn marker(mut self, marker: Tag) -> Self {
        self.marker = marker;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

fn toggle_data_chunk(file: &[u8], key: &Key, strategy: Strategy) -> Result<Vec<u8>> {
    let idat = chunk::locate(file, DATA_CHUNK, Direction::Forward, strategy)?;
    let mut out = file.to_vec();
    key.apply(&mut out[idat.data()]);
    Ok(out)
}

/// Copy of `file` with its `IDAT` data XORed with `key`. Calling it again undoes it.
pub fn obfuscate(file: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    toggle_data_chunk(file, &Key::new(key)?, Strategy::default())
}

/// [`obfuscate`] reading the file from `path`.
pub fn obfuscate_file(path: impl AsRef<Path>, key: &[u8]) -> Result<Vec<u8>> {
    let key = Key::new(key)?;
    toggle_data_chunk(&fs::read(path)?, &key, Strategy::default())
}

pub fn embed_bytes(payload: &[u8], carrier: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    embed_bytes_with(payload, carrier, &Key::new(key)?, &Options::default())
}

/// Hide `payload` inside `carrier`, returning the new file.
pub fn embed_bytes_with(
    payload: &[u8],
    carrier: &[u8],
    key: &Key,
    options: &Options,
) -> Result<Vec<u8>> {
    let hidden = toggle_data_chunk(payload, key, options.strategy)?;
    let length = u32::try_from(hidden.len()).map_err(|_| Error::ChunkSizeOverflow(hidden.len()))?;

    // Pixel data may contain the trailer bytes, the last occurrence is the real one
    let iend = chunk::position(carrier, END_CHUNK, Direction::Backward, options.strategy)?;
    debug!("splicing {} byte payload at offset {}", hidden.len(), iend);

    let mut out = Vec::with_capacity(carrier.len() + 8 + hidden.len());
    out.extend_from_slice(&carrier[..iend]);
    out.extend_from_slice(&options.marker);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(&hidden);
    out.extend_from_slice(&carrier[iend..]);
    Ok(out)
}

pub fn extract_bytes(input: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    extract_bytes_with(input, &Key::new(key)?, &Options::default())
}

/// Recover the payload hidden in `input`.
pub fn extract_bytes_with(input: &[u8], key: &Key, options: &Options) -> Result<Vec<u8>> {
    let marker = match chunk::position(input, &options.marker, Direction::Forward, options.strategy)
    {
        Ok(offset) => offset,
        Err(Error::ChunkNotFound(tag)) => return Err(Error::MarkerNotFound(tag)),
        Err(e) => return Err(e),
    };
    let malformed = |length| Error::MalformedLength {
        tag: tag_name(&options.marker),
        offset: marker,
        length,
        available: input.len(),
    };
    let length = read_u32_be(input, marker + 4).ok_or_else(|| malformed(0))?;
    let start = marker + 8;
    let hidden = start
        .checked_add(length as usize)
        .and_then(|end| input.get(start..end))
        .ok_or_else(|| malformed(length))?;
    debug!("found {} byte payload at offset {}", length, start);
    toggle_data_chunk(hidden, key, options.strategy)
}

pub fn embed(
    payload_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    carrier_path: impl AsRef<Path>,
    key: &[u8],
) -> Result<()> {
    embed_with(payload_path, output_path, carrier_path, &Key::new(key)?, &Options::default())
}

/// File based [`embed_bytes_with`]. Nothing is written unless embedding succeeds.
pub fn embed_with(
    payload_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    carrier_path: impl AsRef<Path>,
    key: &Key,
    options: &Options,
) -> Result<()> {
    let payload = fs::read(payload_path)?;
    let carrier = fs::read(carrier_path)?;
    let out = embed_bytes_with(&payload, &carrier, key, options)?;
    write_atomic(output_path.as_ref(), &out)
}

pub fn extract(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    key: &[u8],
) -> Result<()> {
    extract_with(input_path, output_path, &Key::new(key)?, &Options::default())
}

/// File based [`extract_bytes_with`]. Nothing is written unless extraction succeeds.
pub fn extract_with(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    key: &Key,
    options: &Options,
) -> Result<()> {
    let input = fs::read(input_path)?;
    let out = extract_bytes_with(&input, key, options)?;
    write_atomic(output_path.as_ref(), &out)
}

/// Undo the obfuscation of an already extracted payload `data` and write it to `output_path`.
pub fn restore_to(data: &[u8], output_path: impl AsRef<Path>, key: &[u8]) -> Result<()> {
    let out = obfuscate(data, key)?;
    write_atomic(output_path.as_ref(), &out)
}

// Write to a sibling temporary file and rename it over `path`, so readers never see a partial file
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    // Temporary files are created owner-only, outputs should be readable like any other file
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file().set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    const PIXEL: &[u8] = media!("pixel.png");
    const COVER: &[u8] = media!("cover.png");
    const KEY: &[u8] = b"test-key-12345";

    #[test]
    fn single_pixel_round_trip() {
        let stego = embed_bytes(PIXEL, PIXEL, KEY).unwrap();
        assert_eq!(stego.len(), PIXEL.len() + 8 + PIXEL.len());
        assert_eq!(extract_bytes(&stego, KEY).unwrap(), PIXEL);
    }

    #[test]
    fn splice_layout() {
        let stego = embed_bytes(PIXEL, COVER, KEY).unwrap();
        let iend = COVER.len() - 8;
        assert_eq!(&stego[..iend], &COVER[..iend]);
        assert_eq!(&stego[iend..iend + 4], DEFAULT_MARKER);
        assert_eq!(&stego[iend + 4..iend + 8], &(PIXEL.len() as u32).to_be_bytes());
        assert_eq!(&stego[iend + 8..iend + 8 + PIXEL.len()], obfuscate(PIXEL, KEY).unwrap());
        assert_eq!(&stego[stego.len() - 8..], &COVER[iend..]);
    }

    #[test]
    fn only_data_is_transformed() {
        let hidden = obfuscate(PIXEL, KEY).unwrap();
        assert_eq!(&hidden[..41], &PIXEL[..41]);
        assert_eq!(&hidden[51..], &PIXEL[51..]);
        assert_ne!(&hidden[41..51], &PIXEL[41..51]);
        assert_eq!(obfuscate(&hidden, KEY).unwrap(), PIXEL);
    }

    #[test]
    fn wrong_key_does_not_restore() {
        let stego = embed_bytes(COVER, PIXEL, KEY).unwrap();
        assert_ne!(extract_bytes(&stego, b"another key").unwrap(), COVER);
    }

    #[test]
    fn missing_marker() {
        let err = extract_bytes(COVER, KEY).unwrap_err();
        assert!(matches!(err, Error::MarkerNotFound(ref tag) if tag == "stEG"));
    }

    #[test]
    fn missing_data_chunk() {
        let mut payload = PIXEL.to_vec();
        payload[37..41].copy_from_slice(b"IDXT");
        let err = embed_bytes(&payload, COVER, KEY).unwrap_err();
        assert!(matches!(err, Error::ChunkNotFound(ref tag) if tag == "IDAT"));

        // Build a stego file by hand around a payload without IDAT
        let mut stego = COVER[..COVER.len() - 8].to_vec();
        stego.extend_from_slice(DEFAULT_MARKER);
        stego.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        stego.extend_from_slice(&payload);
        stego.extend_from_slice(&COVER[COVER.len() - 8..]);
        let err = extract_bytes(&stego, KEY).unwrap_err();
        assert!(matches!(err, Error::ChunkNotFound(ref tag) if tag == "IDAT"));
    }

    #[test]
    fn missing_end_chunk() {
        let carrier = &COVER[..COVER.len() - 8];
        let err = embed_bytes(PIXEL, carrier, KEY).unwrap_err();
        assert!(matches!(err, Error::ChunkNotFound(ref tag) if tag == "IEND"));
    }

    #[test]
    fn empty_key() {
        assert!(matches!(embed_bytes(PIXEL, COVER, b""), Err(Error::InvalidKey)));
        assert!(matches!(extract_bytes(COVER, b""), Err(Error::InvalidKey)));
    }

    #[test]
    fn oversized_data_chunk() {
        let mut payload = PIXEL.to_vec();
        payload[33..37].copy_from_slice(&1000u32.to_be_bytes());
        let err = embed_bytes(&payload, COVER, KEY).unwrap_err();
        assert!(matches!(err, Error::MalformedLength { length: 1000, offset: 37, .. }));
    }

    #[test]
    fn one_key_many_calls() {
        let key = Key::try_from("shared").unwrap();
        let options = Options::default();
        let first = embed_bytes_with(PIXEL, COVER, &key, &options).unwrap();
        let second = embed_bytes_with(COVER, PIXEL, &key, &options).unwrap();
        assert_eq!(first, embed_bytes(PIXEL, COVER, b"shared").unwrap());
        assert_eq!(extract_bytes_with(&first, &key, &options).unwrap(), PIXEL);
        assert_eq!(extract_bytes_with(&second, &key, &options).unwrap(), COVER);
    }

    #[test]
    fn truncated_payload() {
        let stego = embed_bytes(PIXEL, COVER, KEY).unwrap();
        let marker = COVER.len() - 8;
        let err = extract_bytes(&stego[..marker + 20], KEY).unwrap_err();
        assert!(matches!(err, Error::MalformedLength { offset, .. } if offset == marker));
        let err = extract_bytes(&stego[..marker + 6], KEY).unwrap_err();
        assert!(matches!(err, Error::MalformedLength { length: 0, .. }));
    }

    #[test]
    fn custom_marker() {
        let options = Options::default().marker(*b"hiDE");
        let key = Key::try_from(KEY).unwrap();
        let stego = embed_bytes_with(PIXEL, COVER, &key, &options).unwrap();
        assert!(matches!(extract_bytes(&stego, KEY), Err(Error::MarkerNotFound(_))));
        assert_eq!(extract_bytes_with(&stego, &key, &options).unwrap(), PIXEL);
    }

    #[test]
    fn walk_strategy_round_trip() {
        let options = Options::default().strategy(Strategy::Walk);
        let key = Key::try_from(KEY).unwrap();
        let stego = embed_bytes_with(COVER, COVER, &key, &options).unwrap();
        assert_eq!(stego, embed_bytes(COVER, COVER, KEY).unwrap());
        assert_eq!(extract_bytes_with(&stego, &key, &options).unwrap(), COVER);
    }

    #[test]
    fn nested_embedding() {
        let inner = embed_bytes(PIXEL, COVER, KEY).unwrap();
        let outer = embed_bytes(&inner, COVER, b"outer").unwrap();
        let inner_again = extract_bytes(&outer, b"outer").unwrap();
        assert_eq!(inner_again, inner);
        assert_eq!(extract_bytes(&inner_again, KEY).unwrap(), PIXEL);
    }

    #[cfg(feature = "checksum")]
    #[test]
    fn checksums_are_left_alone() {
        let hidden = obfuscate(COVER, KEY).unwrap();
        let idat = chunk::locate(&hidden, DATA_CHUNK, Direction::Forward, Strategy::Walk).unwrap();
        assert!(!idat.checksum_matches(&hidden));
        let restored = obfuscate(&hidden, KEY).unwrap();
        assert!(idat.checksum_matches(&restored));
    }

    #[quickcheck]
    fn round_trip(data: Vec<u8>, key: Vec<u8>) -> TestResult {
        if key.is_empty() || data.len() > u32::MAX as usize {
            return TestResult::discard();
        }
        // Wrap arbitrary bytes in a well-formed IDAT
        let mut payload = PIXEL[..33].to_vec();
        payload.extend_from_slice(&(data.len() as u32).to_be_bytes());
        payload.extend_from_slice(DATA_CHUNK);
        payload.extend_from_slice(&data);
        payload.extend_from_slice(&PIXEL[PIXEL.len() - 16..]);

        let stego = embed_bytes(&payload, COVER, &key).unwrap();
        TestResult::from_bool(extract_bytes(&stego, &key).unwrap() == payload)
    }

    #[quickcheck]
    fn inputs_are_not_mutated(key: Vec<u8>) -> TestResult {
        if key.is_empty() {
            return TestResult::discard();
        }
        let payload = PIXEL.to_vec();
        let carrier = COVER.to_vec();
        let stego = embed_bytes(&payload, &carrier, &key).unwrap();
        let copy = stego.clone();
        extract_bytes(&stego, &key).unwrap();
        TestResult::from_bool(payload == PIXEL && carrier == COVER && stego == copy)
    }

    #[quickcheck]
    fn extract_never_panics(data: Vec<u8>, key: Vec<u8>) -> bool {
        let _ = extract_bytes(&data, &key);
        if let Ok(key) = Key::new(key) {
            let _ = extract_bytes_with(&data, &key, &Options::default().strategy(Strategy::Walk));
        }
        true
    }
}
