//! # PNG chunks
//!
//! PNG data is stored in chunks, each structured as follows:
//!
//! - 4 byte big endian number describing the length of the data within.
//! - 4 byte ASCII identifier for the chunk type.
//! - The chunk data itself, which is as long as the length described.
//! - 4 byte CRC-32 checksum of the chunk type and data.
//!
//! A PNG file consists of an 8 byte signature followed by a series of chunks, the last of which
//! must be `IEND`.
//!
//! Chunks can be found in two ways. [`Strategy::Scan`] searches the raw bytes for the tag, which
//! is tolerant of sloppy framing but can be fooled by the same four bytes turning up inside
//! unrelated data. [`Strategy::Walk`] reads length/tag pairs in order from the end of the
//! signature, so it only ever matches real chunk boundaries.
//!
//! ## Relevant Links
//!
//! - [Wikipedia article for PNG](https://en.wikipedia.org/wiki/Portable_Network_Graphics)
//! - [PNG specification, chunk layout](https://www.w3.org/TR/png/#5Chunk-layout)

use crate::{
    error::{tag_name, Error, Result},
    utils::{find, read_stack, read_u32_be, rfind},
};
use log::{debug, trace, warn};
use std::ops::Range;

/// Four byte ASCII chunk identifier.
pub type Tag = [u8; 4];

pub const SIGNATURE: &[u8] = b"\x89PNG\x0D\x0A\x1A\x0A";

/// The chunk holding compressed pixel data.
pub const DATA_CHUNK: &Tag = b"IDAT";
/// All PNG files must end with an `IEND` chunk.
pub const END_CHUNK: &Tag = b"IEND";

#[cfg(feature = "checksum")]
const CRC: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

/// Which occurrence of a tag to settle on when it appears more than once.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The first occurrence.
    Forward,
    /// The last occurrence. Used for `IEND`, since pixel data may contain the same bytes.
    Backward,
}

/// How chunks are located within a buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Substring search over the raw bytes.
    #[default]
    Scan,
    /// Sequential walk over the length-prefixed chunk list.
    Walk,
}

/// A chunk inside a buffer. `offset` is the position of the tag, not of the length field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub tag: Tag,
    pub offset: usize,
    pub length: u32,
}

impl Chunk {
    /// Read the chunk whose tag starts at `offset`, rejecting it if its data or checksum would
    /// run past the end of `buffer`.
    pub fn at(buffer: &[u8], offset: usize) -> Result<Chunk> {
        let tag = read_stack::<4>(buffer, offset)
            .ok_or(Error::InvalidSource("chunk tag runs past the end of the buffer"))?;
        let length = chunk_length(buffer, offset)?;
        let chunk = Chunk { tag, offset, length };
        match chunk.offset.checked_add(8).and_then(|n| n.checked_add(length as usize)) {
            Some(end) if end <= buffer.len() => Ok(chunk),
            _ => Err(Error::MalformedLength {
                tag: tag_name(&tag),
                offset,
                length,
                available: buffer.len(),
            }),
        }
    }

    /// Byte range of the chunk data, excluding tag and checksum. Saturates at `usize::MAX` for
    /// chunks that could never fit in memory.
    pub fn data(&self) -> Range<usize> {
        let start = self.offset.saturating_add(4);
        start..start.saturating_add(self.length as usize)
    }

    /// Offset right after the trailing checksum.
    pub fn end(&self) -> usize {
        self.data().end.saturating_add(4)
    }

    /// Whether the stored CRC matches the tag and data. Nothing in this crate rewrites
    /// checksums, so a transformed `IDAT` will report `false` here.
    #[cfg(feature = "checksum")]
    pub fn checksum_matches(&self, buffer: &[u8]) -> bool {
        let Some(stored) = read_u32_be(buffer, self.data().end) else {
            return false;
        };
        let mut digest = CRC.digest();
        digest.update(&self.tag);
        digest.update(&buffer[self.data()]);
        stored == digest.finalize()
    }
}

/// Offset of `tag` in `buffer`, found by substring search.
pub fn find_chunk(buffer: &[u8], tag: &Tag, direction: Direction) -> Result<usize> {
    let offset = match direction {
        Direction::Forward => find(buffer, tag),
        Direction::Backward => rfind(buffer, tag),
    };
    offset.ok_or_else(|| Error::ChunkNotFound(tag_name(tag)))
}

/// Declared length of the chunk whose tag starts at `offset`, read from the 4 bytes before it.
pub fn chunk_length(buffer: &[u8], offset: usize) -> Result<u32> {
    offset
        .checked_sub(4)
        .and_then(|start| read_u32_be(buffer, start))
        .ok_or_else(|| Error::MalformedLength {
            tag: read_stack::<4>(buffer, offset).map(|t| tag_name(&t)).unwrap_or_default(),
            offset,
            length: 0,
            available: buffer.len(),
        })
}

/// Iterator over the chunks of a PNG, in file order. See [`chunks`].
#[derive(Clone, Debug)]
pub struct Chunks<'a> {
    buffer: &'a [u8],
    cursor: usize,
    done: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor == self.buffer.len() {
            return None;
        }
        // Anything after the first error is garbage, so stop there
        self.done = true;
        if self.buffer.len() - self.cursor < 8 {
            return Some(Err(Error::InvalidSource("truncated chunk header")));
        }
        let chunk = match Chunk::at(self.buffer, self.cursor + 4) {
            Ok(chunk) => chunk,
            Err(e) => return Some(Err(e)),
        };
        trace!("walked `{}` at {} ({} bytes)", tag_name(&chunk.tag), chunk.offset, chunk.length);
        self.cursor = chunk.end();
        self.done = &chunk.tag == END_CHUNK;
        Some(Ok(chunk))
    }
}

/// Walk the chunks of a PNG, starting right after the signature.
///
/// Iteration ends after `IEND` or when the buffer is exhausted. A truncated header or a length
/// running past the buffer yields one error and ends the iteration.
pub fn chunks(buffer: &[u8]) -> Result<Chunks<'_>> {
    if !buffer.starts_with(SIGNATURE) {
        return Err(Error::InvalidSource("missing png signature"));
    }
    Ok(Chunks { buffer, cursor: SIGNATURE.len(), done: false })
}

fn walk(buffer: &[u8], tag: &Tag, direction: Direction) -> Result<Chunk> {
    let mut found = None;
    for chunk in chunks(buffer)? {
        let chunk = chunk?;
        if &chunk.tag == tag {
            found = Some(chunk);
            if direction == Direction::Forward {
                break;
            }
        }
    }
    found.ok_or_else(|| Error::ChunkNotFound(tag_name(tag)))
}

/// Offset of `tag` in `buffer`. With [`Strategy::Scan`] this performs no framing checks.
pub fn position(
    buffer: &[u8],
    tag: &Tag,
    direction: Direction,
    strategy: Strategy,
) -> Result<usize> {
    match strategy {
        Strategy::Scan => find_chunk(buffer, tag, direction),
        Strategy::Walk => walk(buffer, tag, direction).map(|chunk| chunk.offset),
    }
}

/// Find a well-formed chunk tagged `tag`.
pub fn locate(buffer: &[u8], tag: &Tag, direction: Direction, strategy: Strategy) -> Result<Chunk> {
    let chunk = match strategy {
        Strategy::Scan => {
            let offset = find_chunk(buffer, tag, direction)?;
            Chunk::at(buffer, offset).map_err(|e| {
                warn!("`{}` found at {} but is not framed correctly", tag_name(tag), offset);
                e
            })?
        }
        Strategy::Walk => walk(buffer, tag, direction)?,
    };
    debug!("located `{}` at {} ({} bytes)", tag_name(tag), chunk.offset, chunk.length);
    Ok(chunk)
}
