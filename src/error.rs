use thiserror::Error;

/// All library functions return a `Result` with this error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The OS failed to read an input or write the output file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// A required chunk tag does not appear in the buffer.
    #[error("chunk `{0}` not found")]
    ChunkNotFound(String),
    /// The buffer handed to extraction carries no embedded payload.
    #[error("marker chunk `{0}` not found")]
    MarkerNotFound(String),
    /// Keys are used cyclically, so they need at least one byte.
    #[error("key must contain at least one byte")]
    InvalidKey,
    /// A declared length points past the end of the buffer.
    #[error(
        "chunk `{tag}` at offset {offset} declares {length} bytes, \
         which does not fit in a buffer of {available} bytes"
    )]
    MalformedLength { tag: String, offset: usize, length: u32, available: usize },
    /// The payload is too large for a 4 byte length field.
    #[error("payload of {0} bytes does not fit in a single chunk")]
    ChunkSizeOverflow(usize),
    /// The buffer is not laid out the way a PNG should be.
    #[error("invalid source: {0}")]
    InvalidSource(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn tag_name(tag: &[u8]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}
