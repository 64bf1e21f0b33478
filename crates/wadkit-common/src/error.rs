//! Error types for wadkit-common.

use thiserror::Error;

/// Common error type for wadkit operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// Invalid magic bytes encountered.
    #[error("invalid magic: expected {expected:?}, got {actual:?}")]
    InvalidMagic {
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    /// Seek target outside of the buffer.
    #[error("seek to {position} is outside of a {len} byte buffer")]
    SeekOutOfBounds { position: usize, len: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// UTF-16 decoding error.
    #[error("UTF-16 error: {0}")]
    Utf16(#[from] std::string::FromUtf16Error),

    /// Missing null terminator in string.
    #[error("string missing null terminator")]
    MissingNullTerminator,
}

impl Error {
    /// Whether this error means the input ended before a read completed.
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            Error::UnexpectedEof { .. } | Error::SeekOutOfBounds { .. } | Error::MissingNullTerminator
        )
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
