//! Error types for audio package parsing.

use thiserror::Error;

/// Errors that can occur when parsing an audio package.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] wadkit_common::Error),

    /// Invalid magic bytes (not an audio package).
    #[error("invalid package magic: expected 'r3d2', got {actual:?}")]
    InvalidMagic { actual: Vec<u8> },

    /// A file record could not be read.
    #[error("file {index} at offset {offset}: {source}")]
    Entry {
        index: usize,
        offset: u32,
        #[source]
        source: wadkit_common::Error,
    },
}

impl Error {
    /// Whether this error means the input ended before a read completed.
    pub fn is_truncation(&self) -> bool {
        match self {
            Error::Common(e) | Error::Entry { source: e, .. } => e.is_truncation(),
            Error::InvalidMagic { .. } => false,
        }
    }
}

/// Result type for audio package operations.
pub type Result<T> = std::result::Result<T, Error>;
