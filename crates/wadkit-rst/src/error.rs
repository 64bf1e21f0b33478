//! Error types for string table parsing.

use thiserror::Error;

/// Errors that can occur when parsing a string table.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] wadkit_common::Error),

    /// Invalid magic bytes (not a string table).
    #[error("invalid string table magic: expected 'RST', got {actual:?}")]
    InvalidMagic { actual: Vec<u8> },

    /// Version without a known layout.
    #[error("unsupported string table version: {0}")]
    UnsupportedVersion(u8),
}

impl Error {
    /// Whether this error means the input ended before a read completed.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Error::Common(e) if e.is_truncation())
    }
}

/// Result type for string table operations.
pub type Result<T> = std::result::Result<T, Error>;
