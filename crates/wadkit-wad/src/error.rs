//! Error types for the WAD crate.

use thiserror::Error;

/// Errors that can occur when working with WAD archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] wadkit_common::Error),

    /// Invalid archive magic bytes.
    #[error("invalid WAD magic: expected \"RW\", got {actual:?}")]
    InvalidMagic { actual: Vec<u8> },

    /// Unsupported archive major version.
    #[error("unsupported WAD version: {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// Entry uses a compression code outside the known set.
    #[error("entry {path_hash:016x}: invalid compression type {code}")]
    UnsupportedCompression { path_hash: u64, code: u8 },

    /// Decompression error.
    #[error("decompression error: {0}")]
    Decompression(String),
}

impl Error {
    /// Whether this error means the input ended before a read completed.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Error::Common(e) if e.is_truncation())
    }
}

/// Result type for WAD operations.
pub type Result<T> = std::result::Result<T, Error>;
