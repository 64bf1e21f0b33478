//! Error types for sound bank parsing.

use thiserror::Error;

/// Errors that can occur when parsing a sound bank.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] wadkit_common::Error),

    /// Invalid magic bytes (not a sound bank).
    #[error("invalid bank magic: expected 'BKHD', got {actual:?}")]
    InvalidMagic { actual: Vec<u8> },

    /// A DATA section appeared before any DIDX section.
    #[error("DATA section at offset {offset} precedes the DIDX index")]
    MissingIndex { offset: usize },
}

impl Error {
    /// Whether this error means the input ended before a read completed.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Error::Common(e) if e.is_truncation())
    }
}

/// Result type for sound bank operations.
pub type Result<T> = std::result::Result<T, Error>;
