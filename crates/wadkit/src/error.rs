//! Error types for the extraction pipeline.

use thiserror::Error;

/// Errors that can occur while extracting an archive.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error, usually raised by a sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive or entry error.
    #[error("archive: {0}")]
    Wad(#[from] wadkit_wad::Error),

    /// Sound bank decode error.
    #[error("sound bank: {0}")]
    Bank(#[from] wadkit_bnk::Error),

    /// Audio package decode error.
    #[error("audio package: {0}")]
    Package(#[from] wadkit_wpk::Error),

    /// String table decode error.
    #[error("string table: {0}")]
    StringTable(#[from] wadkit_rst::Error),
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;
