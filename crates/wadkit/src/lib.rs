//! Wadkit - WAD game archive extraction library.
//!
//! This crate ties the wadkit format crates together: it walks a WAD
//! archive, identifies each payload by its signature, decodes the known
//! containers and hands everything to a [`Sink`].
//!
//! # Crates
//!
//! - [`wadkit_common`] - Common utilities (binary reading, path hashes)
//! - [`wadkit_wad`] - WAD archive reading (entry table + decompression)
//! - [`wadkit_bnk`] - Sound bank (`BKHD`) parsing
//! - [`wadkit_wpk`] - Audio package (`r3d2`) parsing
//! - [`wadkit_rst`] - String table (`RST`) parsing
//!
//! # Example
//!
//! ```no_run
//! use wadkit::prelude::*;
//!
//! struct Print;
//!
//! impl Sink for Print {
//!     fn decoded(&mut self, identity: &PathIdentity, decoded: &Decoded<'_>) -> wadkit::Result<()> {
//!         println!("{}: {}", identity, decoded.kind());
//!         Ok(())
//!     }
//!
//!     fn unknown(&mut self, identity: &PathIdentity, data: &[u8]) -> wadkit::Result<()> {
//!         println!("{}: {} bytes", identity, data.len());
//!         Ok(())
//!     }
//! }
//!
//! let hashes = HashTable::load("hashes.game.txt")?;
//! let archive = WadArchive::open("Ahri.wad.client")?;
//! let summary = Extractor::new(&hashes).run(&archive, &mut Print)?;
//! println!("{}", summary);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod detect;
mod error;
mod extract;
mod sink;
mod transcode;

// Re-export all sub-crates
pub use wadkit_bnk as bnk;
pub use wadkit_common as common;
pub use wadkit_rst as rst;
pub use wadkit_wad as wad;
pub use wadkit_wpk as wpk;

pub use detect::{Decoded, FormatKind};
pub use error::{Error, Result};
pub use extract::{ExtractOptions, ExtractSummary, Extractor};
pub use sink::Sink;
pub use transcode::{TranscodeRequest, OUTPUT_EXTENSION, SOURCE_EXTENSION};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{Decoded, ExtractOptions, ExtractSummary, Extractor, FormatKind, Sink};
    pub use crate::TranscodeRequest;
    pub use wadkit_bnk::{Bank, HircObject};
    pub use wadkit_common::{BinaryReader, HashTable, PathIdentity};
    pub use wadkit_rst::StringTable;
    pub use wadkit_wad::{CompressionType, EntryData, WadArchive, WadEntry};
    pub use wadkit_wpk::{Package, PackageFileEntry};
}
