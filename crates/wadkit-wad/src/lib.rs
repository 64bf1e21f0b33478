//! WAD archive reader for hashed game archives.
//!
//! A WAD is a flat, indexed archive: a versioned header, a table of
//! fixed-size entry records, then the entry data. Entries are identified
//! only by a 64-bit hash of their original path and each one is stored
//! with its own compression:
//!
//! - Uncompressed (type 0)
//! - Gzip (type 1)
//! - File redirect into another archive (type 2)
//! - Zstandard (type 3)
//! - Zstandard subchunks (type 4)
//!
//! # Example
//!
//! ```no_run
//! use wadkit_wad::WadArchive;
//!
//! let archive = WadArchive::open("Map11.wad.client")?;
//!
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.hash_key(), entry.decompressed_size);
//! }
//!
//! if let Some(entry) = archive.get(0) {
//!     let data = archive.read(entry)?;
//! }
//! # Ok::<(), wadkit_wad::Error>(())
//! ```

mod archive;
pub mod decompress;
mod entry;
mod error;
pub mod header;

pub use archive::WadArchive;
pub use decompress::EntryData;
pub use entry::{CompressionType, WadEntry};
pub use error::{Error, Result};
pub use header::WadHeader;
