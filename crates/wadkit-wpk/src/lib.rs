//! Audio package parser.
//!
//! Audio packages (`.wpk`, magic `r3d2`) bundle named audio files behind an
//! offset table:
//!
//! - 4 bytes: Magic `r3d2`
//! - 4 bytes: Version
//! - 4 bytes: File count
//! - `file_count` x u32: Offsets of file records (0 = empty slot)
//!
//! Each file record is `data_offset:u32, data_size:u32, name_length:u32`
//! followed by the UTF-16LE name.

mod error;
mod package;

pub use error::{Error, Result};
pub use package::{FileRecord, Package, PackageFileEntry, PackageHeader, MAGIC};
