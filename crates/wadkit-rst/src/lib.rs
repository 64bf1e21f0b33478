//! Hashed string table parser.
//!
//! String tables (`.stringtable`, magic `RST`) map 64-bit hashes to
//! localized text:
//!
//! - 3 bytes: Magic `RST`
//! - 1 byte: Version (2 through 5)
//! - Version 2 only: font config flag, then `length:u32` + bytes if set
//! - `count:u32`, then `count` packed u64 records (`index << bits | hash`)
//! - Versions below 5: translation marker flag (u8)
//! - Remaining bytes: null-terminated string data addressed by `index`
//!
//! # Example
//!
//! ```no_run
//! use wadkit_rst::StringTable;
//!
//! let data = std::fs::read("main_en_us.stringtable")?;
//! let table = StringTable::parse(&data)?;
//! print!("{}", table.to_text());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod string_table;

pub use error::{Error, Result};
pub use string_table::{hash_bits, StringRecord, StringTable, MAGIC, TRANSLATION_MARKER};
