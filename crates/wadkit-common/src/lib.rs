//! Common utilities for wadkit.
//!
//! This crate provides foundational types used across all wadkit crates:
//!
//! - [`BinaryReader`] - Bounds-checked, zero-copy reading from byte slices
//! - [`HashTable`] - Path hash to path lookup loaded from a text mapping
//! - [`PathIdentity`] - Resolved or placeholder identity of an archive entry

mod error;
mod hashes;
mod reader;

pub use error::{Error, Result};
pub use hashes::{format_hash, sanitize_file_name, HashTable, PathIdentity};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
