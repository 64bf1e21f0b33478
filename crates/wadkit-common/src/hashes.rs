//! Path hash lookup.
//!
//! Archives identify entries by a 64-bit hash of their original path. A
//! community-maintained text file maps hashes back to paths, one
//! `"<16 hex chars> <path>"` pair per line.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::Result;

/// Format a path hash as the 16-character lowercase hex key used by
/// hash tables.
#[inline]
pub fn format_hash(hash: u64) -> String {
    format!("{:016x}", hash)
}

/// Make `name` usable as a single file name.
///
/// Path separators and NUL become `_`. Names that are empty or made only of
/// dots (`.`, `..`) get a leading `_` so they never address a directory.
pub fn sanitize_file_name(name: &str) -> String {
    let mut clean: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    if clean.chars().all(|c| c == '.') {
        clean.insert(0, '_');
    }
    clean
}

/// Lookup table from path hash to archive path.
#[derive(Debug, Clone, Default)]
pub struct HashTable {
    paths: HashMap<u64, String>,
}

impl HashTable {
    /// Create an empty table. Every lookup against it misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from a mapping file on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Parse a table from mapping text.
    ///
    /// The path is everything after the first space, so paths containing
    /// spaces survive. Blank lines and lines without a valid hex hash are
    /// skipped.
    pub fn parse(text: &str) -> Self {
        let mut paths = HashMap::new();
        let mut skipped = 0usize;

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            let Some((hash, path)) = line.split_once(' ') else {
                if !line.trim().is_empty() {
                    skipped += 1;
                }
                continue;
            };

            let path = path.trim();
            match u64::from_str_radix(hash, 16) {
                Ok(hash) if !path.is_empty() => {
                    paths.insert(hash, path.to_string());
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!("skipped {} malformed hash table lines", skipped);
        }

        Self { paths }
    }

    /// Insert a mapping.
    pub fn insert(&mut self, hash: u64, path: impl Into<String>) {
        self.paths.insert(hash, path.into());
    }

    /// Resolve a hash to its path, if known.
    #[inline]
    pub fn resolve(&self, hash: u64) -> Option<&str> {
        self.paths.get(&hash).map(String::as_str)
    }

    /// Resolve a hash to an entry identity, falling back to a placeholder.
    pub fn identify(&self, hash: u64) -> PathIdentity {
        match self.resolve(hash) {
            Some(path) => PathIdentity::Resolved(path.to_string()),
            None => PathIdentity::Unknown(hash),
        }
    }

    /// Number of known hashes.
    #[inline]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// The identity of an archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PathIdentity {
    /// Hash found in the lookup table.
    Resolved(String),
    /// Hash missing from the lookup table.
    Unknown(u64),
}

impl PathIdentity {
    /// Whether the hash was resolved to a real path.
    #[inline]
    pub fn is_resolved(&self) -> bool {
        matches!(self, PathIdentity::Resolved(_))
    }

    /// The last path component, or a file-system safe placeholder for
    /// unknown hashes.
    pub fn file_name(&self) -> String {
        match self {
            PathIdentity::Resolved(path) => {
                sanitize_file_name(path.rsplit('/').next().unwrap_or(path))
            }
            PathIdentity::Unknown(hash) => format!("UnknownHash_{}", format_hash(*hash)),
        }
    }

    /// The whole path flattened into one file name (`/` becomes `_`).
    pub fn flat_name(&self) -> String {
        match self {
            PathIdentity::Resolved(path) => sanitize_file_name(path),
            PathIdentity::Unknown(_) => self.file_name(),
        }
    }
}

impl fmt::Display for PathIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathIdentity::Resolved(path) => f.write_str(path),
            PathIdentity::Unknown(hash) => write!(f, "UnknownHash:{}", format_hash(*hash)),
        }
    }
}
