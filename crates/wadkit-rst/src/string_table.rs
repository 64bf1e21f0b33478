//! String table parser.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use indexmap::IndexMap;
use wadkit_common::BinaryReader;

use crate::{Error, Result};

/// String table magic bytes.
pub const MAGIC: &[u8; 3] = b"RST";

/// Blob byte introducing a length-prefixed translation payload.
pub const TRANSLATION_MARKER: u8 = 0xFF;

/// Number of hash bits in a packed record for a given version.
///
/// Versions 2 and 3 use the wider 40-bit hash used by older game clients.
pub fn hash_bits(version: u8) -> Option<u32> {
    match version {
        2 | 3 => Some(40),
        4 | 5 => Some(38),
        _ => None,
    }
}

/// A record from the table: where the string lives and what it is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringRecord {
    /// Byte offset into the data blob
    pub index: u64,
    /// Key hash
    pub hash: u64,
}

impl StringRecord {
    /// Split a packed table value into index and hash.
    pub fn unpack(value: u64, hash_bits: u32) -> Self {
        let mask = (1u64 << hash_bits) - 1;
        Self {
            index: value >> hash_bits,
            hash: value & mask,
        }
    }
}

/// A parsed string table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringTable {
    pub version: u8,
    pub hash_bits: u32,
    /// Raw font configuration (version 2 only).
    #[cfg_attr(feature = "serde", serde(skip))]
    pub font_config: Option<Vec<u8>>,
    /// Whether translation payloads may appear in the data blob.
    pub has_translation_marker: bool,
    /// Decoded strings keyed by hash, in table order.
    pub entries: IndexMap<u64, String>,
    /// Records whose value could not be decoded and were left empty.
    pub invalid_records: usize,
}

impl StringTable {
    /// Check if data starts with the string table magic.
    pub fn is_string_table(data: &[u8]) -> bool {
        data.starts_with(MAGIC)
    }

    /// Parse a string table.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if !Self::is_string_table(data) {
            return Err(Error::InvalidMagic {
                actual: data[..MAGIC.len().min(data.len())].to_vec(),
            });
        }

        let mut reader = BinaryReader::new_at(data, MAGIC.len());
        let version = reader.read_u8()?;
        let hash_bits = hash_bits(version).ok_or(Error::UnsupportedVersion(version))?;

        let mut font_config = None;
        if version == 2 && reader.read_bool()? {
            let length = reader.read_u32()? as usize;
            font_config = Some(reader.read_bytes(length)?.to_vec());
        }

        let count = reader.read_u32()?;
        let mut records = Vec::new();
        for i in 0..count {
            match reader.read_u64() {
                Ok(value) => records.push(StringRecord::unpack(value, hash_bits)),
                Err(e) => {
                    tracing::warn!(
                        "string table truncated at record {} of {}: {}",
                        i,
                        count,
                        e
                    );
                    break;
                }
            }
        }

        let has_translation_marker = if version < 5 {
            match reader.read_bool() {
                Ok(flag) => flag,
                Err(e) => {
                    tracing::warn!("string table truncated before translation flag: {}", e);
                    false
                }
            }
        } else {
            false
        };
        let blob = reader.remaining_bytes();

        let mut table = Self {
            version,
            hash_bits,
            font_config,
            has_translation_marker,
            entries: IndexMap::with_capacity(records.len()),
            invalid_records: 0,
        };

        for record in &records {
            let value = match decode_value(blob, record.index, has_translation_marker) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(
                        "string 0x{:x} at index {} unreadable: {}",
                        record.hash,
                        record.index,
                        e
                    );
                    table.invalid_records += 1;
                    String::new()
                }
            };
            table.entries.insert(record.hash, value);
        }

        tracing::debug!(
            "parsed string table v{} with {} entries",
            version,
            table.entries.len()
        );
        Ok(table)
    }

    /// Look up a string by hash.
    pub fn get(&self, hash: u64) -> Option<&str> {
        self.entries.get(&hash).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(hash, value)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.entries.iter().map(|(&hash, value)| (hash, value.as_str()))
    }

    /// Render as `0x<hash>: <value>` lines.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (hash, value) in self.iter() {
            out.push_str(&format!("{:#x}: {}\n", hash, value));
        }
        out
    }
}

fn decode_value(
    blob: &[u8],
    index: u64,
    has_translation_marker: bool,
) -> wadkit_common::Result<String> {
    let mut reader = BinaryReader::new(blob);
    reader.seek(usize::try_from(index).unwrap_or(usize::MAX))?;

    if has_translation_marker && reader.peek_bytes(1)?[0] == TRANSLATION_MARKER {
        reader.skip(1)?;
        let size = reader.read_u16()? as usize;
        return Ok(BASE64.encode(reader.read_bytes(size)?));
    }

    let rest = reader.remaining_bytes();
    let end = memchr::memchr(0, rest).ok_or(wadkit_common::Error::MissingNullTerminator)?;
    Ok(String::from_utf8_lossy(&rest[..end]).into_owned())
}
