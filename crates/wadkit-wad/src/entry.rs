//! WAD entry records.

use std::fmt;

use wadkit_common::{format_hash, BinaryReader};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// How an entry's bytes are stored in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum CompressionType {
    /// Stored as-is.
    Uncompressed = 0,
    /// A gzip member.
    Gzip = 1,
    /// Not embedded; the entry points at a file in another archive.
    FileRedirect = 2,
    /// A single Zstandard stream.
    Zstd = 3,
    /// Independently compressed Zstandard subchunks.
    ZstdChunked = 4,
}

impl TryFrom<u8> for CompressionType {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Uncompressed),
            1 => Ok(Self::Gzip),
            2 => Ok(Self::FileRedirect),
            3 => Ok(Self::Zstd),
            4 => Ok(Self::ZstdChunked),
            other => Err(other),
        }
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uncompressed => "uncompressed",
            Self::Gzip => "gzip",
            Self::FileRedirect => "redirect",
            Self::Zstd => "zstd",
            Self::ZstdChunked => "zstd-chunked",
        };
        f.write_str(name)
    }
}

/// Version 1 entry record (24 bytes).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct EntryRecordV1 {
    /// Path hash
    pub path_hash: u64,
    /// Absolute offset of the entry data
    pub data_offset: u32,
    /// Stored size
    pub compressed_size: u32,
    /// Size after decompression
    pub decompressed_size: u32,
    /// Low nibble: compression type, high nibble: subchunk count
    pub type_and_subchunk: u8,
    /// Unused
    pub padding: [u8; 3],
}

/// Version 2+ entry record (32 bytes).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct EntryRecordV2 {
    /// Path hash
    pub path_hash: u64,
    /// Absolute offset of the entry data
    pub data_offset: u32,
    /// Stored size
    pub compressed_size: u32,
    /// Size after decompression
    pub decompressed_size: u32,
    /// Low nibble: compression type, high nibble: subchunk count
    pub type_and_subchunk: u8,
    /// Non-zero when the data is shared with another entry
    pub contains_duplicates: u8,
    /// Offset of the first subchunk
    pub first_subchunk_offset: u16,
    /// Checksum of the stored data
    pub checksum: u64,
}

/// An entry (file) within a WAD archive.
///
/// This contains metadata about the entry, not the entry data itself.
/// Use [`crate::WadArchive::read`] to get the decompressed contents.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WadEntry {
    /// Hash of the original path.
    pub path_hash: u64,
    /// Absolute offset of the stored data.
    pub data_offset: u32,
    /// Stored size in bytes.
    pub compressed_size: u32,
    /// Size after decompression.
    pub decompressed_size: u32,
    /// Storage method.
    pub compression: CompressionType,
    /// Number of subchunks (high nibble of the type byte).
    pub subchunk_count: u8,
    /// Version 2+ only.
    pub contains_duplicates: Option<bool>,
    /// Version 2+ only.
    pub first_subchunk_offset: Option<u16>,
    /// Version 2+ only.
    pub checksum: Option<u64>,
}

impl WadEntry {
    /// Read one entry record for the given archive major version.
    ///
    /// Fails with [`Error::UnsupportedCompression`] if the type nibble is
    /// outside the known set; the reader still advances past the record so
    /// the caller can continue with the next one.
    pub fn read(reader: &mut BinaryReader<'_>, major: u8) -> Result<Self> {
        let entry = if major == 1 {
            let record: EntryRecordV1 = reader.read_struct()?;
            Self::from_parts(
                record.path_hash,
                record.data_offset,
                record.compressed_size,
                record.decompressed_size,
                record.type_and_subchunk,
            )?
        } else {
            let record: EntryRecordV2 = reader.read_struct()?;
            let mut entry = Self::from_parts(
                record.path_hash,
                record.data_offset,
                record.compressed_size,
                record.decompressed_size,
                record.type_and_subchunk,
            )?;
            entry.contains_duplicates = Some(record.contains_duplicates != 0);
            entry.first_subchunk_offset = Some(record.first_subchunk_offset);
            entry.checksum = Some(record.checksum);
            entry
        };

        Ok(entry)
    }

    fn from_parts(
        path_hash: u64,
        data_offset: u32,
        compressed_size: u32,
        decompressed_size: u32,
        type_and_subchunk: u8,
    ) -> Result<Self> {
        let code = type_and_subchunk & 0x0F;
        let compression = CompressionType::try_from(code)
            .map_err(|code| Error::UnsupportedCompression { path_hash, code })?;

        Ok(Self {
            path_hash,
            data_offset,
            compressed_size,
            decompressed_size,
            compression,
            subchunk_count: type_and_subchunk >> 4,
            contains_duplicates: None,
            first_subchunk_offset: None,
            checksum: None,
        })
    }

    /// The path hash as the 16-character lowercase hex lookup key.
    pub fn hash_key(&self) -> String {
        format_hash(self.path_hash)
    }

    /// Byte range of the stored data within the archive.
    pub fn data_range(&self) -> std::ops::Range<usize> {
        let start = self.data_offset as usize;
        start..start + self.compressed_size as usize
    }
}
