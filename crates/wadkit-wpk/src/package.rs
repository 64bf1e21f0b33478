//! Audio package parser.

use wadkit_common::BinaryReader;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// Package magic bytes.
pub const MAGIC: &[u8; 4] = b"r3d2";

/// Header following the magic.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct PackageHeader {
    /// Format version
    pub version: u32,
    /// Number of slots in the offset table
    pub file_count: u32,
}

/// File record pointed to by the offset table.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct FileRecord {
    /// Absolute offset of the file data
    pub data_offset: u32,
    /// Size of the file data
    pub data_size: u32,
    /// Name length in UTF-16 code units
    pub name_length: u32,
}

/// One file embedded in a package.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PackageFileEntry<'a> {
    /// File name, usually `<id>.wem`.
    pub name: String,
    /// Absolute offset of the data within the package.
    pub offset: u32,
    /// Data size in bytes.
    pub size: u32,
    /// File contents.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub data: &'a [u8],
}

/// A parsed audio package.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Package<'a> {
    pub version: u32,
    pub file_count: u32,
    /// Offset table; zero marks an empty slot.
    pub offsets: Vec<u32>,
    /// Files for the non-zero slots, in offset table order.
    pub entries: Vec<PackageFileEntry<'a>>,
}

impl<'a> Package<'a> {
    /// Check if data starts with the package magic.
    pub fn is_package(data: &[u8]) -> bool {
        data.starts_with(MAGIC)
    }

    /// Parse an audio package.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if !Self::is_package(data) {
            return Err(Error::InvalidMagic {
                actual: data[..MAGIC.len().min(data.len())].to_vec(),
            });
        }

        let mut reader = BinaryReader::new_at(data, MAGIC.len());
        let header: PackageHeader = reader.read_struct()?;

        // The whole offset table must be present before anything is allocated.
        let table = reader.read_bytes(header.file_count as usize * 4)?;
        let mut table_reader = BinaryReader::new(table);
        let mut offsets = Vec::with_capacity(header.file_count as usize);
        for _ in 0..header.file_count {
            offsets.push(table_reader.read_u32()?);
        }

        let mut entries = Vec::new();
        for (index, &offset) in offsets.iter().enumerate() {
            if offset == 0 {
                tracing::debug!("package slot {} is empty", index);
                continue;
            }

            let entry = Self::read_entry(data, offset).map_err(|source| Error::Entry {
                index,
                offset,
                source,
            })?;
            entries.push(entry);
        }

        Ok(Self {
            version: header.version,
            file_count: header.file_count,
            offsets,
            entries,
        })
    }

    fn read_entry(data: &'a [u8], offset: u32) -> wadkit_common::Result<PackageFileEntry<'a>> {
        let mut reader = BinaryReader::new(data);
        reader.seek(offset as usize)?;

        let record: FileRecord = reader.read_struct()?;
        let name = reader.read_utf16(record.name_length as usize)?;

        reader.seek(record.data_offset as usize)?;
        let payload = reader.read_bytes(record.data_size as usize)?;

        Ok(PackageFileEntry {
            name,
            offset: record.data_offset,
            size: record.data_size,
            data: payload,
        })
    }

    /// Find a file by name.
    pub fn find(&self, name: &str) -> Option<&PackageFileEntry<'a>> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}
