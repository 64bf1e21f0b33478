//! WAD header structures.
//!
//! All versions start with the 2-byte magic `"RW"` followed by the major and
//! minor version bytes. The remainder depends on the major version:
//!
//! | Version | Layout after the version bytes | Header size |
//! |---|---|---|
//! | 1 | `toc_offset:u16, toc_entry_size:u16, entry_count:u32` | 12 |
//! | 2 | `sig_len:u8, sig:[u8; 83], checksum:u64, toc_offset:u16, toc_entry_size:u16, entry_count:u32` | 104 |
//! | 3 | `sig:[u8; 256], checksum:u64, entry_count:u32` | 272 |
//!
//! Version 3 has no table offset field; the entry table follows the header.

use wadkit_common::BinaryReader;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// Archive magic bytes.
pub const MAGIC: &[u8; 2] = b"RW";

/// Version 1 header fields (after magic and version).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct HeaderV1 {
    /// Absolute offset of the entry table.
    pub entry_table_offset: u16,
    /// Declared size of one entry record.
    pub entry_size: u16,
    /// Number of entries.
    pub entry_count: u32,
}

/// Version 2 header fields (after magic and version).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct HeaderV2 {
    /// Number of meaningful bytes in `signature`.
    pub signature_length: u8,
    /// ECDSA signature, zero padded.
    pub signature: [u8; 83],
    /// Whole-archive checksum.
    pub checksum: u64,
    /// Absolute offset of the entry table.
    pub entry_table_offset: u16,
    /// Declared size of one entry record.
    pub entry_size: u16,
    /// Number of entries.
    pub entry_count: u32,
}

/// Version 3 header fields (after magic and version).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct HeaderV3 {
    /// ECDSA signature.
    pub signature: [u8; 256],
    /// Whole-archive checksum.
    pub checksum: u64,
    /// Number of entries.
    pub entry_count: u32,
}

/// Parsed archive header, normalized across versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WadHeader {
    /// Major version (1-3).
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Signature blob (versions 2 and 3).
    pub signature: Option<Vec<u8>>,
    /// Whole-archive checksum (versions 2 and 3).
    pub checksum: Option<u64>,
    /// Absolute offset of the first entry record.
    pub entry_table_offset: usize,
    /// Distance between consecutive entry records.
    pub entry_stride: usize,
    /// Number of entry records.
    pub entry_count: u32,
}

impl WadHeader {
    /// Size of the magic plus version bytes.
    const PREFIX_LEN: usize = 4;

    /// Size of an entry record for a major version.
    pub const fn record_size(major: u8) -> usize {
        if major == 1 {
            24
        } else {
            32
        }
    }

    /// Parse the header from the start of an archive.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        reader.expect_magic(MAGIC).map_err(|e| match e {
            wadkit_common::Error::InvalidMagic { actual, .. } => Error::InvalidMagic { actual },
            other => Error::Common(other),
        })?;

        let major = reader.read_u8()?;
        let minor = reader.read_u8()?;
        debug_assert_eq!(reader.position(), Self::PREFIX_LEN);

        let header = match major {
            1 => {
                let fields: HeaderV1 = reader.read_struct()?;
                Self {
                    major,
                    minor,
                    signature: None,
                    checksum: None,
                    entry_table_offset: fields.entry_table_offset as usize,
                    entry_stride: Self::stride(major, fields.entry_size),
                    entry_count: fields.entry_count,
                }
            }
            2 => {
                let fields: HeaderV2 = reader.read_struct()?;
                let signature_len = (fields.signature_length as usize).min(fields.signature.len());
                Self {
                    major,
                    minor,
                    signature: Some(fields.signature[..signature_len].to_vec()),
                    checksum: Some(fields.checksum),
                    entry_table_offset: fields.entry_table_offset as usize,
                    entry_stride: Self::stride(major, fields.entry_size),
                    entry_count: fields.entry_count,
                }
            }
            3 => {
                let fields: HeaderV3 = reader.read_struct()?;
                Self {
                    major,
                    minor,
                    signature: Some(fields.signature.to_vec()),
                    checksum: Some(fields.checksum),
                    entry_table_offset: reader.position(),
                    entry_stride: Self::record_size(major),
                    entry_count: fields.entry_count,
                }
            }
            _ => return Err(Error::UnsupportedVersion { major, minor }),
        };

        Ok(header)
    }

    /// Records are never read shorter than the version's record layout.
    fn stride(major: u8, declared: u16) -> usize {
        (declared as usize).max(Self::record_size(major))
    }

    /// Total byte length of the entry table.
    pub fn entry_table_len(&self) -> usize {
        self.entry_count as usize * self.entry_stride
    }
}
