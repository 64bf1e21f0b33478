//! WAD archive reader.

use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;
use wadkit_common::BinaryReader;

use crate::decompress::{self, EntryData};
use crate::header::WadHeader;
use crate::{Error, Result, WadEntry};

/// Backing bytes of an archive.
enum Source {
    /// Memory-mapped file; the file handle is released on drop.
    Mapped(Mmap),
    /// Owned in-memory buffer.
    Owned(Vec<u8>),
}

impl Deref for Source {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Source::Mapped(mmap) => &mmap[..],
            Source::Owned(bytes) => &bytes[..],
        }
    }
}

/// A parsed WAD archive.
///
/// The entry table is parsed eagerly; entry data is only decompressed on
/// [`WadArchive::read`]. Entries keep table order.
pub struct WadArchive {
    source: Source,
    name: String,
    header: WadHeader,
    /// One slot per table record. A slot is an error when the record names
    /// an unknown compression type.
    entries: Vec<Result<WadEntry>>,
}

impl WadArchive {
    /// Open and memory-map a WAD archive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Self::from_source(Source::Mapped(mmap), name)
    }

    /// Parse a WAD archive held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_source(Source::Owned(data), "memory".to_string())
    }

    fn from_source(source: Source, name: String) -> Result<Self> {
        let header = WadHeader::parse(&source)?;
        let entries = Self::parse_entries(&source, &header)?;

        tracing::debug!(
            "{}: WAD v{}.{} with {} entries",
            name,
            header.major,
            header.minor,
            entries.len()
        );

        Ok(Self {
            source,
            name,
            header,
            entries,
        })
    }

    /// Read the entry table.
    ///
    /// A truncated table fails the whole archive; a record with an unknown
    /// compression type only fails its own slot.
    fn parse_entries(data: &[u8], header: &WadHeader) -> Result<Vec<Result<WadEntry>>> {
        let mut reader = BinaryReader::new(data);
        reader.seek(header.entry_table_offset)?;

        // Validate the whole table up front so a bogus count cannot trigger
        // a huge allocation.
        reader.peek_bytes(header.entry_table_len())?;

        let mut entries = Vec::with_capacity(header.entry_count as usize);
        for index in 0..header.entry_count as usize {
            reader.seek(header.entry_table_offset + index * header.entry_stride)?;
            match WadEntry::read(&mut reader, header.major) {
                Err(e) if e.is_truncation() => return Err(e),
                Err(e) => {
                    tracing::warn!("entry {}: {}", index, e);
                    entries.push(Err(e));
                }
                Ok(entry) => entries.push(Ok(entry)),
            }
        }

        Ok(entries)
    }

    /// Get the archive name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the parsed header.
    #[inline]
    pub fn header(&self) -> &WadHeader {
        &self.header
    }

    /// Major and minor version.
    #[inline]
    pub fn version(&self) -> (u8, u8) {
        (self.header.major, self.header.minor)
    }

    /// Signature blob (versions 2 and 3).
    #[inline]
    pub fn signature(&self) -> Option<&[u8]> {
        self.header.signature.as_deref()
    }

    /// Whole-archive checksum (versions 2 and 3).
    #[inline]
    pub fn checksum(&self) -> Option<u64> {
        self.header.checksum
    }

    /// Get the number of entry records, including invalid ones.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over entry slots in table order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Result<WadEntry>> + '_ {
        self.entries.iter()
    }

    /// Iterate over valid entries in table order.
    pub fn entries(&self) -> impl Iterator<Item = &WadEntry> + '_ {
        self.entries.iter().filter_map(|slot| slot.as_ref().ok())
    }

    /// Get a valid entry by table index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&WadEntry> {
        self.entries.get(index).and_then(|slot| slot.as_ref().ok())
    }

    /// Find a valid entry by path hash.
    pub fn find(&self, path_hash: u64) -> Option<&WadEntry> {
        self.entries().find(|e| e.path_hash == path_hash)
    }

    /// Read entry contents, decompressing as needed.
    pub fn read(&self, entry: &WadEntry) -> Result<EntryData> {
        decompress::decompress(entry, &self.source)
    }

    /// Raw archive bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.source
    }
}

impl std::fmt::Debug for WadArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WadArchive")
            .field("name", &self.name)
            .field("version", &self.version())
            .field("entries", &self.entries.len())
            .finish()
    }
}
