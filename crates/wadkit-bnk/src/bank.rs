//! Sound bank parser.

use wadkit_common::BinaryReader;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::hirc::{self, HircObject};
use crate::{Error, Result};

/// Section tags.
pub mod tag {
    /// Bank header.
    pub const BKHD: [u8; 4] = *b"BKHD";
    /// Data index.
    pub const DIDX: [u8; 4] = *b"DIDX";
    /// Embedded audio data.
    pub const DATA: [u8; 4] = *b"DATA";
    /// Object hierarchy.
    pub const HIRC: [u8; 4] = *b"HIRC";
    /// Bank name table.
    pub const STID: [u8; 4] = *b"STID";
}

/// DIDX record as stored.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DidxRecord {
    /// Source id
    pub id: u32,
    /// Offset from the start of the DATA body
    pub offset: u32,
    /// Size in bytes
    pub size: u32,
}

impl DidxRecord {
    /// Size of one record.
    pub const SIZE: usize = 12;
}

/// An entry of the DIDX section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SoundSourceIndexEntry {
    pub id: u32,
    pub offset: u32,
    pub size: u32,
}

impl From<DidxRecord> for SoundSourceIndexEntry {
    fn from(record: DidxRecord) -> Self {
        Self {
            id: record.id,
            offset: record.offset,
            size: record.size,
        }
    }
}

/// An entry of the STID bank name table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringIdEntry {
    pub id: u32,
    pub name: String,
}

/// Location of one section within the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SectionHeader {
    /// Four-character tag.
    pub tag: [u8; 4],
    /// Offset of the section body.
    pub offset: usize,
    /// Declared body length.
    pub length: u32,
}

impl SectionHeader {
    /// The tag as text, for display.
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// A parsed sound bank.
///
/// Audio blobs and opaque record bodies borrow from the input buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Bank<'a> {
    /// BKHD bank version.
    pub version: Option<u32>,
    /// BKHD bank id.
    pub id: Option<u32>,
    /// Every section seen, in file order.
    pub sections: Vec<SectionHeader>,
    /// DIDX entries.
    pub sources: Vec<SoundSourceIndexEntry>,
    /// DATA slices, one per DIDX entry.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub audio: Vec<&'a [u8]>,
    /// HIRC records.
    pub objects: Vec<HircObject<'a>>,
    /// STID entries.
    pub strings: Vec<StringIdEntry>,
}

impl<'a> Bank<'a> {
    /// Check if data starts with a bank header.
    pub fn is_bank(data: &[u8]) -> bool {
        data.starts_with(&tag::BKHD)
    }

    /// Parse a sound bank.
    ///
    /// Sections are read until the input runs out; a trailing partial
    /// section header simply ends the walk. Unknown sections are skipped by
    /// their declared length.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if !Self::is_bank(data) {
            return Err(Error::InvalidMagic {
                actual: data[..4.min(data.len())].to_vec(),
            });
        }

        let mut bank = Bank::default();
        let mut reader = BinaryReader::new(data);
        let mut index: Option<Vec<SoundSourceIndexEntry>> = None;

        while !reader.is_empty() {
            let Ok(Ok(section_tag)) = reader.read_bytes(4).map(<[u8; 4]>::try_from) else {
                break;
            };
            let Ok(length) = reader.read_u32() else {
                break;
            };

            let offset = reader.position();
            let available = reader.remaining().min(length as usize);
            if available < length as usize {
                tracing::warn!(
                    "{} section at offset {} declares {} bytes, only {} available",
                    String::from_utf8_lossy(&section_tag),
                    offset,
                    length,
                    available
                );
            }
            let body = reader.read_bytes(available)?;

            bank.sections.push(SectionHeader {
                tag: section_tag,
                offset,
                length,
            });

            match section_tag {
                tag::BKHD => {
                    let mut body_reader = BinaryReader::new(body);
                    bank.version = Some(body_reader.read_u32()?);
                    bank.id = Some(body_reader.read_u32()?);
                }
                tag::DIDX => {
                    let sources = Self::read_index(body)?;
                    bank.sources.extend_from_slice(&sources);
                    index = Some(sources);
                }
                tag::DATA => {
                    let sources = index.as_ref().ok_or(Error::MissingIndex { offset })?;
                    for source in sources {
                        let mut slice_reader = BinaryReader::new(data);
                        slice_reader.seek(offset + source.offset as usize)?;
                        bank.audio.push(slice_reader.read_bytes(source.size as usize)?);
                    }
                }
                tag::HIRC => {
                    bank.objects.extend(hirc::read_objects(body));
                }
                tag::STID => {
                    bank.strings.extend(Self::read_string_ids(body)?);
                }
                other => {
                    tracing::debug!(
                        "skipping {} section ({} bytes)",
                        String::from_utf8_lossy(&other),
                        length
                    );
                }
            }
        }

        Ok(bank)
    }

    fn read_index(body: &[u8]) -> Result<Vec<SoundSourceIndexEntry>> {
        let mut reader = BinaryReader::new(body);
        let count = body.len() / DidxRecord::SIZE;

        let mut sources = Vec::with_capacity(count);
        for _ in 0..count {
            sources.push(reader.read_struct::<DidxRecord>()?.into());
        }
        Ok(sources)
    }

    fn read_string_ids(body: &[u8]) -> Result<Vec<StringIdEntry>> {
        let mut reader = BinaryReader::new(body);
        let _string_type = reader.read_u32()?;
        let count = reader.read_u32()? as usize;

        let mut strings = Vec::with_capacity(count.min(reader.remaining() / 5));
        for _ in 0..count {
            let id = reader.read_u32()?;
            let name = reader.read_u8_prefixed_bytes()?;
            strings.push(StringIdEntry {
                id,
                name: String::from_utf8_lossy(name).into_owned(),
            });
        }
        Ok(strings)
    }

    /// Iterate over sound-source objects.
    pub fn sounds(&self) -> impl Iterator<Item = &hirc::SoundObject<'a>> + '_ {
        self.objects.iter().filter_map(|object| match object {
            HircObject::Sound(sound) => Some(sound),
            _ => None,
        })
    }

    /// Audio blobs paired with their index entries.
    pub fn audio_sources(&self) -> impl Iterator<Item = (&SoundSourceIndexEntry, &'a [u8])> + '_ {
        self.sources.iter().zip(self.audio.iter().copied())
    }

    /// Name of a bank id from the STID table.
    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.strings
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, WriteBytesExt};

    fn section(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut data = tag.to_vec();
        data.write_u32::<LittleEndian>(body.len() as u32).unwrap();
        data.extend_from_slice(body);
        data
    }

    fn bkhd(version: u32, id: u32) -> Vec<u8> {
        let mut body = Vec::new();
        body.write_u32::<LittleEndian>(version).unwrap();
        body.write_u32::<LittleEndian>(id).unwrap();
        body.extend_from_slice(&[0; 8]);
        section(b"BKHD", &body)
    }

    fn didx(entries: &[(u32, u32, u32)]) -> Vec<u8> {
        let mut body = Vec::new();
        for &(id, offset, size) in entries {
            body.write_u32::<LittleEndian>(id).unwrap();
            body.write_u32::<LittleEndian>(offset).unwrap();
            body.write_u32::<LittleEndian>(size).unwrap();
        }
        section(b"DIDX", &body)
    }

    fn stid(names: &[(u32, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        body.write_u32::<LittleEndian>(1).unwrap();
        body.write_u32::<LittleEndian>(names.len() as u32).unwrap();
        for (id, name) in names {
            body.write_u32::<LittleEndian>(*id).unwrap();
            body.push(name.len() as u8);
            body.extend_from_slice(name.as_bytes());
        }
        section(b"STID", &body)
    }

    fn hirc_sound(id: u32) -> Vec<u8> {
        let mut body = Vec::new();
        body.write_u32::<LittleEndian>(1).unwrap();
        body.push(2);
        body.write_u32::<LittleEndian>(21).unwrap();
        body.write_u32::<LittleEndian>(id).unwrap();
        body.write_u32::<LittleEndian>(0).unwrap();
        body.write_u32::<LittleEndian>(0).unwrap();
        body.write_u32::<LittleEndian>(100).unwrap();
        body.write_u32::<LittleEndian>(200).unwrap();
        body.push(1);
        section(b"HIRC", &body)
    }

    #[test]
    fn test_full_bank() {
        let mut data = bkhd(0x86, 0xBEEF);
        data.extend(didx(&[(10, 0, 4), (11, 8, 3)]));
        data.extend(section(b"DATA", b"AAAA____BBB"));
        data.extend(hirc_sound(77));
        data.extend(stid(&[(0xBEEF, "vo_ahri")]));

        let bank = Bank::parse(&data).unwrap();
        assert_eq!(bank.version, Some(0x86));
        assert_eq!(bank.id, Some(0xBEEF));
        assert_eq!(bank.sections.len(), 5);
        assert_eq!(bank.sections[2].tag_str(), "DATA");
        assert_eq!(
            bank.sources,
            vec![
                SoundSourceIndexEntry { id: 10, offset: 0, size: 4 },
                SoundSourceIndexEntry { id: 11, offset: 8, size: 3 },
            ]
        );
        assert_eq!(bank.audio, vec![&b"AAAA"[..], &b"BBB"[..]]);
        assert_eq!(bank.sounds().count(), 1);
        assert_eq!(bank.sounds().next().unwrap().id, 77);
        assert_eq!(bank.name_of(0xBEEF), Some("vo_ahri"));
    }

    #[test]
    fn test_data_slices_match_index() {
        let mut data = bkhd(1, 1);
        data.extend(didx(&[(1, 0, 5), (2, 5, 7), (3, 12, 0)]));
        data.extend(section(b"DATA", &[0x55; 12]));

        let bank = Bank::parse(&data).unwrap();
        assert_eq!(bank.audio.len(), bank.sources.len());
        let slice_total: usize = bank.audio.iter().map(|a| a.len()).sum();
        let index_total: usize = bank.sources.iter().map(|s| s.size as usize).sum();
        assert_eq!(slice_total, index_total);
        assert_eq!(bank.audio_sources().count(), 3);
    }

    #[test]
    fn test_data_before_didx_is_structural_error() {
        let mut data = bkhd(1, 1);
        data.extend(section(b"DATA", b"AAAA"));
        data.extend(didx(&[(1, 0, 4)]));

        assert!(matches!(
            Bank::parse(&data),
            Err(Error::MissingIndex { .. })
        ));
    }

    #[test]
    fn test_data_slice_out_of_bounds() {
        let mut data = bkhd(1, 1);
        data.extend(didx(&[(1, 0, 64)]));
        data.extend(section(b"DATA", b"AAAA"));

        assert!(Bank::parse(&data).unwrap_err().is_truncation());
    }

    #[test]
    fn test_unknown_sections_are_skipped() {
        let mut data = bkhd(1, 1);
        data.extend(section(b"ENVS", &[0xFF; 13]));
        data.extend(stid(&[(5, "music")]));

        let bank = Bank::parse(&data).unwrap();
        assert_eq!(bank.sections.len(), 3);
        assert_eq!(bank.strings.len(), 1);
    }

    #[test]
    fn test_magic_only_yields_empty_bank() {
        let bank = Bank::parse(b"BKHD").unwrap();
        assert!(bank.sections.is_empty());
        assert_eq!(bank.version, None);
        assert!(bank.audio.is_empty());
    }

    #[test]
    fn test_truncated_hirc_keeps_records() {
        let mut data = bkhd(1, 1);
        let mut hirc = hirc_sound(1);
        // declare a second record that never arrives
        hirc[8] = 2;
        hirc.extend_from_slice(&[2, 21, 0, 0, 0, 1, 2]);
        let body_len = (hirc.len() - 8) as u32;
        hirc[4..8].copy_from_slice(&(body_len + 100).to_le_bytes());
        data.extend(hirc);

        let bank = Bank::parse(&data).unwrap();
        assert_eq!(bank.objects.len(), 1);
    }

    #[test]
    fn test_bad_magic() {
        assert!(matches!(
            Bank::parse(b"RIFF\0\0\0\0"),
            Err(Error::InvalidMagic { .. })
        ));
    }
}
