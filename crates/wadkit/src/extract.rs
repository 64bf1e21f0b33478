//! The extraction pipeline.

use std::fmt;

use wadkit_common::HashTable;
use wadkit_wad::{EntryData, WadArchive, WadEntry};

use crate::detect::Decoded;
use crate::sink::Sink;
use crate::Result;

/// Options for [`Extractor`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Process at most this many table records.
    pub max_entries: Option<usize>,
    /// Emit transcode requests for embedded audio.
    pub transcode: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_entries: None,
            transcode: true,
        }
    }
}

/// Per-outcome entry counts for one extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExtractSummary {
    /// Entries decoded as a known container.
    pub decoded: usize,
    /// Entries with no recognised signature.
    pub unknown: usize,
    /// Entries redirecting to another archive.
    pub redirected: usize,
    /// Entries that failed to read or decode.
    pub failed: usize,
}

impl ExtractSummary {
    pub fn total(&self) -> usize {
        self.decoded + self.unknown + self.redirected + self.failed
    }
}

impl fmt::Display for ExtractSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} decoded, {} unknown, {} redirected, {} failed",
            self.decoded, self.unknown, self.redirected, self.failed
        )
    }
}

/// Walks an archive's entry table, decodes each payload and hands the
/// results to a [`Sink`].
///
/// Entries are processed in table order. A failure reading or decoding one
/// entry is reported to the sink and counted; it never stops the walk.
pub struct Extractor<'h> {
    hashes: &'h HashTable,
    options: ExtractOptions,
}

impl<'h> Extractor<'h> {
    /// Create an extractor resolving names through `hashes`.
    pub fn new(hashes: &'h HashTable) -> Self {
        Self {
            hashes,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract every entry of `archive` into `sink`.
    pub fn run<S: Sink + ?Sized>(
        &self,
        archive: &WadArchive,
        sink: &mut S,
    ) -> Result<ExtractSummary> {
        let mut summary = ExtractSummary::default();
        let limit = self.options.max_entries.unwrap_or(usize::MAX);

        for (index, slot) in archive.iter().enumerate().take(limit) {
            match slot {
                Ok(entry) => self.process(archive, entry, sink, &mut summary)?,
                Err(e) => {
                    tracing::warn!("{}: entry {}: {}", archive.name(), index, e);
                    let identity = match e {
                        wadkit_wad::Error::UnsupportedCompression { path_hash, .. } => {
                            Some(self.hashes.identify(*path_hash))
                        }
                        _ => None,
                    };
                    sink.failed(identity.as_ref(), e)?;
                    summary.failed += 1;
                }
            }
        }

        tracing::info!("{}: {}", archive.name(), summary);
        Ok(summary)
    }

    fn process<S: Sink + ?Sized>(
        &self,
        archive: &WadArchive,
        entry: &WadEntry,
        sink: &mut S,
        summary: &mut ExtractSummary,
    ) -> Result<()> {
        let identity = self.hashes.identify(entry.path_hash);

        let bytes = match archive.read(entry) {
            Ok(EntryData::Bytes(bytes)) => bytes,
            Ok(EntryData::Redirect { target }) => {
                tracing::debug!("{} redirects to {:?}", identity, target);
                sink.redirect(&identity, target.as_deref())?;
                summary.redirected += 1;
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("{}: {}", identity, e);
                sink.failed(Some(&identity), &e)?;
                summary.failed += 1;
                return Ok(());
            }
        };

        match Decoded::decode(&bytes) {
            Ok(Some(decoded)) => {
                tracing::debug!("{}: {}", identity, decoded.kind());
                sink.decoded(&identity, &decoded)?;
                if self.options.transcode {
                    for request in decoded.transcode_requests(&identity) {
                        sink.transcode(&request)?;
                    }
                }
                summary.decoded += 1;
            }
            Ok(None) => {
                sink.unknown(&identity, &bytes)?;
                summary.unknown += 1;
            }
            Err(e) => {
                tracing::warn!("{}: {}", identity, e);
                sink.failed(Some(&identity), &e)?;
                summary.failed += 1;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::FormatKind;
    use crate::transcode::TranscodeRequest;

    use byteorder::{LittleEndian, WriteBytesExt};
    use wadkit_common::PathIdentity;

    #[derive(Debug, Default)]
    struct RecordingSink {
        decoded: Vec<(String, FormatKind)>,
        unknown: Vec<(String, Vec<u8>)>,
        redirects: Vec<(String, Option<String>)>,
        failed: Vec<Option<String>>,
        transcodes: Vec<(String, String, Vec<u8>)>,
    }

    impl Sink for RecordingSink {
        fn decoded(&mut self, identity: &PathIdentity, decoded: &Decoded<'_>) -> Result<()> {
            self.decoded.push((identity.to_string(), decoded.kind()));
            Ok(())
        }

        fn unknown(&mut self, identity: &PathIdentity, data: &[u8]) -> Result<()> {
            self.unknown.push((identity.to_string(), data.to_vec()));
            Ok(())
        }

        fn redirect(&mut self, identity: &PathIdentity, target: Option<&str>) -> Result<()> {
            self.redirects
                .push((identity.to_string(), target.map(str::to_string)));
            Ok(())
        }

        fn failed(
            &mut self,
            identity: Option<&PathIdentity>,
            _error: &(dyn std::error::Error + 'static),
        ) -> Result<()> {
            self.failed.push(identity.map(ToString::to_string));
            Ok(())
        }

        fn transcode(&mut self, request: &TranscodeRequest<'_>) -> Result<()> {
            self.transcodes.push((
                request.source_path.clone(),
                request.output_path.clone(),
                request.data.to_vec(),
            ));
            Ok(())
        }
    }

    /// Build a v1 archive with uncompressed-size equal to stored size.
    fn v1_archive(records: &[(u64, u8, Vec<u8>)]) -> WadArchive {
        let table_start = 16;
        let mut offset = table_start + records.len() * 24;

        let mut data = b"RW\x01\x00".to_vec();
        data.write_u16::<LittleEndian>(table_start as u16).unwrap();
        data.write_u16::<LittleEndian>(24).unwrap();
        data.write_u32::<LittleEndian>(records.len() as u32).unwrap();
        data.resize(table_start, 0);

        for (hash, type_byte, payload) in records {
            data.write_u64::<LittleEndian>(*hash).unwrap();
            data.write_u32::<LittleEndian>(offset as u32).unwrap();
            data.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            data.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            data.push(*type_byte);
            data.extend_from_slice(&[0; 3]);
            offset += payload.len();
        }
        for (_, _, payload) in records {
            data.extend_from_slice(payload);
        }

        WadArchive::from_bytes(data).unwrap()
    }

    fn transcode(source: &str, output: &str, data: &[u8]) -> (String, String, Vec<u8>) {
        (source.to_string(), output.to_string(), data.to_vec())
    }

    fn section(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.write_u32::<LittleEndian>(body.len() as u32).unwrap();
        out.extend_from_slice(body);
        out
    }

    fn bank_with_audio() -> Vec<u8> {
        let mut header = Vec::new();
        header.write_u32::<LittleEndian>(134).unwrap();
        header.write_u32::<LittleEndian>(7).unwrap();

        let mut index = Vec::new();
        for (id, offset, size) in [(100u32, 0u32, 3u32), (200, 3, 2)] {
            index.write_u32::<LittleEndian>(id).unwrap();
            index.write_u32::<LittleEndian>(offset).unwrap();
            index.write_u32::<LittleEndian>(size).unwrap();
        }

        let mut bank = section(b"BKHD", &header);
        bank.extend(section(b"DIDX", &index));
        bank.extend(section(b"DATA", b"aaabb"));
        bank
    }

    fn package_with_one_file() -> Vec<u8> {
        let mut data = b"r3d2".to_vec();
        data.write_u32::<LittleEndian>(1).unwrap();
        data.write_u32::<LittleEndian>(1).unwrap();
        data.write_u32::<LittleEndian>(16).unwrap();
        data.write_u32::<LittleEndian>(40).unwrap();
        data.write_u32::<LittleEndian>(2).unwrap();
        data.write_u32::<LittleEndian>(5).unwrap();
        for unit in "9.wem".encode_utf16() {
            data.write_u16::<LittleEndian>(unit).unwrap();
        }
        data.resize(40, 0);
        data.extend_from_slice(b"wv");
        data
    }

    fn string_table() -> Vec<u8> {
        let mut data = b"RST\x05".to_vec();
        data.write_u32::<LittleEndian>(1).unwrap();
        data.write_u64::<LittleEndian>(0x1).unwrap();
        data.extend_from_slice(b"hi\0");
        data
    }

    #[test]
    fn test_magic_only_bank_entry() {
        let archive = v1_archive(&[(0xABCD, 0, b"BKHD".to_vec())]);
        let hashes = HashTable::new();
        let mut sink = RecordingSink::default();

        let summary = Extractor::new(&hashes).run(&archive, &mut sink).unwrap();

        assert_eq!(
            summary,
            ExtractSummary {
                decoded: 1,
                ..Default::default()
            }
        );
        assert_eq!(
            sink.decoded,
            vec![("UnknownHash:000000000000abcd".to_string(), FormatKind::Bank)]
        );
        assert!(sink.transcodes.is_empty());
    }

    #[test]
    fn test_mixed_archive() {
        let mut broken_bank = section(b"BKHD", &[0; 8]);
        broken_bank.extend(section(b"DATA", b""));

        let mut redirect = Vec::new();
        redirect.write_u32::<LittleEndian>(9).unwrap();
        redirect.extend_from_slice(b"other.wad");

        let archive = v1_archive(&[
            (1, 0, bank_with_audio()),
            (2, 0, package_with_one_file()),
            (3, 0, string_table()),
            (4, 0, b"OggS....".to_vec()),
            (5, 2, redirect),
            (6, 0x0F, b"??".to_vec()),
            (7, 0, broken_bank),
        ]);

        let mut hashes = HashTable::new();
        hashes.insert(1, "assets/sounds/vo_events.bnk");
        hashes.insert(2, "assets/sounds/vo/ahri.wpk");
        hashes.insert(3, "data/menu/main.stringtable");

        let mut sink = RecordingSink::default();
        let summary = Extractor::new(&hashes).run(&archive, &mut sink).unwrap();

        assert_eq!(
            summary,
            ExtractSummary {
                decoded: 3,
                unknown: 1,
                redirected: 1,
                failed: 2,
            }
        );
        assert_eq!(summary.total(), 7);

        let kinds: Vec<FormatKind> = sink.decoded.iter().map(|(_, kind)| *kind).collect();
        assert_eq!(
            kinds,
            vec![FormatKind::Bank, FormatKind::Package, FormatKind::StringTable]
        );
        assert_eq!(
            sink.unknown,
            vec![("UnknownHash:0000000000000004".to_string(), b"OggS....".to_vec())]
        );
        assert_eq!(
            sink.redirects,
            vec![(
                "UnknownHash:0000000000000005".to_string(),
                Some("other.wad".to_string())
            )]
        );
        assert_eq!(
            sink.failed,
            vec![
                Some("UnknownHash:0000000000000006".to_string()),
                Some("UnknownHash:0000000000000007".to_string()),
            ]
        );
        assert_eq!(
            sink.transcodes,
            vec![
                transcode("vo_events_0.wem", "vo_events_0.wav", b"aaa"),
                transcode("vo_events_1.wem", "vo_events_1.wav", b"bb"),
                transcode(
                    "assets_sounds_vo_ahri_9.wem",
                    "assets_sounds_vo_ahri_9.wav",
                    b"wv"
                ),
            ]
        );
    }

    #[test]
    fn test_entry_cap() {
        let archive = v1_archive(&[
            (1, 0, b"a".to_vec()),
            (2, 0, b"b".to_vec()),
            (3, 0, b"c".to_vec()),
        ]);
        let hashes = HashTable::new();
        let mut sink = RecordingSink::default();

        let summary = Extractor::new(&hashes)
            .with_options(ExtractOptions {
                max_entries: Some(2),
                ..Default::default()
            })
            .run(&archive, &mut sink)
            .unwrap();

        assert_eq!(summary.unknown, 2);
        assert_eq!(sink.unknown.len(), 2);
    }

    #[test]
    fn test_transcode_disabled() {
        let archive = v1_archive(&[(1, 0, bank_with_audio())]);
        let hashes = HashTable::new();
        let mut sink = RecordingSink::default();

        Extractor::new(&hashes)
            .with_options(ExtractOptions {
                transcode: false,
                ..Default::default()
            })
            .run(&archive, &mut sink)
            .unwrap();

        assert_eq!(sink.decoded.len(), 1);
        assert!(sink.transcodes.is_empty());
    }
}
