//! Decompression of WAD entry data.
//!
//! Maps an entry's [`CompressionType`] to the action that produces its
//! payload. Gzip and Zstandard decoding are delegated to `flate2` and
//! `zstd`; redirected entries carry no payload and are surfaced as
//! [`EntryData::Redirect`].

use std::io::Read;

use flate2::read::GzDecoder;
use wadkit_common::BinaryReader;
use zstd::zstd_safe;

use crate::{CompressionType, Error, Result, WadEntry};

/// The result of reading one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryData {
    /// Decompressed payload bytes.
    Bytes(Vec<u8>),
    /// The payload lives in another archive.
    Redirect {
        /// Target path, when the redirect record could be read.
        target: Option<String>,
    },
}

impl EntryData {
    /// The payload bytes, if the entry was embedded.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            EntryData::Bytes(bytes) => Some(bytes),
            EntryData::Redirect { .. } => None,
        }
    }

    /// Consume into payload bytes, if the entry was embedded.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            EntryData::Bytes(bytes) => Some(bytes),
            EntryData::Redirect { .. } => None,
        }
    }
}

/// Produce the payload of `entry` from the archive bytes in `source`.
pub fn decompress(entry: &WadEntry, source: &[u8]) -> Result<EntryData> {
    let mut reader = BinaryReader::new(source);
    reader.seek(entry.data_offset as usize)?;
    let stored = reader.read_bytes(entry.compressed_size as usize)?;
    let expected_size = entry.decompressed_size as usize;

    let output = match entry.compression {
        CompressionType::Uncompressed => stored.to_vec(),
        CompressionType::Gzip => decompress_gzip_sized(stored, expected_size)?,
        CompressionType::Zstd => decompress_zstd_sized(stored, expected_size)?,
        CompressionType::ZstdChunked => {
            decompress_zstd_chunked(stored, expected_size, entry.subchunk_count)?
        }
        CompressionType::FileRedirect => {
            return Ok(EntryData::Redirect {
                target: read_redirect_target(stored),
            });
        }
    };

    if output.len() != expected_size {
        tracing::warn!(
            "entry {}: decompressed to {} bytes, header says {}",
            entry.hash_key(),
            output.len(),
            expected_size
        );
    }

    Ok(EntryData::Bytes(output))
}

/// Decompress a gzip member, producing at most `limit` bytes.
pub fn decompress_gzip(data: &[u8], limit: usize, output: &mut Vec<u8>) -> Result<()> {
    read_limited(GzDecoder::new(data), limit, output)
}

/// Decompress a gzip member with known output size.
pub fn decompress_gzip_sized(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(expected_size);
    decompress_gzip(data, expected_size, &mut output)?;
    Ok(output)
}

/// Decompress Zstandard-compressed data, producing at most `limit` bytes.
pub fn decompress_zstd(data: &[u8], limit: usize, output: &mut Vec<u8>) -> Result<()> {
    let decoder = zstd::Decoder::new(data).map_err(|e| Error::Decompression(e.to_string()))?;
    read_limited(decoder, limit, output)
}

/// Decompress Zstandard-compressed data with known output size.
pub fn decompress_zstd_sized(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(expected_size);
    decompress_zstd(data, expected_size, &mut output)?;
    Ok(output)
}

/// Decompress a run of independently compressed Zstandard subchunks.
///
/// The subchunk table itself is stored outside the archive, so boundaries
/// are taken from the frame headers. Outputs are concatenated in order, up
/// to `expected_size` bytes in total.
pub fn decompress_zstd_chunked(
    data: &[u8],
    expected_size: usize,
    subchunk_count: u8,
) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(expected_size);
    let mut position = 0;
    let mut frames = 0usize;

    while position < data.len() && output.len() < expected_size {
        let frame_len = zstd_safe::find_frame_compressed_size(&data[position..]).map_err(|code| {
            Error::Decompression(format!(
                "subchunk {} at offset {}: {}",
                frames,
                position,
                zstd_safe::get_error_name(code)
            ))
        })?;
        if frame_len == 0 {
            break;
        }

        let budget = expected_size - output.len();
        decompress_zstd(&data[position..position + frame_len], budget, &mut output)?;

        position += frame_len;
        frames += 1;
    }

    if position < data.len() {
        tracing::warn!(
            "zstd subchunks reach the declared size {} with {} stored bytes left",
            expected_size,
            data.len() - position
        );
    }

    if subchunk_count > 0 && frames != subchunk_count as usize {
        tracing::debug!(
            "found {} zstd frames, entry declares {} subchunks",
            frames,
            subchunk_count
        );
    }

    Ok(output)
}

/// Append the output of `decoder` to `output`, stopping after `limit` bytes.
///
/// Output beyond the limit is dropped with a warning, so a corrupt size
/// field cannot make a small entry inflate without bound.
fn read_limited<R: Read>(decoder: R, limit: usize, output: &mut Vec<u8>) -> Result<()> {
    let start = output.len();
    decoder
        .take(limit as u64 + 1)
        .read_to_end(output)
        .map_err(|e| Error::Decompression(e.to_string()))?;

    if output.len() - start > limit {
        tracing::warn!("decompressed output exceeds the declared {} bytes, truncating", limit);
        output.truncate(start + limit);
    }

    Ok(())
}

/// Redirect records hold a u32 length-prefixed path.
fn read_redirect_target(data: &[u8]) -> Option<String> {
    let mut reader = BinaryReader::new(data);
    let length = reader.read_u32().ok()? as usize;
    reader.read_string(length).ok().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn stored_entry(compression: CompressionType, data_offset: u32, stored: &[u8], size: usize) -> WadEntry {
        WadEntry {
            path_hash: 1,
            data_offset,
            compressed_size: stored.len() as u32,
            decompressed_size: size as u32,
            compression,
            subchunk_count: 0,
            contains_duplicates: None,
            first_subchunk_offset: None,
            checksum: None,
        }
    }

    #[test]
    fn test_uncompressed_is_identity() {
        let source = b"xxxxBKHDyyyy";
        let entry = stored_entry(CompressionType::Uncompressed, 4, b"BKHD", 4);

        let data = decompress(&entry, source).unwrap();
        assert_eq!(data.bytes(), Some(&b"BKHD"[..]));
    }

    #[test]
    fn test_zstd_roundtrip() {
        let original = b"Hello, World! This is a test of Zstandard compression.";
        let compressed = zstd::encode_all(&original[..], 3).unwrap();
        let entry = stored_entry(CompressionType::Zstd, 0, &compressed, original.len());

        let data = decompress(&entry, &compressed).unwrap();
        assert_eq!(data.into_bytes().unwrap(), original);
    }

    #[test]
    fn test_gzip_roundtrip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let original = b"Hello, World! This is a test of gzip compression.";
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();
        let entry = stored_entry(CompressionType::Gzip, 0, &compressed, original.len());

        let data = decompress(&entry, &compressed).unwrap();
        assert_eq!(data.into_bytes().unwrap(), original);
    }

    #[test]
    fn test_zstd_chunked_concatenates_frames() {
        let mut stored = zstd::encode_all(&b"first chunk|"[..], 3).unwrap();
        stored.extend(zstd::encode_all(&b"second chunk"[..], 3).unwrap());
        let mut entry = stored_entry(CompressionType::ZstdChunked, 0, &stored, 24);
        entry.subchunk_count = 2;

        let data = decompress(&entry, &stored).unwrap();
        assert_eq!(data.into_bytes().unwrap(), b"first chunk|second chunk");
    }

    #[test]
    fn test_output_is_capped_at_declared_size() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let original = vec![0u8; 64 * 1024];
        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&original).unwrap();
        let gzip = encoder.finish().unwrap();
        let entry = stored_entry(CompressionType::Gzip, 0, &gzip, 16);
        assert_eq!(decompress(&entry, &gzip).unwrap().into_bytes().unwrap().len(), 16);

        let zstd = zstd::encode_all(&original[..], 19).unwrap();
        let entry = stored_entry(CompressionType::Zstd, 0, &zstd, 100);
        assert_eq!(decompress(&entry, &zstd).unwrap().into_bytes().unwrap().len(), 100);
    }

    #[test]
    fn test_zstd_chunked_stops_at_declared_size() {
        let mut stored = zstd::encode_all(&b"first chunk|"[..], 3).unwrap();
        stored.extend(zstd::encode_all(&b"second chunk"[..], 3).unwrap());
        let mut entry = stored_entry(CompressionType::ZstdChunked, 0, &stored, 15);
        entry.subchunk_count = 2;

        let data = decompress(&entry, &stored).unwrap();
        assert_eq!(data.into_bytes().unwrap(), b"first chunk|sec");
    }

    #[test]
    fn test_corrupt_zstd_is_decompression_error() {
        let stored = b"definitely not zstd";
        let entry = stored_entry(CompressionType::Zstd, 0, stored, 64);

        assert!(matches!(
            decompress(&entry, stored),
            Err(Error::Decompression(_))
        ));
    }

    #[test]
    fn test_redirect_is_not_inlined() {
        let mut stored = 9u32.to_le_bytes().to_vec();
        stored.extend_from_slice(b"other.wad");
        let entry = stored_entry(CompressionType::FileRedirect, 0, &stored, 0);

        match decompress(&entry, &stored).unwrap() {
            EntryData::Redirect { target } => assert_eq!(target.as_deref(), Some("other.wad")),
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_data_out_of_bounds_is_truncation() {
        let entry = stored_entry(CompressionType::Uncompressed, 8, b"abcd", 4);
        let err = decompress(&entry, b"0123456789").unwrap_err();
        assert!(err.is_truncation());
    }
}
