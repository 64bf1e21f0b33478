//! Requests for external audio transcoding.
//!
//! Banks and packages carry raw `.wem` audio. The pipeline does not decode
//! audio itself; it names each blob and asks the sink to hand it to an
//! external transcoder, which writes a `.wav` next to it.

use wadkit_bnk::Bank;
use wadkit_common::{sanitize_file_name, PathIdentity};
use wadkit_wpk::Package;

/// Extension of raw audio blobs.
pub const SOURCE_EXTENSION: &str = "wem";

/// Extension of transcoded audio.
pub const OUTPUT_EXTENSION: &str = "wav";

/// One audio blob to transcode.
///
/// Paths are relative file names; the sink decides where they live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeRequest<'a> {
    /// Name of the temporary raw audio file.
    pub source_path: String,
    /// Name of the transcoded file.
    pub output_path: String,
    /// Raw audio bytes.
    pub data: &'a [u8],
}

impl<'a> TranscodeRequest<'a> {
    fn new(source_path: String, data: &'a [u8]) -> Self {
        let output_path = output_name(&source_path);
        Self {
            source_path,
            output_path,
            data,
        }
    }

    /// One request per DATA blob, named `<bank stem>_<index>.wem`.
    pub fn from_bank(identity: &PathIdentity, bank: &Bank<'a>) -> Vec<Self> {
        let mut stem = identity.file_name();
        if stem.ends_with(".bnk") {
            stem.truncate(stem.len() - ".bnk".len());
        }

        bank.audio
            .iter()
            .copied()
            .enumerate()
            .map(|(i, data)| Self::new(format!("{}_{}.{}", stem, i, SOURCE_EXTENSION), data))
            .collect()
    }

    /// One request per package file, named `<flattened package path>_<name>`.
    ///
    /// File names come from the package itself, so separators in them are
    /// flattened along with the package path.
    pub fn from_package(identity: &PathIdentity, package: &Package<'a>) -> Vec<Self> {
        let prefix = match identity {
            PathIdentity::Resolved(path) => strip_extension(path).to_string(),
            PathIdentity::Unknown(_) => identity.file_name(),
        };

        package
            .entries
            .iter()
            .map(|entry| {
                let name = sanitize_file_name(&format!("{}_{}", prefix, entry.name));
                Self::new(name, entry.data)
            })
            .collect()
    }
}

fn strip_extension(path: &str) -> &str {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[name_start..].find('.') {
        Some(dot) => &path[..name_start + dot],
        None => path,
    }
}

fn output_name(source: &str) -> String {
    let suffix = format!(".{}", SOURCE_EXTENSION);
    match source.strip_suffix(&suffix) {
        Some(stem) => format!("{}.{}", stem, OUTPUT_EXTENSION),
        None => format!("{}.{}", source, OUTPUT_EXTENSION),
    }
}
