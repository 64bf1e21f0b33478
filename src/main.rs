//! Wadkit CLI - Command-line tool for WAD game archive extraction.
//!
//! This is the main entry point for the wadkit command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use wadkit::prelude::*;

/// Wadkit - WAD game archive extraction tool
#[derive(Parser)]
#[command(name = "wadkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and decode every entry of a WAD archive
    Extract {
        /// Path to the WAD file
        #[arg(short, long)]
        wad: PathBuf,

        /// Hash to path mapping file
        #[arg(long, env = "WADKIT_HASHES")]
        hashes: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, env = "WADKIT_OUTPUT", default_value = ".")]
        output: PathBuf,

        /// Audio transcoder, invoked as `<transcoder> -i <wem> -o <wav>`
        #[arg(long, env = "WADKIT_TRANSCODER", default_value = "vgmstream-cli")]
        transcoder: PathBuf,

        /// Do not transcode embedded audio
        #[arg(long)]
        no_transcode: bool,

        /// Process at most this many entries
        #[arg(long)]
        max_entries: Option<usize>,
    },

    /// List the entry table of a WAD archive
    List {
        /// Path to the WAD file
        #[arg(short, long)]
        wad: PathBuf,

        /// Hash to path mapping file
        #[arg(long, env = "WADKIT_HASHES")]
        hashes: Option<PathBuf>,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Decode a standalone bank, package or string table and print it as JSON
    Inspect {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Extract {
            wad,
            hashes,
            output,
            transcoder,
            no_transcode,
            max_entries,
        } => {
            let options = ExtractOptions {
                max_entries,
                transcode: !no_transcode,
            };
            cmd_extract(&wad, hashes.as_deref(), &output, transcoder, options)?;
        }
        Commands::List {
            wad,
            hashes,
            detailed,
        } => {
            cmd_list(&wad, hashes.as_deref(), detailed)?;
        }
        Commands::Inspect { input } => {
            cmd_inspect(&input)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_hashes(path: Option<&Path>) -> Result<HashTable> {
    match path {
        Some(path) => {
            let table = HashTable::load(path)
                .with_context(|| format!("Failed to load hashes from {}", path.display()))?;
            tracing::info!("Loaded {} path hashes", table.len());
            Ok(table)
        }
        None => {
            tracing::warn!("No hash file given, all entries will be named by hash");
            Ok(HashTable::new())
        }
    }
}

fn cmd_extract(
    wad_path: &Path,
    hashes: Option<&Path>,
    output: &Path,
    transcoder: PathBuf,
    options: ExtractOptions,
) -> Result<()> {
    println!("Opening WAD archive: {}", wad_path.display());

    let hashes = load_hashes(hashes)?;

    let start = Instant::now();
    let archive = WadArchive::open(wad_path).context("Failed to open WAD archive")?;
    let (major, minor) = archive.version();

    println!(
        "Loaded v{}.{} archive with {} entries in {:?}",
        major,
        minor,
        archive.entry_count(),
        start.elapsed()
    );

    let total = options
        .max_entries
        .map_or(archive.entry_count(), |cap| cap.min(archive.entry_count()));

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let mut sink = FsSink::create(output, transcoder, pb.clone())?;

    let start = Instant::now();
    let summary = Extractor::new(&hashes)
        .with_options(options)
        .run(&archive, &mut sink)
        .context("Extraction aborted")?;

    pb.finish_with_message("Done");
    println!("Extraction completed in {:?}: {}", start.elapsed(), summary);
    if sink.transcoded + sink.transcode_failures > 0 {
        println!(
            "Transcoded {} audio files ({} failed)",
            sink.transcoded, sink.transcode_failures
        );
    }

    Ok(())
}

fn cmd_list(wad_path: &Path, hashes: Option<&Path>, detailed: bool) -> Result<()> {
    let hashes = load_hashes(hashes)?;
    let archive = WadArchive::open(wad_path).context("Failed to open WAD archive")?;

    if detailed {
        let (major, minor) = archive.version();
        println!("Version: {}.{}", major, minor);
        if let Some(checksum) = archive.checksum() {
            println!("Checksum: {:016x}", checksum);
        }
        if let Some(signature) = archive.signature() {
            println!("Signature: {} bytes", signature.len());
        }
        println!();
    }

    let mut invalid = 0;
    for (index, slot) in archive.iter().enumerate() {
        let entry = match slot {
            Ok(entry) => entry,
            Err(e) => {
                println!("#{}: <invalid: {}>", index, e);
                invalid += 1;
                continue;
            }
        };

        let identity = hashes.identify(entry.path_hash);
        if detailed {
            println!(
                "{:>12} {:>12} {:>10} {:>3} {}",
                entry.compressed_size,
                entry.decompressed_size,
                entry.compression.to_string(),
                entry.subchunk_count,
                identity
            );
        } else {
            println!("{}", identity);
        }
    }

    println!("\nTotal: {} entries ({} invalid)", archive.entry_count(), invalid);

    Ok(())
}

fn cmd_inspect(input: &Path) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;

    let decoded = Decoded::decode(&data)
        .with_context(|| format!("Failed to decode {}", input.display()))?
        .ok_or_else(|| anyhow::anyhow!("{} has no known signature", input.display()))?;

    tracing::info!("{}: {}", input.display(), decoded.kind());
    println!("{}", serde_json::to_string_pretty(&decoded)?);

    Ok(())
}

/// Writes extraction results below an output directory:
///
/// - `extracted/` - string tables as text, transcoded audio
/// - `unknowns/` - payloads with no known signature
struct FsSink {
    extracted: PathBuf,
    unknowns: PathBuf,
    transcoder: PathBuf,
    progress: ProgressBar,
    transcoded: usize,
    transcode_failures: usize,
}

impl FsSink {
    fn create(output: &Path, transcoder: PathBuf, progress: ProgressBar) -> Result<Self> {
        let extracted = output.join("extracted");
        let unknowns = output.join("unknowns");
        fs::create_dir_all(&extracted)
            .with_context(|| format!("Failed to create {}", extracted.display()))?;
        fs::create_dir_all(&unknowns)
            .with_context(|| format!("Failed to create {}", unknowns.display()))?;

        Ok(Self {
            extracted,
            unknowns,
            transcoder,
            progress,
            transcoded: 0,
            transcode_failures: 0,
        })
    }

    fn run_transcoder(&self, source: &Path, output: &Path) -> std::io::Result<bool> {
        let status = Command::new(&self.transcoder)
            .arg("-i")
            .arg(source)
            .arg("-o")
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        Ok(status.success())
    }
}

impl Sink for FsSink {
    fn decoded(&mut self, identity: &PathIdentity, decoded: &Decoded<'_>) -> wadkit::Result<()> {
        if let Decoded::StringTable(table) = decoded {
            fs::write(self.extracted.join(identity.flat_name()), table.to_text())?;
        }
        self.progress.inc(1);
        Ok(())
    }

    fn unknown(&mut self, identity: &PathIdentity, data: &[u8]) -> wadkit::Result<()> {
        fs::write(self.unknowns.join(identity.file_name()), data)?;
        self.progress.inc(1);
        Ok(())
    }

    fn redirect(&mut self, _identity: &PathIdentity, _target: Option<&str>) -> wadkit::Result<()> {
        self.progress.inc(1);
        Ok(())
    }

    fn failed(
        &mut self,
        _identity: Option<&PathIdentity>,
        _error: &(dyn std::error::Error + 'static),
    ) -> wadkit::Result<()> {
        self.progress.inc(1);
        Ok(())
    }

    fn transcode(&mut self, request: &TranscodeRequest<'_>) -> wadkit::Result<()> {
        let source = self.extracted.join(&request.source_path);
        let output = self.extracted.join(&request.output_path);

        // A blob that cannot be written fails only its own transcode.
        if let Err(e) = fs::write(&source, request.data) {
            tracing::warn!("Failed to write {}: {}", source.display(), e);
            self.transcode_failures += 1;
            return Ok(());
        }

        // The raw file is kept when transcoding fails so no audio is lost.
        match self.run_transcoder(&source, &output) {
            Ok(true) => {
                if let Err(e) = fs::remove_file(&source) {
                    tracing::warn!("Failed to remove {}: {}", source.display(), e);
                }
                self.transcoded += 1;
            }
            Ok(false) => {
                tracing::warn!("{} failed on {}", self.transcoder.display(), source.display());
                self.transcode_failures += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to run {}: {}", self.transcoder.display(), e);
                self.transcode_failures += 1;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use byteorder::{LittleEndian, WriteBytesExt};

    const TABLE_HASH: u64 = 0x10;
    const PACKAGE_HASH: u64 = 0x20;
    const UNKNOWN_HASH: u64 = 0x30;

    fn sink(output: &Path, transcoder: impl Into<PathBuf>) -> FsSink {
        FsSink::create(output, transcoder.into(), ProgressBar::hidden()).unwrap()
    }

    fn hashes() -> HashTable {
        let mut table = HashTable::new();
        table.insert(TABLE_HASH, "data/menu/en_us/main.stringtable");
        table.insert(PACKAGE_HASH, "sounds/vo.wpk");
        table
    }

    /// v1 archive with every entry stored uncompressed.
    fn archive(records: &[(u64, Vec<u8>)]) -> WadArchive {
        let table_start = 16;
        let mut offset = table_start + records.len() * 24;

        let mut data = b"RW\x01\x00".to_vec();
        data.write_u16::<LittleEndian>(table_start as u16).unwrap();
        data.write_u16::<LittleEndian>(24).unwrap();
        data.write_u32::<LittleEndian>(records.len() as u32).unwrap();
        data.resize(table_start, 0);

        for (hash, payload) in records {
            data.write_u64::<LittleEndian>(*hash).unwrap();
            data.write_u32::<LittleEndian>(offset as u32).unwrap();
            data.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            data.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            data.extend_from_slice(&[0; 4]);
            offset += payload.len();
        }
        for (_, payload) in records {
            data.extend_from_slice(payload);
        }

        WadArchive::from_bytes(data).unwrap()
    }

    fn string_table() -> Vec<u8> {
        let mut data = b"RST\x05".to_vec();
        data.write_u32::<LittleEndian>(1).unwrap();
        data.write_u64::<LittleEndian>(0x1).unwrap();
        data.extend_from_slice(b"hi\0");
        data
    }

    fn package(name: &str, payload: &[u8]) -> Vec<u8> {
        let units: Vec<u16> = name.encode_utf16().collect();
        let data_offset = 28 + units.len() * 2;

        let mut data = b"r3d2".to_vec();
        data.write_u32::<LittleEndian>(1).unwrap();
        data.write_u32::<LittleEndian>(1).unwrap();
        data.write_u32::<LittleEndian>(16).unwrap();
        data.write_u32::<LittleEndian>(data_offset as u32).unwrap();
        data.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        data.write_u32::<LittleEndian>(units.len() as u32).unwrap();
        for unit in units {
            data.write_u16::<LittleEndian>(unit).unwrap();
        }
        data.extend_from_slice(payload);
        data
    }

    fn request(source_path: &str, data: &'static [u8]) -> TranscodeRequest<'static> {
        TranscodeRequest {
            source_path: source_path.to_string(),
            output_path: source_path.replace(".wem", ".wav"),
            data,
        }
    }

    #[test]
    fn test_output_layout() {
        let dir = tempfile::tempdir().unwrap();
        let archive = archive(&[
            (TABLE_HASH, string_table()),
            (UNKNOWN_HASH, b"OggS\0\x02".to_vec()),
        ]);
        let hashes = hashes();
        let mut sink = sink(dir.path(), dir.path().join("no-transcoder"));

        let summary = Extractor::new(&hashes).run(&archive, &mut sink).unwrap();
        assert_eq!(summary.decoded, 1);
        assert_eq!(summary.unknown, 1);

        let text =
            fs::read_to_string(dir.path().join("extracted/data_menu_en_us_main.stringtable"))
                .unwrap();
        assert_eq!(text, "0x1: hi\n");

        let unknown = fs::read(dir.path().join("unknowns/UnknownHash_0000000000000030")).unwrap();
        assert_eq!(unknown, b"OggS\0\x02");
    }

    #[test]
    fn test_package_file_name_with_separator_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let archive = archive(&[
            (PACKAGE_HASH, package("sub/1.wem", b"RIFF")),
            (UNKNOWN_HASH, b"OggS".to_vec()),
        ]);
        let hashes = hashes();
        let mut sink = sink(dir.path(), dir.path().join("no-transcoder"));

        let summary = Extractor::new(&hashes).run(&archive, &mut sink).unwrap();
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.unknown, 1);

        assert!(dir.path().join("unknowns/UnknownHash_0000000000000030").is_file());
        let raw = fs::read(dir.path().join("extracted/sounds_vo_sub_1.wem")).unwrap();
        assert_eq!(raw, b"RIFF");
        assert_eq!(sink.transcode_failures, 1);
    }

    #[test]
    fn test_unwritable_source_counts_as_failed_transcode() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink(dir.path(), dir.path().join("no-transcoder"));

        sink.transcode(&request("missing/a_0.wem", b"RIFF")).unwrap();
        assert_eq!(sink.transcoded, 0);
        assert_eq!(sink.transcode_failures, 1);
    }

    #[test]
    fn test_missing_transcoder_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink(dir.path(), dir.path().join("no-transcoder"));

        sink.transcode(&request("a_0.wem", b"RIFF")).unwrap();
        assert_eq!(sink.transcode_failures, 1);
        assert_eq!(fs::read(dir.path().join("extracted/a_0.wem")).unwrap(), b"RIFF");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_transcode_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink(dir.path(), "/bin/false");

        sink.transcode(&request("a_0.wem", b"RIFF")).unwrap();
        assert_eq!(sink.transcoded, 0);
        assert_eq!(sink.transcode_failures, 1);
        assert!(dir.path().join("extracted/a_0.wem").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_transcode_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink(dir.path(), "/bin/true");

        sink.transcode(&request("a_0.wem", b"RIFF")).unwrap();
        assert_eq!(sink.transcoded, 1);
        assert_eq!(sink.transcode_failures, 0);
        assert!(!dir.path().join("extracted/a_0.wem").exists());
    }
}
