//! Asmstore CLI - Command-line tool for AssemblyStore blobs.
//!
//! This is the main entry point for the asmstore command-line application.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};

use asmstore::prelude::*;

/// Asmstore - AssemblyStore blob extraction tool
#[derive(Parser)]
#[command(name = "asmstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print header and per-entry diagnostics
    #[arg(short, long, global = true, env = "ASMSTORE_DEBUG")]
    verbose: bool,

    /// What to do when a payload fails to decompress
    #[arg(long, global = true, value_enum, default_value_t = OnDecompressError::Abort)]
    on_decompress_error: OnDecompressError,

    /// Arena budget in bytes (derived from the entry count by default)
    #[arg(long, global = true)]
    arena_capacity: Option<usize>,

    /// Manifest file (defaults to the blob path with a .manifest extension)
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the assemblies in a blob
    List {
        /// Path to the blob file
        blob: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show size, hash and index row
        #[arg(short, long)]
        detailed: bool,

        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract assemblies next to the blob
    Extract {
        /// Path to the blob file
        blob: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show the blob header and table sizes
    Info {
        /// Path to the blob file
        blob: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OnDecompressError {
    /// Stop decoding
    Abort,
    /// Skip the entry and continue
    Skip,
}

impl From<OnDecompressError> for DecompressErrorPolicy {
    fn from(value: OnDecompressError) -> Self {
        match value {
            OnDecompressError::Abort => DecompressErrorPolicy::Abort,
            OnDecompressError::Skip => DecompressErrorPolicy::SkipRow,
        }
    }
}

impl Cli {
    fn decode_options(&self) -> DecodeOptions {
        let mut options = DecodeOptions::new()
            .verbose(self.verbose)
            .on_decompress_error(self.on_decompress_error.into());

        if let Some(capacity) = self.arena_capacity {
            options = options.arena_capacity(capacity);
        }
        if let Some(manifest) = &self.manifest {
            options = options.manifest_path(manifest);
        }
        options
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = cli.decode_options();

    match cli.command {
        Commands::List {
            blob,
            filter,
            detailed,
            json,
        } => {
            cmd_list(&blob, options, filter.as_deref(), detailed, json)?;
        }
        Commands::Extract { blob, filter } => {
            cmd_extract(&blob, options.extract(true), filter.as_deref())?;
        }
        Commands::Info { blob } => {
            cmd_info(&blob, options)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn open_blob(blob: &Path, options: DecodeOptions) -> Result<BlobDecoder<BufReader<File>>> {
    BlobDecoder::open(blob, options)
        .with_context(|| format!("Failed to open blob {}", blob.display()))
}

fn compile_filter(filter: Option<&str>) -> Result<Option<Pattern>> {
    filter
        .map(|pattern| {
            Pattern::new(pattern).with_context(|| format!("Invalid filter pattern: {}", pattern))
        })
        .transpose()
}

fn filter_matches(pattern: Option<&Pattern>, name: &str) -> bool {
    pattern.map_or(true, |p| p.matches(name))
}

fn cmd_list(
    blob: &Path,
    options: DecodeOptions,
    filter: Option<&str>,
    detailed: bool,
    json: bool,
) -> Result<()> {
    let pattern = compile_filter(filter)?;

    let decoder = open_blob(blob, options)?;
    let arena = decoder
        .create_arena()
        .context("Failed to allocate decode arena")?;
    let catalog = decoder.decode(&arena).context("Failed to decode blob")?;

    let entries: Vec<_> = catalog
        .iter()
        .filter(|e| filter_matches(pattern.as_ref(), e.name))
        .collect();

    if json {
        let infos: Vec<EntryInfo> = entries.iter().map(|e| e.to_info()).collect();
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    for entry in &entries {
        if detailed {
            println!(
                "{:>12} {:#010x} {:>6} {}",
                entry.size, entry.hash32, entry.row, entry.name
            );
        } else {
            println!("{}", entry.name);
        }
    }

    println!("\nTotal: {} entries", entries.len());
    if !catalog.skipped().is_empty() {
        println!("Skipped: {} rows", catalog.skipped().len());
    }

    Ok(())
}

fn cmd_extract(blob: &Path, options: DecodeOptions, filter: Option<&str>) -> Result<()> {
    let pattern = compile_filter(filter)?;

    println!("Opening blob: {}", blob.display());

    let start = Instant::now();
    let decoder = open_blob(blob, options)?;
    let arena = decoder
        .create_arena()
        .context("Failed to allocate decode arena")?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} extracted {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let catalog = decoder
        .decode_with(&arena, |path, data| {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            if !filter_matches(pattern.as_ref(), name) {
                return Ok(());
            }

            fs::write(path, data)?;
            pb.set_message(name.to_string());
            pb.inc(1);
            Ok(())
        })
        .context("Failed to extract blob")?;

    pb.finish_with_message("Done");
    println!(
        "Extracted {} of {} entries in {:?}",
        pb.position(),
        catalog.count(),
        start.elapsed()
    );
    if !catalog.skipped().is_empty() {
        println!("Skipped: {} rows", catalog.skipped().len());
    }

    Ok(())
}

fn cmd_info(blob: &Path, options: DecodeOptions) -> Result<()> {
    let mut decoder = open_blob(blob, options)?;
    let header = *decoder.header();

    println!("Blob: {}", blob.display());
    println!("Magic: {:#010x}", header.magic.get());
    println!("Version: {:#x}", header.version());
    println!("Entries: {}", header.entry_count());
    println!("Index entries: {}", header.index_entry_count());
    println!("Index size: {}", header.index_size());

    let arena = decoder
        .create_arena()
        .context("Failed to allocate decode arena")?;
    let tables = decoder
        .read_tables(&arena)
        .context("Failed to read index tables")?;

    println!("Descriptor table: {} rows", tables.descriptors.len());
    println!(
        "  with debug data: {}, with config data: {}",
        tables.descriptors.iter().filter(|d| d.has_debug_data()).count(),
        tables.descriptors.iter().filter(|d| d.has_config_data()).count()
    );
    println!(
        "Hash tables: {} + {} rows",
        tables.hash32.len(),
        tables.hash64.len()
    );
    println!(
        "Tables end at: {:#x}",
        header.tables_end().unwrap_or_default()
    );
    println!("Arena budget: {} bytes", arena.capacity());
    println!(
        "Manifest: {}",
        if decoder.has_manifest() { "found" } else { "not found" }
    );

    Ok(())
}
