//! chunksplit - split text inputs into size-bounded, gzip-compressed chunks.
//!
//! Records (newline-terminated lines) are read from each input and appended
//! to a [`ChunkedWriter`], which opens `{name}-00000.gz`, `{name}-00001.gz`,
//! ... in the output directory as each chunk grows past the size limit.
//!
//! # Usage
//!
//! ```bash
//! # Split a dump into 64 MB gzip chunks named part-00000.gz, part-00001.gz, ...
//! chunksplit dump.txt -o out/ -n part
//!
//! # Re-chunk bzip2 and zstd dumps into 16 MB plain chunks
//! chunksplit a.bz2 b.zst -o out/ -s 16 --plain
//!
//! # Ingest several files at once (record order across files is not kept)
//! chunksplit logs/*.txt -o out/ -j 4
//! ```

use anyhow::{Context, Result};
use chunked_writer::{ChunkedWriter, ChunkedWriterConfig, Compression};
use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{info, warn, LevelFilter};
use rayon::prelude::*;
use std::path::PathBuf;

mod input;
use input::InputSource;

/// Command-line arguments for chunksplit.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input files; `-` reads stdin, `.bz2` and `.zst` are decompressed
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Existing directory that receives the chunks
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Chunk file name prefix
    #[arg(short, long, default_value = "chunk")]
    name: String,

    /// Size in MB past which a new chunk is started
    #[arg(short = 's', long, default_value_t = chunked_writer::config::DEFAULT_MAX_CHUNK_MB)]
    max_chunk_mb: u32,

    /// Write uncompressed chunks instead of gzip
    #[arg(long)]
    plain: bool,

    /// Gzip compression level (0-9)
    #[arg(short, long, default_value_t = chunked_writer::config::DEFAULT_GZIP_LEVEL)]
    level: u32,

    /// Number of inputs to read concurrently (default = 1)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Do not draw a progress bar
    #[arg(long)]
    no_progress: bool,

    /// Increase log verbosity (-v, -vv, -vvv); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn progress_bar(hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(5));
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bytes} written ({bytes_per_sec}) {msg}",
        )
        .context("Invalid progress bar template")?,
    );
    Ok(pb)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let jobs = args.jobs.unwrap_or(1).max(1);
    if jobs > 1 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let compression = if args.plain {
        Compression::Plain
    } else {
        Compression::Gzip
    };
    let config = ChunkedWriterConfig::new(args.name.as_str())
        .with_max_chunk_mb(args.max_chunk_mb)
        .with_compression(compression)
        .with_gzip_level(args.level);
    let writer = ChunkedWriter::with_config(&args.output_dir, config)
        .context("Failed to set up chunk writer")?;

    let pb = progress_bar(args.no_progress)?;

    let ingest = |path: &PathBuf| -> Result<()> {
        let source = InputSource::from_arg(path);
        info!("Reading {}", path.display());
        let consumed = source
            .for_each_record(|record| {
                writer.write(record)?;
                pb.inc(record.len() as u64);
                Ok(())
            })
            .with_context(|| format!("Failed to split {}", path.display()))?;
        info!("Finished {} ({} bytes)", path.display(), consumed);
        Ok(())
    };

    if jobs > 1 && args.inputs.len() > 1 {
        args.inputs.par_iter().try_for_each(ingest)?;
    } else {
        args.inputs.iter().try_for_each(ingest)?;
    }

    writer.close().context("Failed to close final chunk")?;
    pb.finish_with_message("Done!");

    for warning in writer.take_warnings() {
        warn!(
            "Chunk {} may be incomplete: {}",
            warning.path.display(),
            warning.error
        );
    }
    for path in writer.chunk_paths() {
        println!("{}", path.display());
    }

    Ok(())
}
