//! Input sources for chunksplit.
//!
//! Every input is cut into newline-terminated records before it reaches the
//! chunk writer, so a record never straddles two chunks. Plain files are
//! memory-mapped and split with `memchr`; compressed files and stdin are
//! streamed through a `BufRead`.

use anyhow::{Context, Result};
use bzip2::read::MultiBzDecoder;
use memchr::memchr_iter;
use memmap2::MmapOptions;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Where records are read from, chosen from the argument's extension.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    Stdin,
    Plain(PathBuf),
    Bzip2(PathBuf),
    Zstd(PathBuf),
}

impl InputSource {
    pub fn from_arg(path: &Path) -> Self {
        if path == Path::new("-") {
            return InputSource::Stdin;
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("bz2") => InputSource::Bzip2(path.to_path_buf()),
            Some("zst") | Some("zstd") => InputSource::Zstd(path.to_path_buf()),
            _ => InputSource::Plain(path.to_path_buf()),
        }
    }

    /// Calls `f` once per record, trailing newline included, and returns
    /// the number of decoded bytes consumed.
    pub fn for_each_record<F>(&self, f: F) -> Result<u64>
    where
        F: FnMut(&str) -> Result<()>,
    {
        match self {
            InputSource::Stdin => split_stream(io::stdin().lock(), f),
            InputSource::Plain(path) => split_mapped(path, f),
            InputSource::Bzip2(path) => {
                let file = File::open(path).context("Failed to open input file")?;
                split_stream(BufReader::new(MultiBzDecoder::new(file)), f)
            }
            InputSource::Zstd(path) => {
                let file = File::open(path).context("Failed to open input file")?;
                let decoder =
                    zstd::stream::read::Decoder::new(file).context("Failed to start zstd decoder")?;
                split_stream(BufReader::new(decoder), f)
            }
        }
    }
}

fn split_mapped<F>(path: &Path, f: F) -> Result<u64>
where
    F: FnMut(&str) -> Result<()>,
{
    let file = File::open(path).context("Failed to open input file")?;
    // Zero-length mappings are rejected on some platforms
    if file.metadata().context("Failed to stat input file")?.len() == 0 {
        return Ok(0);
    }
    // The file must not be truncated while it is mapped
    let mmap = unsafe {
        MmapOptions::new()
            .map(&file)
            .context("Failed to mmap input file")?
    };
    split_slice(&mmap, f)
}

fn split_slice<F>(data: &[u8], mut f: F) -> Result<u64>
where
    F: FnMut(&str) -> Result<()>,
{
    let mut start = 0;
    for end in memchr_iter(b'\n', data) {
        emit(&data[start..=end], start as u64, &mut f)?;
        start = end + 1;
    }
    if start < data.len() {
        emit(&data[start..], start as u64, &mut f)?;
    }
    Ok(data.len() as u64)
}

fn split_stream<R, F>(mut reader: R, mut f: F) -> Result<u64>
where
    R: BufRead,
    F: FnMut(&str) -> Result<()>,
{
    let mut record = Vec::new();
    let mut offset = 0u64;
    loop {
        record.clear();
        let n = reader
            .read_until(b'\n', &mut record)
            .context("Failed to read input")?;
        if n == 0 {
            break;
        }
        emit(&record, offset, &mut f)?;
        offset += n as u64;
    }
    Ok(offset)
}

fn emit<F>(record: &[u8], offset: u64, f: &mut F) -> Result<()>
where
    F: FnMut(&str) -> Result<()>,
{
    let text = std::str::from_utf8(record)
        .with_context(|| format!("Invalid UTF-8 in record at byte offset {}", offset))?;
    f(text)
}
