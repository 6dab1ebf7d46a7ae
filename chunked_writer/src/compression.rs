//! Compression modes and the per-chunk output sinks they produce.

use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Compression applied to every chunk of a writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Uncompressed UTF-8 text.
    Plain,
    /// A gzip stream of UTF-8 text, one member per chunk.
    #[default]
    Gzip,
}

impl Compression {
    /// File name suffix appended after the chunk index.
    pub fn suffix(self) -> &'static str {
        match self {
            Compression::Plain => "",
            Compression::Gzip => ".gz",
        }
    }

    /// Wraps a freshly created chunk file in the sink for this mode.
    pub(crate) fn open_sink(self, file: File, level: u32, capacity: usize) -> Sink {
        match self {
            Compression::Plain => Sink::Plain(BufWriter::with_capacity(capacity, file)),
            Compression::Gzip => {
                let encoder = GzEncoder::new(file, flate2::Compression::new(level));
                Sink::Gzip(BufWriter::with_capacity(capacity, encoder))
            }
        }
    }
}

/// Builds the file name of chunk `index`: `{scheme}-{index:05}` plus the
/// mode's suffix.
pub fn chunk_file_name(scheme: &str, index: u64, compression: Compression) -> String {
    format!("{}-{:05}{}", scheme, index, compression.suffix())
}

/// The open stream of the active chunk.
///
/// The buffer sits above the encoder, so bytes only reach the file once the
/// buffer spills or the sink is finished.
pub(crate) enum Sink {
    Plain(BufWriter<File>),
    Gzip(BufWriter<GzEncoder<File>>),
}

impl Sink {
    /// Flushes every layer and writes the gzip trailer.
    ///
    /// The file handle is released when this returns, whatever the outcome.
    pub(crate) fn finish(self) -> io::Result<()> {
        match self {
            Sink::Plain(mut out) => out.flush(),
            Sink::Gzip(out) => {
                let encoder = out.into_inner().map_err(|e| e.into_error())?;
                encoder.finish()?.flush()
            }
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(out) => out.write(buf),
            Sink::Gzip(out) => out.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Sink::Plain(out) => out.write_all(buf),
            Sink::Gzip(out) => out.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(out) => out.flush(),
            Sink::Gzip(out) => out.flush(),
        }
    }
}
