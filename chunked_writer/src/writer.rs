//! Size-rotating chunk writer.
//!
//! A [`ChunkedWriter`] appends text to numbered files in one directory. Before
//! every write it samples the on-disk size of the active chunk and, once that
//! size exceeds the configured limit, finishes the chunk and opens the next
//! one. The limit is a soft cap: a single write may push a chunk past it, and
//! buffered bytes are not counted until they reach the file.

use log::{debug, warn};
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::compression::{chunk_file_name, Compression, Sink};
use crate::config::ChunkedWriterConfig;
use crate::error::{ChunkError, Result, RotationWarning};

/// The chunk currently receiving writes.
struct ActiveChunk {
    path: PathBuf,
    sink: Sink,
}

impl ActiveChunk {
    fn finish(self) -> io::Result<()> {
        debug!("Closing chunk {}", self.path.display());
        self.sink.finish()
    }
}

/// Everything mutated under the writer's lock.
struct WriterState {
    /// Index of the next chunk to open.
    chunk_index: u64,
    current: Option<ActiveChunk>,
    opened: Vec<PathBuf>,
    warnings: Vec<RotationWarning>,
    closed: bool,
}

/// Writes text into a sequence of size-bounded, optionally gzip-compressed
/// files named `{scheme}-{index:05}[.gz]`.
///
/// Files are created lazily: constructing a writer only validates its
/// arguments. All writes go through one lock, so a writer can be shared
/// between threads and each write lands in a chunk as a single unit.
///
/// # Example
/// ```no_run
/// use chunked_writer::{ChunkedWriter, Compression};
///
/// let writer = ChunkedWriter::new("/tmp/out", "events", 16, Compression::Gzip)?;
/// writer.write_line("first record")?;
/// writer.write_line("second record")?;
/// writer.close()?;
/// # Ok::<(), chunked_writer::ChunkError>(())
/// ```
pub struct ChunkedWriter {
    output_dir: PathBuf,
    naming_scheme: String,
    max_chunk_bytes: u64,
    compression: Compression,
    gzip_level: u32,
    buffer_capacity: usize,
    state: Mutex<WriterState>,
}

impl ChunkedWriter {
    /// Create a writer for `output_dir`.
    ///
    /// `max_chunk_mb` is converted to bytes (×1024×1024) and the naming
    /// scheme is trimmed of surrounding whitespace.
    ///
    /// # Errors
    /// [`ChunkError::Configuration`] if the directory is missing or not a
    /// directory, or if `max_chunk_mb` is zero.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        naming_scheme: &str,
        max_chunk_mb: u32,
        compression: Compression,
    ) -> Result<Self> {
        let config = ChunkedWriterConfig::new(naming_scheme)
            .with_max_chunk_mb(max_chunk_mb)
            .with_compression(compression);
        Self::with_config(output_dir, config)
    }

    /// Create a writer producing gzip chunks.
    pub fn with_default_compression(
        output_dir: impl Into<PathBuf>,
        naming_scheme: &str,
        max_chunk_mb: u32,
    ) -> Result<Self> {
        Self::new(output_dir, naming_scheme, max_chunk_mb, Compression::Gzip)
    }

    /// Create a writer from a full configuration.
    pub fn with_config(output_dir: impl Into<PathBuf>, config: ChunkedWriterConfig) -> Result<Self> {
        let output_dir = output_dir.into();
        config.validate()?;

        match fs::metadata(&output_dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(ChunkError::Configuration(format!(
                    "output path {} is not a directory",
                    output_dir.display()
                )))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ChunkError::Configuration(format!(
                    "output directory {} does not exist",
                    output_dir.display()
                )))
            }
            Err(e) => {
                return Err(ChunkError::Configuration(format!(
                    "cannot access output directory {}: {}",
                    output_dir.display(),
                    e
                )))
            }
        }

        Ok(Self {
            output_dir,
            naming_scheme: config.naming_scheme.trim().to_string(),
            max_chunk_bytes: config.max_chunk_bytes(),
            compression: config.compression,
            gzip_level: config.gzip_level,
            buffer_capacity: config.buffer_capacity,
            state: Mutex::new(WriterState {
                chunk_index: 0,
                current: None,
                opened: Vec::new(),
                warnings: Vec::new(),
                closed: false,
            }),
        })
    }

    /// Append `text` to the active chunk, opening or rotating chunks first
    /// when needed.
    ///
    /// No delimiter is added; see [`write_line`](Self::write_line).
    ///
    /// If the active chunk was removed from disk, the next chunk is opened.
    /// Any other failure to read the chunk's size is returned and leaves the
    /// chunk active, so later writes retry the same check.
    pub fn write(&self, text: &str) -> Result<()> {
        self.write_parts(&[text.as_bytes()])
    }

    /// Append `text` followed by a newline as one unit.
    pub fn write_line(&self, text: &str) -> Result<()> {
        self.write_parts(&[text.as_bytes(), b"\n"])
    }

    fn write_parts(&self, parts: &[&[u8]]) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(ChunkError::Closed);
        }

        let full = match &state.current {
            None => true,
            Some(chunk) => self.exceeds_limit(&chunk.path)?,
        };
        let mut chunk = match state.current.take() {
            Some(chunk) if !full => chunk,
            previous => self.rotate(&mut state, previous)?,
        };

        let written = parts
            .iter()
            .try_for_each(|part| chunk.sink.write_all(part))
            .map_err(|e| ChunkError::io(&chunk.path, e));
        state.current = Some(chunk);
        written
    }

    /// Flush buffered bytes of the active chunk to its file.
    ///
    /// A gzip chunk only becomes a complete stream once it is closed.
    pub fn flush(&self) -> Result<()> {
        let mut state = self.lock();
        match state.current.as_mut() {
            Some(chunk) => chunk
                .sink
                .flush()
                .map_err(|e| ChunkError::io(&chunk.path, e)),
            None => Ok(()),
        }
    }

    /// Finish and release the active chunk.
    ///
    /// Closing a writer that never wrote anything creates no file. Calls
    /// after the first one return `Ok(())`, even when the first call failed:
    /// the chunk is released either way and its error is reported once.
    pub fn close(&self) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;

        match state.current.take() {
            Some(chunk) => {
                let path = chunk.path.clone();
                chunk.finish().map_err(|e| ChunkError::io(path, e))
            }
            None => Ok(()),
        }
    }

    /// Paths of every chunk opened so far, in index order.
    pub fn chunk_paths(&self) -> Vec<PathBuf> {
        self.lock().opened.clone()
    }

    /// Number of chunk indexes consumed so far.
    pub fn chunks_opened(&self) -> u64 {
        self.lock().chunk_index
    }

    /// Drain the warnings recorded for chunks that failed to close during
    /// rotation.
    pub fn take_warnings(&self) -> Vec<RotationWarning> {
        std::mem::take(&mut self.lock().warnings)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn naming_scheme(&self) -> &str {
        &self.naming_scheme
    }

    pub fn max_chunk_bytes(&self) -> u64 {
        self.max_chunk_bytes
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    // The state holds no invariant a panicking writer could break halfway.
    fn lock(&self) -> MutexGuard<'_, WriterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn exceeds_limit(&self, path: &Path) -> Result<bool> {
        match fs::metadata(path) {
            Ok(meta) => Ok(meta.len() > self.max_chunk_bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Chunk {} disappeared, starting a new one", path.display());
                Ok(true)
            }
            Err(e) => Err(ChunkError::io(path, e)),
        }
    }

    /// Close `previous` and open the next chunk.
    ///
    /// A failure to close `previous` is recorded as a warning. The index is
    /// consumed even if the new file cannot be created, so names are never
    /// reused.
    fn rotate(&self, state: &mut WriterState, previous: Option<ActiveChunk>) -> Result<ActiveChunk> {
        if let Some(chunk) = previous {
            let path = chunk.path.clone();
            if let Err(error) = chunk.finish() {
                warn!("Failed to close chunk {}: {}", path.display(), error);
                state.warnings.push(RotationWarning { path, error });
            }
        }

        let index = state.chunk_index;
        state.chunk_index += 1;
        let path = self
            .output_dir
            .join(chunk_file_name(&self.naming_scheme, index, self.compression));

        let file = File::create(&path).map_err(|e| ChunkError::io(&path, e))?;
        debug!("Opened chunk {}", path.display());
        state.opened.push(path.clone());

        Ok(ActiveChunk {
            sink: self
                .compression
                .open_sink(file, self.gzip_level, self.buffer_capacity),
            path,
        })
    }
}

impl Drop for ChunkedWriter {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(chunk) = state.current.take() {
            let path = chunk.path.clone();
            if let Err(e) = chunk.finish() {
                warn!("Failed to finish chunk {} on drop: {}", path.display(), e);
            }
        }
    }
}
