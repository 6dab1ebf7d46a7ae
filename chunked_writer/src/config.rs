//! Configuration for a [`ChunkedWriter`](crate::ChunkedWriter).

use crate::compression::Compression;
use crate::error::{ChunkError, Result};

/// Default maximum chunk size in megabytes.
pub const DEFAULT_MAX_CHUNK_MB: u32 = 64;

/// Default gzip compression level.
pub const DEFAULT_GZIP_LEVEL: u32 = 6;

/// Default capacity of the buffer in front of each chunk file.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Settings for a chunked writer.
///
/// # Example
/// ```
/// use chunked_writer::{ChunkedWriterConfig, Compression};
///
/// let config = ChunkedWriterConfig::new("records")
///     .with_max_chunk_mb(128)
///     .with_compression(Compression::Plain);
/// assert_eq!(config.naming_scheme, "records");
/// ```
#[derive(Debug, Clone)]
pub struct ChunkedWriterConfig {
    /// Prefix shared by all chunk file names (default: "chunk").
    pub naming_scheme: String,

    /// Size in megabytes past which the next write opens a new chunk (default: 64).
    pub max_chunk_mb: u32,

    /// Compression applied to every chunk (default: gzip).
    pub compression: Compression,

    /// Gzip level 0-9, ignored for plain chunks (default: 6).
    pub gzip_level: u32,

    /// Capacity of the write buffer in bytes (default: 8 KiB).
    pub buffer_capacity: usize,
}

impl ChunkedWriterConfig {
    /// Create a configuration with the given naming scheme and default values.
    pub fn new(naming_scheme: impl Into<String>) -> Self {
        Self {
            naming_scheme: naming_scheme.into(),
            ..Self::default()
        }
    }

    /// Set the maximum chunk size in megabytes.
    pub fn with_max_chunk_mb(mut self, max_chunk_mb: u32) -> Self {
        self.max_chunk_mb = max_chunk_mb;
        self
    }

    /// Set the compression mode.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the gzip compression level.
    pub fn with_gzip_level(mut self, gzip_level: u32) -> Self {
        self.gzip_level = gzip_level;
        self
    }

    /// Set the write buffer capacity.
    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    /// Maximum chunk size converted to bytes.
    pub fn max_chunk_bytes(&self) -> u64 {
        u64::from(self.max_chunk_mb) * 1024 * 1024
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_chunk_mb == 0 {
            return Err(ChunkError::Configuration(
                "maximum chunk size must be at least 1 MB".into(),
            ));
        }
        if self.gzip_level > 9 {
            return Err(ChunkError::Configuration(format!(
                "gzip level must be between 0 and 9, got {}",
                self.gzip_level
            )));
        }
        if self.buffer_capacity == 0 {
            return Err(ChunkError::Configuration(
                "buffer capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ChunkedWriterConfig {
    fn default() -> Self {
        Self {
            naming_scheme: "chunk".into(),
            max_chunk_mb: DEFAULT_MAX_CHUNK_MB,
            compression: Compression::Gzip,
            gzip_level: DEFAULT_GZIP_LEVEL,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}
