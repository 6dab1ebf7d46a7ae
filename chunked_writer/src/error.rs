//! Error types for chunked writing.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for chunked writer operations.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The writer was constructed with invalid arguments.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Opening, writing, flushing or finishing a chunk file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A write was attempted after the writer was closed.
    #[error("Writer is closed")]
    Closed,

    /// The background service no longer accepts requests.
    #[error("Writer service has stopped")]
    ServiceStopped,
}

impl ChunkError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ChunkError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A specialized Result type for chunked writer operations.
pub type Result<T> = std::result::Result<T, ChunkError>;

/// A chunk that could not be closed cleanly while rotating to the next one.
///
/// Rotation carries on after such a failure, so the data buffered for the
/// outgoing chunk may be incomplete on disk.
#[derive(Debug)]
pub struct RotationWarning {
    /// The chunk that failed to close.
    pub path: PathBuf,
    /// The underlying failure.
    pub error: io::Error,
}
