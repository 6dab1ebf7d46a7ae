//! Size-rotating, optionally gzip-compressed chunk files.
//!
//! [`ChunkedWriter`] spreads a stream of text over files named
//! `{scheme}-00000`, `{scheme}-00001`, ... in one directory, opening the next
//! file once the current one has grown past a configured number of
//! megabytes. [`ChunkWriterService`] puts the same writer behind a bounded
//! queue serviced by one thread.

pub mod compression;
pub mod config;
pub mod error;
pub mod service;
pub mod writer;

pub use compression::{chunk_file_name, Compression};
pub use config::ChunkedWriterConfig;
pub use error::{ChunkError, Result, RotationWarning};
pub use service::{Acknowledgement, ChunkWriterService};
pub use writer::ChunkedWriter;
