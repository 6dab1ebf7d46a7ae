//! Channel-backed front end for a [`ChunkedWriter`].
//!
//! A single background thread owns the writer and applies requests in the
//! order they were queued. Callers get an [`Acknowledgement`] per request and
//! can decide whether to wait for it, so a slow disk only blocks callers once
//! the bounded queue is full.

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, warn};
use std::thread::{self, JoinHandle};

use crate::error::{ChunkError, Result, RotationWarning};
use crate::writer::ChunkedWriter;

struct WriteRequest {
    text: String,
    ack: Sender<Result<()>>,
}

/// Completion handle for one submitted write.
#[must_use = "dropping an acknowledgement discards the write result"]
pub struct Acknowledgement(Receiver<Result<()>>);

impl Acknowledgement {
    /// Block until the write has been applied and return its outcome.
    pub fn wait(self) -> Result<()> {
        self.0.recv().unwrap_or(Err(ChunkError::ServiceStopped))
    }
}

/// Owns a [`ChunkedWriter`] on a dedicated thread.
///
/// ```no_run
/// use chunked_writer::{ChunkWriterService, ChunkedWriter};
///
/// let writer = ChunkedWriter::with_default_compression("/tmp/out", "events", 64)?;
/// let service = ChunkWriterService::spawn(writer, 1024)?;
/// let ack = service.submit("record\n")?;
/// ack.wait()?;
/// let warnings = service.shutdown()?;
/// assert!(warnings.is_empty());
/// # Ok::<(), chunked_writer::ChunkError>(())
/// ```
pub struct ChunkWriterService {
    sender: Option<Sender<WriteRequest>>,
    handle: Option<JoinHandle<Result<Vec<RotationWarning>>>>,
}

impl ChunkWriterService {
    /// Move `writer` onto a new thread fed by a queue of `queue_capacity`
    /// pending requests.
    pub fn spawn(writer: ChunkedWriter, queue_capacity: usize) -> Result<Self> {
        let (sender, receiver) = bounded::<WriteRequest>(queue_capacity);
        let output_dir = writer.output_dir().to_path_buf();

        let handle = thread::Builder::new()
            .name("chunk-writer".into())
            .spawn(move || -> Result<Vec<RotationWarning>> {
                for request in receiver {
                    let result = writer.write(&request.text);
                    // The caller may have dropped its acknowledgement
                    let _ = request.ack.send(result);
                }
                debug!("Writer queue drained, closing {}", writer.naming_scheme());
                writer.close()?;
                Ok(writer.take_warnings())
            })
            .map_err(|e| ChunkError::io(output_dir, e))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue `text` for writing.
    pub fn submit(&self, text: impl Into<String>) -> Result<Acknowledgement> {
        let sender = self.sender.as_ref().ok_or(ChunkError::ServiceStopped)?;
        let (ack, ack_receiver) = bounded(1);
        sender
            .send(WriteRequest {
                text: text.into(),
                ack,
            })
            .map_err(|_| ChunkError::ServiceStopped)?;
        Ok(Acknowledgement(ack_receiver))
    }

    /// Queue `text` and wait for it to be written.
    pub fn write(&self, text: impl Into<String>) -> Result<()> {
        self.submit(text)?.wait()
    }

    /// Stop accepting requests, apply everything already queued, close the
    /// writer and return the warnings it collected.
    pub fn shutdown(mut self) -> Result<Vec<RotationWarning>> {
        self.stop().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn stop(&mut self) -> Option<Result<Vec<RotationWarning>>> {
        drop(self.sender.take());
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(result) => Some(result),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

impl Drop for ChunkWriterService {
    fn drop(&mut self) {
        if thread::panicking() {
            drop(self.sender.take());
            return;
        }
        match self.stop() {
            Some(Err(e)) => warn!("Chunk writer service stopped with error: {}", e),
            Some(Ok(warnings)) if !warnings.is_empty() => {
                warn!("Chunk writer service dropped {} rotation warnings", warnings.len())
            }
            _ => {}
        }
    }
}
