//! Close failures, produced by pointing a chunk name at `/dev/full`.
#![cfg(target_os = "linux")]

use chunked_writer::{ChunkError, ChunkedWriter, ChunkedWriterConfig, Compression};
use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;
use tempfile::tempdir;

const DEV_FULL: &str = "/dev/full";

fn dev_full_available() -> bool {
    if !Path::new(DEV_FULL).exists() {
        eprintln!("{} not found. Skipping close failure tests.", DEV_FULL);
        return false;
    }
    true
}

#[test]
fn test_rotation_close_failure_is_a_warning() {
    if !dev_full_available() {
        return;
    }
    let dir = tempdir().unwrap();
    let first = dir.path().join("p-00000");
    symlink(DEV_FULL, &first).unwrap();

    let config = ChunkedWriterConfig::new("p")
        .with_max_chunk_mb(1)
        .with_compression(Compression::Plain)
        .with_buffer_capacity(64 * 1024);
    let writer = ChunkedWriter::with_config(dir.path(), config).unwrap();

    // Buffered, so nothing reaches /dev/full yet
    writer.write("buffered data").unwrap();

    // Make the size check see an oversized chunk; the open handle still
    // points at /dev/full, so finishing it fails
    let oversized = dir.path().join("oversized");
    fs::write(&oversized, vec![b'x'; 1024 * 1024 + 10]).unwrap();
    fs::remove_file(&first).unwrap();
    symlink(&oversized, &first).unwrap();

    writer.write("next").unwrap();

    let warnings = writer.take_warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].path, first);
    assert!(writer.take_warnings().is_empty());

    writer.close().unwrap();
    assert_eq!(writer.chunks_opened(), 2);
    assert_eq!(
        fs::read_to_string(dir.path().join("p-00001")).unwrap(),
        "next"
    );
}

#[test]
fn test_failed_close_is_reported_once() {
    if !dev_full_available() {
        return;
    }
    let dir = tempdir().unwrap();
    let chunk = dir.path().join("full-00000");
    symlink(DEV_FULL, &chunk).unwrap();

    let writer = ChunkedWriter::new(dir.path(), "full", 1, Compression::Plain).unwrap();
    writer.write("lost").unwrap();

    match writer.close() {
        Err(ChunkError::Io { path, .. }) => assert_eq!(path, chunk),
        other => panic!("Expected Io error, got {:?}", other),
    }
    assert!(writer.is_closed());
    writer.close().unwrap();
    assert!(matches!(writer.write("late"), Err(ChunkError::Closed)));
}
