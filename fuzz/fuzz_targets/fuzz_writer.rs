#![no_main]

use arbitrary::Arbitrary;
use chunked_writer::{ChunkedWriter, ChunkedWriterConfig, Compression};
use flate2::read::GzDecoder;
use libfuzzer_sys::fuzz_target;
use std::fs::File;
use std::io::Read;

#[derive(Arbitrary, Debug)]
enum Op {
    Write(String),
    WriteLine(String),
    Flush,
}

#[derive(Arbitrary, Debug)]
struct Input {
    gzip: bool,
    buffer_capacity: u16,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let dir = tempfile::tempdir().unwrap();
    let compression = if input.gzip {
        Compression::Gzip
    } else {
        Compression::Plain
    };
    let config = ChunkedWriterConfig::new("fuzz")
        .with_max_chunk_mb(1)
        .with_compression(compression)
        .with_buffer_capacity(usize::from(input.buffer_capacity).max(1));
    let writer = ChunkedWriter::with_config(dir.path(), config).unwrap();

    let mut expected = String::new();
    for op in &input.ops {
        match op {
            Op::Write(text) => {
                writer.write(text).unwrap();
                expected.push_str(text);
            }
            Op::WriteLine(text) => {
                writer.write_line(text).unwrap();
                expected.push_str(text);
                expected.push('\n');
            }
            Op::Flush => writer.flush().unwrap(),
        }
    }
    writer.close().unwrap();

    // Whatever the write pattern, the chunks replay it exactly
    let mut actual = String::new();
    for path in writer.chunk_paths() {
        let file = File::open(&path).unwrap();
        match compression {
            Compression::Plain => {
                let mut file = file;
                file.read_to_string(&mut actual).unwrap();
            }
            Compression::Gzip => {
                GzDecoder::new(file).read_to_string(&mut actual).unwrap();
            }
        }
    }
    assert_eq!(actual, expected);
});
