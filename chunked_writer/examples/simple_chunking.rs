use anyhow::Result;
use chunked_writer::{ChunkedWriter, Compression};
use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input.txt> <output_dir> [plain]", args[0]);
        return Ok(());
    }

    let compression = if args.get(3).map(String::as_str) == Some("plain") {
        Compression::Plain
    } else {
        Compression::Gzip
    };
    let writer = ChunkedWriter::new(&args[2], "part", 1, compression)?;

    let reader = BufReader::new(File::open(&args[1])?);
    for line in reader.lines() {
        writer.write_line(&line?)?;
    }
    writer.close()?;

    for path in writer.chunk_paths() {
        println!("{}", path.display());
    }

    Ok(())
}
