use flate2::read::GzDecoder;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::tempdir;

const BIN_PATH: &str = env!("CARGO_BIN_EXE_chunksplit");

fn generate_lines(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("{:08} the quick brown fox jumps over the lazy dog {}\n", i, i * 31))
        .collect()
}

fn run(args: &[&str]) -> Output {
    Command::new(BIN_PATH)
        .args(args)
        .arg("--no-progress")
        .output()
        .expect("Failed to run chunksplit")
}

/// Chunk paths printed by the binary, one per line.
fn printed_chunks(output: &Output) -> Vec<PathBuf> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(PathBuf::from)
        .collect()
}

fn read_gz_chunks(paths: &[PathBuf]) -> String {
    let mut out = String::new();
    for path in paths {
        GzDecoder::new(fs::File::open(path).unwrap())
            .read_to_string(&mut out)
            .unwrap();
    }
    out
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_e2e_plain_split() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let out_dir = dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();

    let data = generate_lines(60_000);
    fs::write(&input, &data).unwrap();

    let output = run(&[
        path_str(&input),
        "-o",
        path_str(&out_dir),
        "-n",
        "part",
        "-s",
        "1",
        "--plain",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let chunks = printed_chunks(&output);
    assert!(chunks.len() >= 3, "expected several chunks, got {}", chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk, &out_dir.join(format!("part-{:05}", i)));
    }

    let joined: String = chunks
        .iter()
        .map(|p| fs::read_to_string(p).unwrap())
        .collect();
    assert_eq!(joined, data);

    // Every chunk starts on a record boundary
    for chunk in &chunks {
        let text = fs::read_to_string(chunk).unwrap();
        assert!(text.ends_with('\n'));
    }
}

#[test]
fn test_e2e_bzip2_to_gzip_chunks() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.txt.bz2");
    let data = generate_lines(20_000);

    let mut encoder = bzip2::write::BzEncoder::new(
        fs::File::create(&input).unwrap(),
        bzip2::Compression::best(),
    );
    encoder.write_all(data.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let output = run(&[path_str(&input), "-o", path_str(dir.path()), "-n", "bz"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let chunks = printed_chunks(&output);
    assert_eq!(chunks, vec![dir.path().join("bz-00000.gz")]);
    assert_eq!(read_gz_chunks(&chunks), data);
}

#[test]
fn test_e2e_zstd_input() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.zst");
    let data = generate_lines(5_000);
    fs::write(&input, zstd::encode_all(data.as_bytes(), 3).unwrap()).unwrap();

    let output = run(&[path_str(&input), "-o", path_str(dir.path()), "-l", "1"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let chunks = printed_chunks(&output);
    assert_eq!(chunks, vec![dir.path().join("chunk-00000.gz")]);
    assert_eq!(read_gz_chunks(&chunks), data);
}

#[test]
fn test_e2e_stdin_input() {
    let dir = tempdir().unwrap();
    let data = generate_lines(100);

    let mut child = Command::new(BIN_PATH)
        .args(["-", "-o", path_str(dir.path()), "--plain", "--no-progress"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn chunksplit");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(data.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    assert_eq!(
        fs::read_to_string(dir.path().join("chunk-00000")).unwrap(),
        data
    );
}

#[test]
fn test_e2e_parallel_inputs_keep_records_whole() {
    let dir = tempdir().unwrap();
    let out_dir = dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();

    let mut inputs = Vec::new();
    let mut expected = Vec::new();
    for f in 0..4 {
        let path = dir.path().join(format!("in-{}.txt", f));
        let data: String = (0..10_000)
            .map(|i| format!("file-{}-record-{}\n", f, i))
            .collect();
        expected.extend(data.lines().map(String::from));
        fs::write(&path, data).unwrap();
        inputs.push(path);
    }

    let mut args: Vec<&str> = inputs.iter().map(|p| path_str(p)).collect();
    args.extend(["-o", path_str(&out_dir), "-j", "4"]);
    let output = run(&args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let mut actual: Vec<String> = read_gz_chunks(&printed_chunks(&output))
        .lines()
        .map(String::from)
        .collect();
    actual.sort();
    expected.sort();
    assert_eq!(actual, expected);
}

#[test]
fn test_e2e_missing_output_dir_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.txt");
    fs::write(&input, "line\n").unwrap();
    let missing = dir.path().join("missing");

    let output = run(&[path_str(&input), "-o", path_str(&missing)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
    assert!(!missing.exists());
}
