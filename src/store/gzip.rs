//! Gzip-compressed JSON persistence.
//!
//! Every data file lands on disk as `<name>.json.gz`. Callers pass the
//! logical `.json` path; the `.gz` suffix is appended here so the read and
//! write sides can never disagree about it. A missing file on read is a
//! valid "no data" signal, not an error.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// `categories.json` → `categories.json.gz`
fn gz_path(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(".gz");
    PathBuf::from(os)
}

/// Serialize `value` as JSON and write it gzip-compressed to `<path>.gz`.
pub fn write_json_gz<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let target = gz_path(path);
    let file = File::create(&target)
        .with_context(|| format!("failed to create {}", target.display()))?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::best());
    serde_json::to_writer(&mut encoder, value)
        .with_context(|| format!("failed to serialize {}", target.display()))?;
    encoder
        .finish()
        .with_context(|| format!("failed to finish gzip stream {}", target.display()))?
        .flush()
        .with_context(|| format!("failed to flush {}", target.display()))?;
    Ok(())
}

/// Read and decompress `<path>.gz`, returning `Ok(None)` if it is absent.
pub fn read_json_gz<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let source = gz_path(path);
    if !source.exists() {
        return Ok(None);
    }
    let file =
        File::open(&source).with_context(|| format!("failed to open {}", source.display()))?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let value = serde_json::from_reader(decoder)
        .with_context(|| format!("failed to parse {}", source.display()))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");

        let mut data = HashMap::new();
        data.insert("europe".to_string(), 3usize);
        data.insert("asia".to_string(), 7usize);

        write_json_gz(&path, &data).unwrap();
        assert!(dir.path().join("sample.json.gz").exists());
        assert!(!path.exists());

        let back: HashMap<String, usize> = read_json_gz(&path).unwrap().unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let missing: Option<Vec<String>> =
            read_json_gz(&dir.path().join("nothing.json")).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_output_is_actually_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("magic.json");
        write_json_gz(&path, &vec!["x"; 64]).unwrap();

        let bytes = std::fs::read(dir.path().join("magic.json.gz")).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        // compressed repetitive payload should be smaller than the raw JSON
        assert!(bytes.len() < serde_json::to_vec(&vec!["x"; 64]).unwrap().len());
    }

    #[test]
    fn test_corrupt_file_is_error_not_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json.gz"), b"not gzip at all").unwrap();
        let result: Result<Option<Vec<String>>> = read_json_gz(&dir.path().join("bad.json"));
        assert!(result.is_err());
    }
}
