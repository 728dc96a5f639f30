use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use serde::Serialize;
use sha1::{Digest, Sha1};
use thiserror::Error;

const GZIP_THRESHOLD_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create directory {path}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize payload for {path}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to rename {tmp} to {path}")]
    Rename {
        tmp: String,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result of a single [`write_json`] call, folded into a manifest endpoint
/// entry by the caller.
#[derive(Debug, Clone)]
pub struct WriteResult {
    pub bytes: u64,
    pub sha1: String,
    pub gz: bool,
}

/// Pretty-prints `payload` as UTF-8 JSON and writes it atomically
/// (temp file + rename) to `path`, computing a SHA1 of the bytes written.
/// If the result is larger than 1 MiB, also writes a gzipped sibling at
/// `path` with `.gz` appended.
pub fn write_json<T: Serialize>(path: &Path, payload: &T) -> Result<WriteResult, PersistError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PersistError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let json = serde_json::to_vec_pretty(payload).map_err(|source| PersistError::Serialize {
        path: path.display().to_string(),
        source,
    })?;

    let mut hasher = Sha1::new();
    hasher.update(&json);
    let sha1 = hex::encode(hasher.finalize());

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &json).map_err(|source| PersistError::Write {
        path: tmp_path.display().to_string(),
        source,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|source| PersistError::Rename {
        tmp: tmp_path.display().to_string(),
        path: path.display().to_string(),
        source,
    })?;

    let gz = json.len() > GZIP_THRESHOLD_BYTES;
    if gz {
        let gz_path = append_gz_suffix(path);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&json)
            .map_err(|source| PersistError::Write {
                path: gz_path.display().to_string(),
                source,
            })?;
        let compressed = encoder.finish().map_err(|source| PersistError::Write {
            path: gz_path.display().to_string(),
            source,
        })?;
        std::fs::write(&gz_path, compressed).map_err(|source| PersistError::Write {
            path: gz_path.display().to_string(),
            source,
        })?;
        debug!("wrote gzipped sibling {}", gz_path.display());
    }

    Ok(WriteResult {
        bytes: json.len() as u64,
        sha1,
        gz,
    })
}

fn append_gz_suffix(path: &Path) -> std::path::PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".gz");
    std::path::PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_pretty_json_and_returns_sha1() {
        let dir = std::env::temp_dir().join(format!("nba-fetch-test-{}", std::process::id()));
        let path = dir.join("scoreboard.json");
        let payload = json!({"a": 1, "b": "two"});

        let result = write_json(&path, &payload).unwrap();
        assert!(result.bytes > 0);
        assert_eq!(result.sha1.len(), 40);
        assert!(!result.gz);

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("\"a\": 1"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn gzips_payloads_over_one_mebibyte() {
        let dir = std::env::temp_dir().join(format!("nba-fetch-test-big-{}", std::process::id()));
        let path = dir.join("big.json");
        let payload = json!({"filler": "x".repeat(2 * 1024 * 1024)});

        let result = write_json(&path, &payload).unwrap();
        assert!(result.gz);
        assert!(dir.join("big.json.gz").exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
