use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to append to quarantine file {path}")]
pub struct QuarantineError {
    path: String,
    #[source]
    source: std::io::Error,
}

pub const DEFAULT_QUARANTINE_PATH: &str = "ops/quarantine_game_ids.txt";

/// Appends a single `{iso_ts} {game_id} {endpoint} {error}` line. Never
/// truncates; creates parent directories and the file itself on first use.
pub fn append_quarantine(
    path: &Path,
    game_id: &str,
    endpoint: &str,
    error: &str,
) -> Result<(), QuarantineError> {
    let to_io_err = |source: std::io::Error| QuarantineError {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(to_io_err)?;
        }
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_io_err)?;

    let line = format!(
        "{} {} {} {}\n",
        Utc::now().to_rfc3339(),
        game_id,
        endpoint,
        error.replace('\n', " ")
    );
    file.write_all(line.as_bytes()).map_err(to_io_err)?;

    Ok(())
}

pub fn default_quarantine_path() -> PathBuf {
    PathBuf::from(DEFAULT_QUARANTINE_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_without_truncating() {
        let dir = std::env::temp_dir().join(format!("nba-fetch-quarantine-{}", std::process::id()));
        let path = dir.join("quarantine.txt");

        append_quarantine(&path, "0022300001", "playbyplayv2", "500 error").unwrap();
        append_quarantine(&path, "0022300002", "shotchartdetail", "timeout").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("0022300001 playbyplayv2 500 error"));
        assert!(lines[1].contains("0022300002 shotchartdetail timeout"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
