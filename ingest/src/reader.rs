use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::season::is_valid_game_id;

/// Enumerates `{raw_root}/{date}/` game-ID-shaped subdirectories. Returns an
/// empty list (not an error) if the date directory is absent.
pub fn list_game_dirs(raw_root: &Path, date: &str) -> Vec<PathBuf> {
    let date_dir = raw_root.join(date);
    let Ok(entries) = fs::read_dir(&date_dir) else {
        return Vec::new();
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(is_valid_game_id)
                .unwrap_or(false)
        })
        .map(|entry| entry.path())
        .collect();
    dirs.sort();
    dirs
}

/// Lazily reads one endpoint file for a game. Returns `None` for a missing
/// or corrupt file rather than failing the whole game.
pub fn read_endpoint(game_dir: &Path, endpoint: &str) -> Option<Value> {
    let path = game_dir.join(format!("{endpoint}.json"));
    let text = fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

pub fn read_scoreboard(raw_root: &Path, date: &str) -> Option<Value> {
    let path = raw_root.join(date).join("scoreboard.json");
    let text = fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

pub fn game_id_from_dir(game_dir: &Path) -> Option<String> {
    game_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_game_id_shaped_subdirectories() {
        let dir = std::env::temp_dir().join(format!("nba-reader-test-{}", std::process::id()));
        let date_dir = dir.join("2024-01-15");
        fs::create_dir_all(date_dir.join("0022300001")).unwrap();
        fs::create_dir_all(date_dir.join("not-a-game")).unwrap();

        let games = list_game_dirs(&dir, "2024-01-15");
        assert_eq!(games.len(), 1);
        assert_eq!(game_id_from_dir(&games[0]).unwrap(), "0022300001");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_date_directory_yields_empty_list_not_error() {
        let dir = std::env::temp_dir().join(format!("nba-reader-missing-{}", std::process::id()));
        assert!(list_game_dirs(&dir, "2024-01-15").is_empty());
    }

    #[test]
    fn missing_endpoint_file_returns_none() {
        let dir = std::env::temp_dir().join(format!("nba-reader-endpoint-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        assert!(read_endpoint(&dir, "playbyplayv2").is_none());
        fs::remove_dir_all(&dir).ok();
    }
}
