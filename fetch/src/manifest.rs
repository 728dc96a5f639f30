use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write manifest {path}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointResult {
    pub bytes: u64,
    pub sha1: String,
    pub gz: bool,
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointError {
    pub endpoint: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GameTeams {
    pub home_team_id: Option<i64>,
    pub visitor_team_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: String,
    #[serde(default)]
    pub teams: GameTeams,
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointResult>,
    #[serde(default)]
    pub errors: Vec<EndpointError>,
}

impl GameRecord {
    pub fn new(game_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            teams: GameTeams::default(),
            endpoints: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    /// A game counts as OK when it has at least one successful endpoint and
    /// no recorded errors.
    fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.endpoints.values().any(|e| e.ok)
    }

    fn total_bytes(&self) -> u64 {
        self.endpoints.values().map(|e| e.bytes).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ManifestSummary {
    pub games: usize,
    pub ok_games: usize,
    pub failed_games: usize,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub date: String,
    #[serde(default)]
    pub games: Vec<GameRecord>,
    #[serde(default)]
    pub summary: ManifestSummary,
}

impl Manifest {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            games: Vec::new(),
            summary: ManifestSummary::default(),
        }
    }

    fn recompute_summary(&mut self) {
        let games = self.games.len();
        let ok_games = self.games.iter().filter(|g| g.is_ok()).count();
        let failed_games = games - ok_games;
        let total_bytes = self.games.iter().map(GameRecord::total_bytes).sum();
        self.summary = ManifestSummary {
            games,
            ok_games,
            failed_games,
            total_bytes,
        };
    }

    /// Merges `record` into this manifest: an existing game's endpoint
    /// submaps and errors are concatenated with the incoming record rather
    /// than replaced.
    pub fn merge_game(&mut self, record: GameRecord) {
        if let Some(existing) = self.games.iter_mut().find(|g| g.game_id == record.game_id) {
            existing.endpoints.extend(record.endpoints);
            existing.errors.extend(record.errors);
            if record.teams.home_team_id.is_some() || record.teams.visitor_team_id.is_some() {
                existing.teams = record.teams;
            }
        } else {
            self.games.push(record);
        }
        self.recompute_summary();
    }
}

/// Reads `{date_dir}/manifest.json`, returning `None` if absent or corrupt
/// rather than failing outright — mirrors the raw reader's "missing file is
/// not a hard error" policy for this one case.
pub fn read_manifest(date_dir: &Path) -> Option<Manifest> {
    let path = date_dir.join("manifest.json");
    let text = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&text).ok()
}

/// Loads the existing manifest (if any), merges `record` into it, and
/// writes the result back. Never truncates pre-existing game entries.
pub fn update_manifest(date_dir: &Path, record: GameRecord) -> Result<Manifest, ManifestError> {
    let path = date_dir.join("manifest.json");

    let mut manifest = match std::fs::read_to_string(&path) {
        Ok(text) => serde_json::from_str(&text).map_err(|source| ManifestError::Parse {
            path: path.display().to_string(),
            source,
        })?,
        Err(_) => Manifest::new(date_dir_name(date_dir)),
    };

    manifest.merge_game(record);

    let json = serde_json::to_string_pretty(&manifest).map_err(|source| ManifestError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    std::fs::write(&path, json).map_err(|source| ManifestError::Write {
        path: path.display().to_string(),
        source,
    })?;

    Ok(manifest)
}

fn date_dir_name(date_dir: &Path) -> String {
    date_dir
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_games_all_endpoints_ok_summary() {
        let mut manifest = Manifest::new("2024-01-15");

        for game_id in ["0022300001", "0022300002"] {
            let mut record = GameRecord::new(game_id);
            for endpoint in [
                "boxscoresummaryv2",
                "boxscoretraditionalv2",
                "playbyplayv2",
                "shotchartdetail",
            ] {
                record.endpoints.insert(
                    endpoint.to_string(),
                    EndpointResult {
                        bytes: 100,
                        sha1: "deadbeef".to_string(),
                        gz: false,
                        ok: true,
                    },
                );
            }
            manifest.merge_game(record);
        }

        assert_eq!(manifest.summary.games, 2);
        assert_eq!(manifest.summary.ok_games, 2);
        assert_eq!(manifest.summary.failed_games, 0);
        assert_eq!(manifest.summary.total_bytes, 800);
    }

    #[test]
    fn one_failed_endpoint_still_counts_game_ok_with_two_other_oks() {
        let mut manifest = Manifest::new("2024-01-15");
        let mut record = GameRecord::new("0022300001");
        record.endpoints.insert(
            "boxscoresummaryv2".to_string(),
            EndpointResult {
                bytes: 50,
                sha1: "a".to_string(),
                gz: false,
                ok: true,
            },
        );
        record.endpoints.insert(
            "boxscoretraditionalv2".to_string(),
            EndpointResult {
                bytes: 50,
                sha1: "b".to_string(),
                gz: false,
                ok: true,
            },
        );
        record.endpoints.insert(
            "playbyplayv2".to_string(),
            EndpointResult {
                bytes: 0,
                sha1: String::new(),
                gz: false,
                ok: false,
            },
        );
        record.errors.push(EndpointError {
            endpoint: "playbyplayv2".to_string(),
            error: "500 Internal Server Error".to_string(),
        });
        manifest.merge_game(record);

        // errors is non-empty, so the overall manifest rule marks the game
        // as failed even though 2 endpoints succeeded; game-level "success"
        // (>= 2 endpoints OK) is a harvester-side concept, not a manifest one.
        assert_eq!(manifest.summary.failed_games, 1);
    }

    #[test]
    fn merge_concatenates_endpoints_and_errors_rather_than_replacing() {
        let mut manifest = Manifest::new("2024-01-15");
        let mut first = GameRecord::new("0022300001");
        first.endpoints.insert(
            "boxscoresummaryv2".to_string(),
            EndpointResult {
                bytes: 10,
                sha1: "a".to_string(),
                gz: false,
                ok: true,
            },
        );
        manifest.merge_game(first);

        let mut second = GameRecord::new("0022300001");
        second.endpoints.insert(
            "playbyplayv2".to_string(),
            EndpointResult {
                bytes: 20,
                sha1: "b".to_string(),
                gz: false,
                ok: true,
            },
        );
        manifest.merge_game(second);

        assert_eq!(manifest.games.len(), 1);
        assert_eq!(manifest.games[0].endpoints.len(), 2);
    }
}
