use std::path::{Path, PathBuf};

use log::{info, warn};
use nba_fetch::{
    append_quarantine, default_quarantine_path, update_manifest, write_json, EndpointError,
    EndpointResult, Fetcher, GameRecord, GameTeams, StatsApiClient,
};
use serde::Serialize;
use serde_json::Value;

use crate::extract::extract_result_set;

const TIER_A_ENDPOINTS: [&str; 4] = [
    "boxscoresummaryv2",
    "boxscoretraditionalv2",
    "playbyplayv2",
    "shotchartdetail",
];

#[derive(Debug, Clone, Serialize, Default)]
pub struct DateHarvestSummary {
    pub date: String,
    pub games_found: usize,
    pub games_excluded_non_regular_season: usize,
    pub games_ok: usize,
    pub quarantined_games: Vec<String>,
}

struct GameHeaderRow {
    game_id: String,
    home_team_id: Option<i64>,
    visitor_team_id: Option<i64>,
}

/// Per-date harvest: fetch + persist scoreboard, filter game IDs to regular
/// season (configurably), then fetch Tier A endpoints for each game
/// sequentially with an inter-game micro-sleep.
pub async fn harvest_date(
    fetcher: &Fetcher,
    raw_root: &Path,
    date: &str,
    regular_season_only: bool,
    inter_game_sleep_ms: u64,
) -> DateHarvestSummary {
    let date_dir = raw_root.join(date);
    let mut summary = DateHarvestSummary {
        date: date.to_string(),
        ..Default::default()
    };

    let client = StatsApiClient::new(fetcher);

    let scoreboard = match client.scoreboard(date).await {
        Ok(value) => value,
        Err(err) => {
            warn!("scoreboard fetch failed for {date}: {err}");
            return summary;
        }
    };

    if let Err(err) = write_json(&date_dir.join("scoreboard.json"), &scoreboard) {
        warn!("failed to persist scoreboard for {date}: {err}");
    }

    let (headers, excluded) = extract_game_headers(&scoreboard, regular_season_only);
    summary.games_found = headers.len();
    summary.games_excluded_non_regular_season = excluded;
    if excluded > 0 {
        info!("excluded {excluded} non-regular-season games for {date}");
    }

    for header in &headers {
        let game_ok = harvest_game(fetcher, &client, &date_dir, header, date).await;
        if game_ok {
            summary.games_ok += 1;
        } else {
            summary.quarantined_games.push(header.game_id.clone());
        }

        if inter_game_sleep_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(inter_game_sleep_ms)).await;
        }
    }

    summary
}

fn extract_game_headers(scoreboard: &Value, regular_season_only: bool) -> (Vec<GameHeaderRow>, usize) {
    let Ok(rows) = extract_result_set(scoreboard, "GameHeader") else {
        return (Vec::new(), 0);
    };

    let has_season_type_column = rows
        .first()
        .map(|row| row.contains_key("SEASON_TYPE_ID") || row.contains_key("SEASON_TYPE"))
        .unwrap_or(false);

    let mut excluded = 0;
    let mut headers = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(game_id) = row.get("GAME_ID").and_then(Value::as_str) else {
            continue;
        };

        if regular_season_only && has_season_type_column {
            let season_type = row
                .get("SEASON_TYPE_ID")
                .or_else(|| row.get("SEASON_TYPE"))
                .and_then(|v| v.as_str().map(str::to_string).or_else(|| v.as_i64().map(|n| n.to_string())));
            let is_regular = matches!(season_type.as_deref(), Some("2") | Some("Regular Season"));
            if !is_regular {
                excluded += 1;
                continue;
            }
        }

        headers.push(GameHeaderRow {
            game_id: game_id.to_string(),
            home_team_id: row.get("HOME_TEAM_ID").and_then(Value::as_i64),
            visitor_team_id: row.get("VISITOR_TEAM_ID").and_then(Value::as_i64),
        });
    }

    (headers, excluded)
}

/// Fetches the Tier A endpoints for one game, persisting and recording a
/// manifest entry after each. Game success requires >= 2 OK endpoints.
async fn harvest_game(
    fetcher: &Fetcher,
    client: &StatsApiClient<'_>,
    date_dir: &Path,
    header: &GameHeaderRow,
    date: &str,
) -> bool {
    let game_id = &header.game_id;
    let game_dir = date_dir.join(game_id);
    let mut record = GameRecord::new(game_id.clone());
    record.teams = GameTeams {
        home_team_id: header.home_team_id,
        visitor_team_id: header.visitor_team_id,
    };

    let mut ok_count = 0;
    let mut boxscore_summary: Option<Value> = None;

    for endpoint in TIER_A_ENDPOINTS {
        let result = fetch_endpoint(fetcher, client, header, endpoint, date, boxscore_summary.as_ref()).await;
        match result {
            Ok(payload) => match write_json(&game_dir.join(format!("{endpoint}.json")), &payload) {
                Ok(written) => {
                    record.endpoints.insert(
                        endpoint.to_string(),
                        EndpointResult {
                            bytes: written.bytes,
                            sha1: written.sha1,
                            gz: written.gz,
                            ok: true,
                        },
                    );
                    ok_count += 1;
                    if endpoint == "boxscoresummaryv2" {
                        boxscore_summary = Some(payload);
                    }
                }
                Err(err) => {
                    record_failure(&mut record, game_id, endpoint, &err.to_string());
                }
            },
            Err(err) => {
                record_failure(&mut record, game_id, endpoint, &err);
            }
        }
    }

    if let Err(err) = update_manifest(date_dir, record) {
        warn!("failed to update manifest for {game_id}: {err}");
    }

    ok_count >= 2
}

fn record_failure(record: &mut GameRecord, game_id: &str, endpoint: &str, error: &str) {
    warn!("{endpoint} failed for {game_id}: {error}");
    record.endpoints.insert(
        endpoint.to_string(),
        EndpointResult {
            bytes: 0,
            sha1: String::new(),
            gz: false,
            ok: false,
        },
    );
    record.errors.push(EndpointError {
        endpoint: endpoint.to_string(),
        error: error.to_string(),
    });
    if let Err(err) = append_quarantine(&default_quarantine_path(), game_id, endpoint, error) {
        warn!("failed to append quarantine entry for {game_id}/{endpoint}: {err}");
    }
}

async fn fetch_endpoint(
    fetcher: &Fetcher,
    client: &StatsApiClient<'_>,
    header: &GameHeaderRow,
    endpoint: &str,
    date: &str,
    boxscore_summary: Option<&Value>,
) -> Result<Value, String> {
    let _ = fetcher;
    match endpoint {
        "boxscoresummaryv2" => client.boxscore_summary(&header.game_id).await.map_err(|e| e.to_string()),
        "boxscoretraditionalv2" => client
            .boxscore_traditional(&header.game_id)
            .await
            .map_err(|e| e.to_string()),
        "playbyplayv2" => client.play_by_play(&header.game_id).await.map_err(|e| e.to_string()),
        "shotchartdetail" => {
            let team_ids = boxscore_summary
                .map(extract_team_ids_from_summary)
                .unwrap_or_default();
            let season = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(crate::season::derive_season_from_date)
                .unwrap_or_else(|_| "UNKNOWN".to_string());
            client
                .shot_chart(&header.game_id, &team_ids, &season)
                .await
                .map_err(|e| e.to_string())
        }
        other => Err(format!("unknown Tier A endpoint {other}")),
    }
}

/// Extracts home/visitor team IDs from a `boxscoresummaryv2` response's
/// `GameSummary` result set, the same source the shot-chart fallback uses
/// upstream.
fn extract_team_ids_from_summary(boxscore_summary: &Value) -> Vec<i64> {
    let Ok(rows) = extract_result_set(boxscore_summary, "GameSummary") else {
        return Vec::new();
    };
    let Some(row) = rows.first() else {
        return Vec::new();
    };
    [row.get("HOME_TEAM_ID"), row.get("VISITOR_TEAM_ID")]
        .into_iter()
        .flatten()
        .filter_map(Value::as_i64)
        .collect()
}

pub fn quarantine_file_path() -> PathBuf {
    default_quarantine_path()
}
