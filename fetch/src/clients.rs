use std::collections::HashSet;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::warn;
use serde_json::Value;

use crate::fetcher::{Accept, FetchError, Fetcher};

const STATS_BASE_URL: &str = "https://stats.nba.com/stats";

/// Endpoint-specific fetch methods over the stats API. Each method builds
/// its own query parameters and returns the parsed
/// `resultSets`-shaped JSON; extraction of individual result sets is the
/// ingest crate's job, not this one's.
pub struct StatsApiClient<'f> {
    fetcher: &'f Fetcher,
}

impl<'f> StatsApiClient<'f> {
    pub fn new(fetcher: &'f Fetcher) -> Self {
        Self { fetcher }
    }

    async fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value, FetchError> {
        let url = format!("{STATS_BASE_URL}/{endpoint}");
        let (bytes, _headers) = self.fetcher.get(&url, params, Accept::Json).await?;
        serde_json::from_slice(&bytes).map_err(|source| FetchError::Decode { url, source })
    }

    pub async fn scoreboard(&self, date: &str) -> Result<Value, FetchError> {
        self.get_json(
            "scoreboardv2",
            &[("GameDate", date), ("LeagueID", "00"), ("DayOffset", "0")],
        )
        .await
    }

    pub async fn boxscore_summary(&self, game_id: &str) -> Result<Value, FetchError> {
        self.get_json("boxscoresummaryv2", &[("GameID", game_id)])
            .await
    }

    pub async fn boxscore_traditional(&self, game_id: &str) -> Result<Value, FetchError> {
        self.get_json(
            "boxscoretraditionalv2",
            &[
                ("GameID", game_id),
                ("StartPeriod", "0"),
                ("EndPeriod", "10"),
                ("StartRange", "0"),
                ("EndRange", "28800"),
                ("RangeType", "0"),
            ],
        )
        .await
    }

    pub async fn play_by_play(&self, game_id: &str) -> Result<Value, FetchError> {
        self.get_json(
            "playbyplayv2",
            &[("GameID", game_id), ("StartPeriod", "0"), ("EndPeriod", "10")],
        )
        .await
    }

    pub async fn schedule(&self, season: &str) -> Result<Value, FetchError> {
        self.get_json(
            "scheduleleaguev2",
            &[("Season", season), ("LeagueID", "00")],
        )
        .await
    }

    /// Shot chart with fallback-and-dedupe: try a game-scoped call first;
    /// on failure, fetch per team ID and merge, deduplicating on the
    /// composite key `(GAME_ID, PLAYER_ID, PERIOD, MINUTES_REMAINING,
    /// SECONDS_REMAINING, LOC_X, LOC_Y)`, extended with `EVENT_NUM` when
    /// that column is present.
    pub async fn shot_chart(&self, game_id: &str, team_ids: &[i64], season: &str) -> Result<Value, FetchError> {
        let base_params = shot_chart_params(game_id, season, "0");

        match self.get_json("shotchartdetail", &base_params).await {
            Ok(value) => Ok(value),
            Err(err) => {
                if team_ids.is_empty() {
                    return Err(err);
                }
                warn!("game-scoped shot chart failed for {game_id}, falling back to per-team: {err}");
                self.shot_chart_by_team(game_id, team_ids, season).await
            }
        }
    }

    async fn shot_chart_by_team(
        &self,
        game_id: &str,
        team_ids: &[i64],
        season: &str,
    ) -> Result<Value, FetchError> {
        let mut headers: Option<Vec<String>> = None;
        let mut all_rows: Vec<Vec<Value>> = Vec::new();

        for team_id in team_ids {
            let team_id_str = team_id.to_string();
            let params = shot_chart_params(game_id, season, &team_id_str);
            match self.get_json("shotchartdetail", &params).await {
                Ok(value) => {
                    if let Some((hdrs, rows)) = extract_shot_chart_detail(&value) {
                        if headers.is_none() {
                            headers = Some(hdrs);
                        }
                        all_rows.extend(rows);
                    }
                }
                Err(err) => warn!("shot chart for team {team_id} in game {game_id} failed: {err}"),
            }
        }

        let Some(headers) = headers else {
            return Err(FetchError::Permanent {
                url: format!("{STATS_BASE_URL}/shotchartdetail"),
                status: reqwest::StatusCode::BAD_GATEWAY,
            });
        };

        let deduped = dedupe_shot_rows(&headers, all_rows);

        Ok(serde_json::json!({
            "resource": "shotchartdetail",
            "resultSets": [{
                "name": "Shot_Chart_Detail",
                "headers": headers,
                "rowSet": deduped,
            }]
        }))
    }
}

fn shot_chart_params<'a>(game_id: &'a str, season: &'a str, team_id: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("GameID", game_id),
        ("Season", season),
        ("SeasonType", "Regular Season"),
        ("TeamID", team_id),
        ("PlayerID", "0"),
        ("ContextMeasure", "FGA"),
        ("StartPeriod", "0"),
        ("EndPeriod", "10"),
        ("StartRange", "0"),
        ("EndRange", "28800"),
        ("RangeType", "0"),
    ]
}

fn extract_shot_chart_detail(value: &Value) -> Option<(Vec<String>, Vec<Vec<Value>>)> {
    let result_sets = value.get("resultSets")?.as_array()?;
    let set = result_sets
        .iter()
        .find(|s| s.get("name").and_then(Value::as_str) == Some("Shot_Chart_Detail"))?;
    let headers: Vec<String> = set
        .get("headers")?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    let rows: Vec<Vec<Value>> = set
        .get("rowSet")?
        .as_array()?
        .iter()
        .filter_map(|row| row.as_array().cloned())
        .collect();
    Some((headers, rows))
}

/// Composite key is `(GAME_ID, PLAYER_ID, PERIOD, MINUTES_REMAINING,
/// SECONDS_REMAINING, LOC_X, LOC_Y)` plus `EVENT_NUM` when the column is
/// present.
fn dedupe_shot_rows(headers: &[String], rows: Vec<Vec<Value>>) -> Vec<Vec<Value>> {
    let index_of = |name: &str| headers.iter().position(|h| h == name);

    let mut key_fields = vec![
        "GAME_ID",
        "PLAYER_ID",
        "PERIOD",
        "MINUTES_REMAINING",
        "SECONDS_REMAINING",
        "LOC_X",
        "LOC_Y",
    ];
    if index_of("EVENT_NUM").is_some() {
        key_fields.push("EVENT_NUM");
    }

    let key_indices: Vec<usize> = key_fields.iter().filter_map(|f| index_of(f)).collect();

    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| {
            if row.len() < headers.len() {
                return false;
            }
            let key = key_indices
                .iter()
                .map(|&i| row.get(i).map(Value::to_string).unwrap_or_default())
                .join("|");
            seen.insert(key)
        })
        .collect()
}

/// HTML reference-site client. HTML parsing is an external boundary; this
/// type only fetches raw HTML for a named table-bearing page and returns it
/// unparsed.
pub struct ReferenceSiteClient<'f> {
    fetcher: &'f Fetcher,
}

impl<'f> ReferenceSiteClient<'f> {
    pub fn new(fetcher: &'f Fetcher) -> Self {
        Self { fetcher }
    }

    /// Fetches the raw HTML for a box score page keyed by its reference-site
    /// game identifier. Callers are expected to locate `id="line_score"` and
    /// `id="box-*"` tables in the returned document.
    pub async fn box_score_html(&self, bref_game_id: &str) -> Result<String, FetchError> {
        let url = format!("https://www.basketball-reference.com/boxscores/{bref_game_id}.html");
        let (bytes, _headers) = self.fetcher.get(&url, &[], Accept::Html).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Gamebook PDF listing + caching download client.
pub struct GamebookClient<'f> {
    fetcher: &'f Fetcher,
    cache_dir: PathBuf,
}

impl<'f> GamebookClient<'f> {
    pub fn new(fetcher: &'f Fetcher, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            cache_dir: cache_dir.into(),
        }
    }

    /// Lists PDF URLs for a date's gamebooks. The listing page's HTML is an
    /// external-boundary contract like the reference site; we return the raw
    /// listing text here for a caller-supplied URL extractor.
    pub async fn list_gamebook_urls(&self, listing_url: &str) -> Result<String, FetchError> {
        let (bytes, _headers) = self.fetcher.get(listing_url, &[], Accept::Html).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Downloads a gamebook PDF verbatim, caching by a hash of the URL so a
    /// repeated harvest of the same date doesn't re-download unchanged
    /// files.
    pub async fn download_gamebook(&self, url: &str) -> Result<PathBuf, FetchError> {
        let cache_path = self.cache_path_for(url);
        if cache_path.exists() {
            return Ok(cache_path);
        }

        let (bytes, _headers) = self.fetcher.get(url, &[], Accept::Html).await?;
        if let Some(parent) = cache_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        std::fs::write(&cache_path, &bytes).map_err(|source| FetchError::Io {
            url: url.to_string(),
            source,
        })?;

        Ok(cache_path)
    }

    fn cache_path_for(&self, url: &str) -> PathBuf {
        use sha1::{Digest, Sha1};
        let mut hasher = Sha1::new();
        hasher.update(url.as_bytes());
        let digest = hex::encode(hasher.finalize());
        self.cache_dir.join(format!("{digest}.pdf"))
    }
}

pub fn ensure_cache_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dedupes_on_composite_key_without_event_num() {
        let headers = vec![
            "GAME_ID".to_string(),
            "PLAYER_ID".to_string(),
            "PERIOD".to_string(),
            "MINUTES_REMAINING".to_string(),
            "SECONDS_REMAINING".to_string(),
            "LOC_X".to_string(),
            "LOC_Y".to_string(),
        ];
        let row = vec![
            json!("0022300001"),
            json!(201939),
            json!(1),
            json!(10),
            json!(30),
            json!(50),
            json!(60),
        ];
        let rows = vec![row.clone(), row.clone(), row];

        let deduped = dedupe_shot_rows(&headers, rows);
        assert_eq!(deduped.len(), 1);
    }

    #[test]
    fn includes_event_num_in_key_when_present() {
        let headers = vec![
            "GAME_ID".to_string(),
            "PLAYER_ID".to_string(),
            "PERIOD".to_string(),
            "MINUTES_REMAINING".to_string(),
            "SECONDS_REMAINING".to_string(),
            "LOC_X".to_string(),
            "LOC_Y".to_string(),
            "EVENT_NUM".to_string(),
        ];
        let base = vec![
            json!("0022300001"),
            json!(201939),
            json!(1),
            json!(10),
            json!(30),
            json!(50),
            json!(60),
        ];
        let mut row_a = base.clone();
        row_a.push(json!(12));
        let mut row_b = base;
        row_b.push(json!(34));

        let deduped = dedupe_shot_rows(&headers, vec![row_a, row_b]);
        // Same coords/time but different event_num: not deduped together.
        assert_eq!(deduped.len(), 2);
    }
}
