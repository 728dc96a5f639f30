use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use log::warn;
use nba_db::loaders;
use nba_db::models::{
    NewGame, NewGameIdCrosswalk, NewLineupStint, NewOutcome, NewPbpEvent, NewRefAlternate,
    NewRefAssignment, NewShotEvent, NewStartingLineup,
};
use nba_db::{partition_by_existing_game_ids, ConnectionPool};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::extract::{extract_result_set, resolve_game_id};
use crate::reader::{game_id_from_dir, list_game_dirs, read_endpoint};
use crate::transform;

const SOURCE: &str = "nba_stats_api";

/// Per-game outcome record: errors never propagate out of `process_game` —
/// they fold into `errors`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GameResult {
    pub game_id: String,
    pub game_processed: bool,
    pub pbp_events_processed: usize,
    pub lineups_processed: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SilverLoadSummary {
    pub date: String,
    pub games: Vec<GameResult>,
}

impl SilverLoadSummary {
    pub fn total_errors(&self) -> usize {
        self.games.iter().map(|g| g.errors.len()).sum()
    }
}

/// Runs the silver-load pipeline for every harvested game on `date`,
/// bounded by a semaphore of width `concurrency` (default 3). Individual
/// game failures never abort the run.
pub async fn run_silver_load(
    pool: ConnectionPool,
    raw_root: &Path,
    date: &str,
    concurrency: usize,
    cancel: CancellationToken,
) -> SilverLoadSummary {
    let game_dirs = list_game_dirs(raw_root, date);
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let mut handles = Vec::with_capacity(game_dirs.len());
    for game_dir in game_dirs {
        let Some(game_id) = game_id_from_dir(&game_dir) else {
            continue;
        };
        let semaphore = semaphore.clone();
        let pool = pool.clone();
        let cancel = cancel.clone();

        handles.push(tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return GameResult {
                    game_id,
                    errors: vec!["semaphore closed".to_string()],
                    ..Default::default()
                },
            };
            if cancel.is_cancelled() {
                return GameResult {
                    game_id,
                    errors: vec!["cancelled before start".to_string()],
                    ..Default::default()
                };
            }
            process_game(&pool, &game_dir, &game_id).await
        }));
    }

    let mut games = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(result) => games.push(result),
            Err(join_err) => games.push(GameResult {
                errors: vec![format!("task panicked: {join_err}")],
                ..Default::default()
            }),
        }
    }

    SilverLoadSummary {
        date: date.to_string(),
        games,
    }
}

/// Single-game state machine: `FETCHED_BOXSCORE -> GAME_UPSERTED ->
/// PBP_UPSERTED -> LINEUPS_UPSERTED -> DONE`. Each phase is independent; a
/// failure is recorded and later phases still run as long as the boxscore
/// response itself was fetched.
async fn process_game(pool: &ConnectionPool, game_dir: &Path, game_id: &str) -> GameResult {
    let mut result = GameResult {
        game_id: game_id.to_string(),
        ..Default::default()
    };

    let Some(boxscore) = read_endpoint(game_dir, "boxscoresummaryv2") else {
        result.errors.push("boxscoresummaryv2 response missing or corrupt".to_string());
        return result;
    };

    let mut conn = match pool.get() {
        Ok(conn) => conn,
        Err(err) => {
            result.errors.push(format!("failed to check out DB connection: {err}"));
            return result;
        }
    };

    let resolved_game_id = match resolve_game_id(Some(&boxscore), None) {
        Ok(id) => id,
        Err(err) => {
            result.errors.push(err.to_string());
            return result;
        }
    };

    // Phase: game upsert.
    let mut team_ids: Option<(i64, i64)> = None;
    match build_game_row(&boxscore, &resolved_game_id) {
        Ok(new_game) => {
            team_ids = Some((new_game.home_team_id as i64, new_game.away_team_id as i64));
            match loaders::upsert_games(&mut conn, std::slice::from_ref(&new_game)) {
                Ok(_) => result.game_processed = true,
                Err(err) => result.errors.push(format!("game upsert failed: {err}")),
            }
        }
        Err(err) => result.errors.push(format!("game transform failed: {err}")),
    }

    // Phase: outcomes, from the boxscore response's TeamStats rows.
    if let Some((home_team_id, away_team_id)) = team_ids {
        match extract_result_set(&boxscore, "TeamStats") {
            Ok(rows) if !rows.is_empty() => {
                match transform::transform_outcome(&rows, &resolved_game_id, home_team_id, away_team_id) {
                    Ok(outcome) => {
                        let new_outcome = to_new_outcome(outcome);
                        if let Err(err) = loaders::upsert_outcomes(&mut conn, std::slice::from_ref(&new_outcome)) {
                            result.errors.push(format!("outcome upsert failed: {err}"));
                        }
                    }
                    Err(err) => result.errors.push(format!("outcome transform failed: {err}")),
                }
            }
            Ok(_) => {}
            Err(err) => result.errors.push(format!("outcome extract failed: {err}")),
        }
    }

    // Phase: PBP — independent of whether the game upsert succeeded.
    if let Some(pbp_payload) = read_endpoint(game_dir, "playbyplayv2") {
        match extract_result_set(&pbp_payload, "PlayByPlay") {
            Ok(rows) => {
                let events: Vec<NewPbpEvent> = rows
                    .iter()
                    .filter_map(|row| match transform::transform_pbp_event(row, &resolved_game_id) {
                        Ok(event) => Some(event),
                        Err(err) => {
                            warn!("skipping pbp row for {resolved_game_id}: {err}");
                            None
                        }
                    })
                    .map(to_new_pbp_event)
                    .collect();

                let (valid, rejected) =
                    partition_by_existing_game_ids(&mut conn, events, |e| &e.game_id).unwrap_or_default();
                if !rejected.is_empty() {
                    result
                        .errors
                        .push(format!("{} pbp rows rejected by FK validator", rejected.len()));
                }
                match loaders::upsert_pbp_events(&mut conn, &valid) {
                    Ok(_) => result.pbp_events_processed = valid.len(),
                    Err(err) => result.errors.push(format!("pbp upsert failed: {err}")),
                }
            }
            Err(err) => result.errors.push(format!("pbp extract failed: {err}")),
        }
    }

    // Phase: shots, from the shotchartdetail.json sibling file.
    if let Some(shot_payload) = read_endpoint(game_dir, "shotchartdetail") {
        match extract_result_set(&shot_payload, "Shot_Chart_Detail") {
            Ok(rows) => {
                let shots: Vec<NewShotEvent> = rows
                    .iter()
                    .filter_map(|row| match transform::transform_shot_event(row, &resolved_game_id) {
                        Ok(shot) => Some(shot),
                        Err(err) => {
                            warn!("skipping shot row for {resolved_game_id}: {err}");
                            None
                        }
                    })
                    .map(to_new_shot_event)
                    .collect();

                let (valid, rejected) =
                    partition_by_existing_game_ids(&mut conn, shots, |s| &s.game_id).unwrap_or_default();
                if !rejected.is_empty() {
                    result
                        .errors
                        .push(format!("{} shot rows rejected by FK validator", rejected.len()));
                }
                if let Err(err) = loaders::upsert_shot_events(&mut conn, &valid) {
                    result.errors.push(format!("shot upsert failed: {err}"));
                }
            }
            Err(err) => result.errors.push(format!("shot extract failed: {err}")),
        }
    }

    // Phase: lineups, from the boxscore response's StartingLineup rows.
    match extract_result_set(&boxscore, "StartingLineup") {
        Ok(rows) if !rows.is_empty() => {
            match transform::transform_starting_lineups(&rows, &resolved_game_id) {
                Ok(lineups) => {
                    let new_lineups: Vec<NewStartingLineup> = lineups.into_iter().map(to_new_starting_lineup).collect();
                    let (valid, rejected) = partition_by_existing_game_ids(&mut conn, new_lineups, |l| &l.game_id)
                        .unwrap_or_default();
                    if !rejected.is_empty() {
                        result
                            .errors
                            .push(format!("{} starting lineup rows rejected by FK validator", rejected.len()));
                    }
                    match loaders::upsert_starting_lineups(&mut conn, &valid) {
                        Ok(_) => result.lineups_processed = valid.len(),
                        Err(err) => result.errors.push(format!("starting lineup upsert failed: {err}")),
                    }
                }
                Err(err) => result.errors.push(format!("starting lineup transform failed: {err}")),
            }
        }
        Ok(_) => {}
        Err(err) => result.errors.push(format!("starting lineup extract failed: {err}")),
    }

    // Phase: officials.
    if let Ok(rows) = extract_result_set(&boxscore, "Officials") {
        if !rows.is_empty() {
            match transform::transform_ref_assignments(&rows, &resolved_game_id) {
                Ok(refs) => {
                    let new_refs: Vec<NewRefAssignment> = refs.into_iter().map(to_new_ref_assignment).collect();
                    if let Err(err) = loaders::upsert_ref_assignments(&mut conn, &new_refs) {
                        result.errors.push(format!("referee upsert failed: {err}"));
                    }
                }
                Err(err) => result.errors.push(format!("referee transform failed: {err}")),
            }
        }
    }

    result
}

fn build_game_row(boxscore: &serde_json::Value, game_id: &str) -> Result<NewGame, String> {
    let rows = extract_result_set(boxscore, "GameSummary").map_err(|e| e.to_string())?;
    let row = rows.first().ok_or_else(|| "GameSummary result set is empty".to_string())?;

    let game = transform::transform_game(row, None, None, None).map_err(|e| e.to_string())?;
    let _ = game_id;
    Ok(to_new_game(&game))
}

fn to_new_game(game: &crate::models::Game) -> NewGame {
    NewGame {
        game_id: game.game_id.clone(),
        season: game.season.clone(),
        game_date: game.game_date,
        home_team_id: game.home_team_id as i32,
        away_team_id: game.away_team_id as i32,
        status: game.status.as_str().to_string(),
        source: SOURCE.to_string(),
        source_url: None,
        ingested_at_utc: Utc::now(),
    }
}

fn to_new_pbp_event(event: crate::models::PbpEvent) -> NewPbpEvent {
    NewPbpEvent {
        game_id: event.game_id,
        event_idx: event.event_idx,
        period: event.period,
        clock: event.clock,
        clock_seconds: event.clock_seconds,
        seconds_elapsed: event.seconds_elapsed,
        team_id: event.team_id.map(|v| v as i32),
        player1_id: event.player1_id.map(|v| v as i32),
        action_type: event.action_type,
        action_subtype: event.action_subtype,
        description: event.description,
        source: SOURCE.to_string(),
        source_url: None,
        ingested_at_utc: Utc::now(),
    }
}

fn to_new_starting_lineup(lineup: crate::models::StartingLineup) -> NewStartingLineup {
    NewStartingLineup {
        game_id: lineup.game_id,
        team_id: lineup.team_id as i32,
        player_ids: lineup.player_ids.into_iter().map(|v| v as i32).collect(),
        source: SOURCE.to_string(),
        source_url: None,
        ingested_at_utc: Utc::now(),
    }
}

fn to_new_ref_assignment(r: crate::models::RefAssignment) -> NewRefAssignment {
    NewRefAssignment {
        game_id: r.game_id,
        referee_name_slug: r.referee_name_slug,
        referee_name: r.referee_name,
        role: r.role.as_str().to_string(),
        source: SOURCE.to_string(),
        source_url: None,
        ingested_at_utc: Utc::now(),
    }
}

#[allow(dead_code)]
fn to_new_ref_alternate(r: crate::models::RefAlternate) -> NewRefAlternate {
    NewRefAlternate {
        game_id: r.game_id,
        referee_name_slug: r.referee_name_slug,
        referee_name: r.referee_name,
        role: r.role.as_str().to_string(),
        source: SOURCE.to_string(),
        source_url: None,
        ingested_at_utc: Utc::now(),
    }
}

fn to_new_shot_event(shot: crate::models::ShotEvent) -> NewShotEvent {
    NewShotEvent {
        game_id: shot.game_id,
        player_id: shot.player_id as i32,
        period: shot.period,
        loc_x: shot.loc_x,
        loc_y: shot.loc_y,
        team_id: shot.team_id.map(|v| v as i32),
        shot_made_flag: shot.shot_made_flag,
        event_num: shot.event_num,
        source: SOURCE.to_string(),
        source_url: None,
        ingested_at_utc: Utc::now(),
    }
}

#[allow(dead_code)]
fn to_new_lineup_stint(stint: crate::models::LineupStint) -> NewLineupStint {
    NewLineupStint {
        game_id: stint.game_id,
        team_id: stint.team_id as i32,
        period: stint.period,
        lineup_player_ids: stint.lineup_player_ids.into_iter().map(|v| v as i32).collect(),
        seconds_played: stint.seconds_played,
        source: SOURCE.to_string(),
        source_url: None,
        ingested_at_utc: Utc::now(),
    }
}

fn to_new_outcome(outcome: crate::models::Outcome) -> NewOutcome {
    NewOutcome {
        game_id: outcome.game_id,
        home_score: outcome.home_score,
        away_score: outcome.away_score,
        total_points: outcome.total_points,
        home_win: outcome.home_win,
        margin: outcome.margin,
        source: SOURCE.to_string(),
        source_url: None,
        ingested_at_utc: Utc::now(),
    }
}

#[allow(dead_code)]
fn to_new_game_id_crosswalk(row: crate::models::GameIdCrosswalk) -> NewGameIdCrosswalk {
    NewGameIdCrosswalk {
        game_id: row.game_id,
        bref_game_id: row.bref_game_id,
        source: SOURCE.to_string(),
        source_url: None,
        ingested_at_utc: Utc::now(),
    }
}
