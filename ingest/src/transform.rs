use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::clock;
use crate::extract::Row;
use crate::models::{
    Game, GameIdCrosswalk, GameStatus, LineupStint, Outcome, PbpEvent, RefAlternate,
    RefAssignment, RefRole, ShotEvent, StartingLineup, ValidationError,
};
use crate::season;

fn field_str<'a>(row: &'a Row, key: &str) -> Option<&'a str> {
    row.get(key).and_then(Value::as_str)
}

fn field_i64(row: &Row, key: &str) -> Option<i64> {
    match row.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) if !s.is_empty() => s.parse().ok(),
        _ => None,
    }
}

fn field_i32(row: &Row, key: &str) -> Option<i32> {
    field_i64(row, key).map(|v| v as i32)
}

fn required_i64(row: &Row, key: &'static str, game_id: &str) -> Result<i64, ValidationError> {
    field_i64(row, key).ok_or_else(|| ValidationError::MissingField {
        field: key,
        game_id: game_id.to_string(),
    })
}

fn required_i32(row: &Row, key: &'static str, game_id: &str) -> Result<i32, ValidationError> {
    field_i32(row, key).ok_or_else(|| ValidationError::MissingField {
        field: key,
        game_id: game_id.to_string(),
    })
}

/// Transforms a `GameSummary` row into a validated `Game`. `GameSummary`
/// carries `HOME_TEAM_ID`/`VISITOR_TEAM_ID` as bare numeric team IDs — no
/// tricode column exists on this result set, so the IDs pass straight
/// through rather than resolving via the team crosswalk.
pub fn transform_game(
    row: &Row,
    explicit_season: Option<&str>,
    game_date_local: Option<NaiveDate>,
    game_date_utc: Option<NaiveDate>,
) -> Result<Game, ValidationError> {
    let game_id = field_str(row, "GAME_ID")
        .ok_or_else(|| ValidationError::MissingField {
            field: "GAME_ID",
            game_id: String::new(),
        })?
        .to_string();

    if !season::is_valid_game_id(&game_id) {
        return Err(ValidationError::InvalidGameId(game_id));
    }

    let game_date = game_date_local
        .or(game_date_utc)
        .unwrap_or_else(|| Utc::now().date_naive());

    let season = season::derive_season(explicit_season, Some(&game_id), Some(game_date));

    let status_raw = field_str(row, "GAME_STATUS_TEXT").unwrap_or("");
    let status = GameStatus::normalize(status_raw)
        .map_err(|_| ValidationError::UnknownStatus(status_raw.to_string(), game_id.clone()))?;

    let home_team_id = required_i64(row, "HOME_TEAM_ID", &game_id)?;
    let away_team_id = required_i64(row, "VISITOR_TEAM_ID", &game_id)?;

    Game::new(game_id, season, game_date, home_team_id, away_team_id, status)
}

/// Mirrors the original transformer's field priority: `TEAM_ID` falls back to
/// `PLAYER1_TEAM_ID`; description picks the first non-empty of
/// HOME/NEUTRAL/VISITOR/plain `DESCRIPTION`.
pub fn transform_pbp_event(row: &Row, game_id: &str) -> Result<PbpEvent, ValidationError> {
    let clock_raw = field_str(row, "PCTIMESTRING")
        .or_else(|| field_str(row, "CLOCK"))
        .unwrap_or("")
        .to_string();

    let team_id = field_i64(row, "TEAM_ID").filter(|&v| v != 0).or_else(|| {
        field_i64(row, "PLAYER1_TEAM_ID").filter(|&v| v != 0)
    });
    let player1_id = field_i64(row, "PLAYER1_ID");
    let action_type = field_i32(row, "EVENTMSGTYPE");
    let action_subtype = field_i32(row, "EVENTMSGACTIONTYPE");

    let description = field_str(row, "HOMEDESCRIPTION")
        .or_else(|| field_str(row, "NEUTRALDESCRIPTION"))
        .or_else(|| field_str(row, "VISITORDESCRIPTION"))
        .or_else(|| field_str(row, "DESCRIPTION"))
        .map(str::to_string);

    let event_idx = required_i32(row, "EVENTNUM", game_id)?;
    let period = required_i32(row, "PERIOD", game_id)?;

    let clock_seconds = clock::parse_clock_to_seconds(&clock_raw).unwrap_or(0.0);
    let seconds_elapsed = clock::seconds_elapsed(clock_seconds, period);

    Ok(PbpEvent {
        game_id: game_id.to_string(),
        event_idx,
        period,
        clock: clock_raw,
        clock_seconds,
        seconds_elapsed,
        team_id,
        player1_id,
        action_type,
        action_subtype,
        description,
    })
}

pub fn transform_shot_event(row: &Row, game_id: &str) -> Result<ShotEvent, ValidationError> {
    let team_id = field_i64(row, "TEAM_ID").filter(|&v| v != 0);
    let event_num = field_i32(row, "GAME_EVENT_ID");

    let shot = ShotEvent {
        game_id: game_id.to_string(),
        player_id: required_i64(row, "PLAYER_ID", game_id)?,
        period: required_i32(row, "PERIOD", game_id)?,
        loc_x: required_i32(row, "LOC_X", game_id)?,
        loc_y: required_i32(row, "LOC_Y", game_id)?,
        team_id,
        shot_made_flag: required_i32(row, "SHOT_MADE_FLAG", game_id)?,
        event_num,
    };
    shot.validate()
}

/// `StartingLineup` carries one row per player; groups by team into the
/// five-man roster the model expects.
pub fn transform_starting_lineups(
    rows: &[Row],
    game_id: &str,
) -> Result<Vec<StartingLineup>, ValidationError> {
    let mut by_team: Vec<(i64, Vec<i64>)> = Vec::new();
    for row in rows {
        let team_id = required_i64(row, "TEAM_ID", game_id)?;
        let player_id = required_i64(row, "PLAYER_ID", game_id)?;
        match by_team.iter_mut().find(|(t, _)| *t == team_id) {
            Some((_, players)) => players.push(player_id),
            None => by_team.push((team_id, vec![player_id])),
        }
    }
    Ok(by_team
        .into_iter()
        .map(|(team_id, player_ids)| StartingLineup {
            game_id: game_id.to_string(),
            team_id,
            player_ids,
        })
        .collect())
}

/// Lineup-stint rows carry the on-court five either as a delimited string or
/// as individual `PLAYER_ID_{1..5}` columns; both shapes are accepted.
pub fn transform_lineup_stint(row: &Row, game_id: &str) -> Result<LineupStint, ValidationError> {
    let team_id = required_i64(row, "TEAM_ID", game_id)?;
    let period = required_i32(row, "PERIOD", game_id)?;
    let seconds_played = field_i64(row, "SECONDS_PLAYED")
        .or_else(|| field_i64(row, "SECS"))
        .unwrap_or(0) as f64;

    let player_ids = if let Some(joined) = field_str(row, "PLAYER_IDS") {
        joined
            .split(|c: char| c == ',' || c == '-')
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    } else {
        (1..=5)
            .filter_map(|n| field_i64(row, &format!("PLAYER_ID_{n}")))
            .collect()
    };

    LineupStint::new(game_id.to_string(), team_id, period, player_ids, seconds_played)
}

/// `Officials` rows carry no explicit role column upstream; by convention the
/// first official listed is the crew chief and the rest are referees.
pub fn transform_ref_assignments(
    rows: &[Row],
    game_id: &str,
) -> Result<Vec<RefAssignment>, ValidationError> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let first = field_str(row, "FIRST_NAME").unwrap_or("").trim();
            let last = field_str(row, "LAST_NAME").unwrap_or("").trim();
            let referee_name = format!("{first} {last}").trim().to_string();
            if referee_name.is_empty() {
                return Err(ValidationError::MissingField {
                    field: "LAST_NAME",
                    game_id: game_id.to_string(),
                });
            }
            let role = if idx == 0 { RefRole::CrewChief } else { RefRole::Referee };
            Ok(RefAssignment {
                game_id: game_id.to_string(),
                referee_name_slug: crate::models::slugify_referee_name(&referee_name),
                referee_name,
                role,
            })
        })
        .collect()
}

/// `Officials_Alternates`-shaped rows: same field layout, always `Official` role.
pub fn transform_ref_alternates(
    rows: &[Row],
    game_id: &str,
) -> Result<Vec<RefAlternate>, ValidationError> {
    rows.iter()
        .map(|row| {
            let first = field_str(row, "FIRST_NAME").unwrap_or("").trim();
            let last = field_str(row, "LAST_NAME").unwrap_or("").trim();
            let referee_name = format!("{first} {last}").trim().to_string();
            if referee_name.is_empty() {
                return Err(ValidationError::MissingField {
                    field: "LAST_NAME",
                    game_id: game_id.to_string(),
                });
            }
            Ok(RefAlternate {
                game_id: game_id.to_string(),
                referee_name_slug: crate::models::slugify_referee_name(&referee_name),
                referee_name,
                role: RefRole::Official,
            })
        })
        .collect()
}

/// Scans `TeamStats` rows for the two teams' point totals and assigns
/// home/away by matching `TEAM_ID` against the already-upserted `Game`.
pub fn transform_outcome(
    team_stats_rows: &[Row],
    game_id: &str,
    home_team_id: i64,
    away_team_id: i64,
) -> Result<Outcome, ValidationError> {
    let mut home_score = None;
    let mut away_score = None;
    for row in team_stats_rows {
        let team_id = required_i64(row, "TEAM_ID", game_id)?;
        let pts = required_i32(row, "PTS", game_id)?;
        if team_id == home_team_id {
            home_score = Some(pts);
        } else if team_id == away_team_id {
            away_score = Some(pts);
        }
    }
    let home_score = home_score.ok_or_else(|| ValidationError::MissingField {
        field: "PTS (home)",
        game_id: game_id.to_string(),
    })?;
    let away_score = away_score.ok_or_else(|| ValidationError::MissingField {
        field: "PTS (away)",
        game_id: game_id.to_string(),
    })?;
    Ok(Outcome::new(game_id.to_string(), home_score, away_score))
}

pub fn transform_game_id_crosswalk(game_id: &str, bref_game_id: Option<String>) -> GameIdCrosswalk {
    GameIdCrosswalk {
        game_id: game_id.to_string(),
        bref_game_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        let mut map = serde_json::Map::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.clone());
        }
        map
    }

    #[test]
    fn transforms_pbp_event_preferring_home_description() {
        let r = row(&[
            ("PCTIMESTRING", json!("11:30")),
            ("EVENTNUM", json!(12)),
            ("PERIOD", json!(1)),
            ("TEAM_ID", json!(1610612747)),
            ("PLAYER1_ID", json!(2544)),
            ("EVENTMSGTYPE", json!(1)),
            ("EVENTMSGACTIONTYPE", json!(0)),
            ("HOMEDESCRIPTION", json!("Made Shot")),
            ("VISITORDESCRIPTION", json!(Value::Null)),
        ]);
        let event = transform_pbp_event(&r, "0022300001").unwrap();
        assert_eq!(event.description.as_deref(), Some("Made Shot"));
        assert_eq!(event.team_id, Some(1610612747));
        assert_eq!(event.clock, "11:30");
        assert!((event.clock_seconds - 690.0).abs() < 1e-9);
    }

    #[test]
    fn pbp_event_falls_back_to_player1_team_id() {
        let r = row(&[
            ("PCTIMESTRING", json!("2:00")),
            ("EVENTNUM", json!(1)),
            ("PERIOD", json!(4)),
            ("PLAYER1_TEAM_ID", json!(1610612738)),
        ]);
        let event = transform_pbp_event(&r, "0022300001").unwrap();
        assert_eq!(event.team_id, Some(1610612738));
    }

    #[test]
    fn transforms_shot_event_and_rejects_bad_flag() {
        let r = row(&[
            ("PLAYER_ID", json!(2544)),
            ("TEAM_ID", json!(1610612747)),
            ("PERIOD", json!(2)),
            ("LOC_X", json!(10)),
            ("LOC_Y", json!(20)),
            ("SHOT_MADE_FLAG", json!(2)),
            ("GAME_EVENT_ID", json!(55)),
        ]);
        let err = transform_shot_event(&r, "0022300001").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidShotMadeFlag(2, _)));
    }

    #[test]
    fn groups_starting_lineup_rows_by_team() {
        let rows = vec![
            row(&[("TEAM_ID", json!(1)), ("PLAYER_ID", json!(10))]),
            row(&[("TEAM_ID", json!(1)), ("PLAYER_ID", json!(11))]),
            row(&[("TEAM_ID", json!(2)), ("PLAYER_ID", json!(20))]),
        ];
        let lineups = transform_starting_lineups(&rows, "0022300001").unwrap();
        assert_eq!(lineups.len(), 2);
        assert_eq!(lineups[0].player_ids, vec![10, 11]);
    }

    #[test]
    fn first_official_becomes_crew_chief() {
        let rows = vec![
            row(&[("FIRST_NAME", json!("Scott")), ("LAST_NAME", json!("Foster"))]),
            row(&[("FIRST_NAME", json!("Tony")), ("LAST_NAME", json!("Brothers"))]),
        ];
        let refs = transform_ref_assignments(&rows, "0022300001").unwrap();
        assert_eq!(refs[0].role, RefRole::CrewChief);
        assert_eq!(refs[1].role, RefRole::Referee);
    }

    #[test]
    fn derives_outcome_from_team_stats() {
        let rows = vec![
            row(&[("TEAM_ID", json!(1)), ("PTS", json!(110))]),
            row(&[("TEAM_ID", json!(2)), ("PTS", json!(102))]),
        ];
        let outcome = transform_outcome(&rows, "0022300001", 1, 2).unwrap();
        assert!(outcome.home_win);
        assert_eq!(outcome.margin, 8);
    }
}
