use diesel::connection::Connection;
use diesel::sql_types::{Bool, Date, Float8, Int4, Nullable, Text, Timestamptz};
use diesel::{sql_query, PgConnection, QueryableByName, RunQueryDsl};

use crate::models::{
    NewGame, NewGameIdCrosswalk, NewInjuryStatus, NewLineupStint, NewOutcome, NewPbpEvent,
    NewRefAlternate, NewRefAssignment, NewShotEvent, NewStartingLineup,
};

const PBP_BATCH_SIZE: usize = 1000;

/// `xmax <> 0` in a `RETURNING` clause distinguishes a row that hit the
/// conflict branch from a fresh insert, which is how each loader below
/// reports "rows actually updated" separately from inserts.
#[derive(QueryableByName)]
struct UpdatedFlag {
    #[diesel(sql_type = Bool)]
    updated: bool,
}

pub fn upsert_games(conn: &mut PgConnection, games: &[NewGame]) -> diesel::QueryResult<usize> {
    conn.transaction(|conn| {
        let mut updated = 0;
        for game in games {
            let query = sql_query(
                "INSERT INTO games \
                 (game_id, season, game_date, home_team_id, away_team_id, status, source, source_url, ingested_at_utc) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 ON CONFLICT (game_id) DO UPDATE SET \
                   season = EXCLUDED.season, game_date = EXCLUDED.game_date, \
                   home_team_id = EXCLUDED.home_team_id, away_team_id = EXCLUDED.away_team_id, \
                   status = EXCLUDED.status, source = EXCLUDED.source, \
                   source_url = EXCLUDED.source_url, ingested_at_utc = EXCLUDED.ingested_at_utc \
                 WHERE games.season IS DISTINCT FROM EXCLUDED.season \
                    OR games.game_date IS DISTINCT FROM EXCLUDED.game_date \
                    OR games.home_team_id IS DISTINCT FROM EXCLUDED.home_team_id \
                    OR games.away_team_id IS DISTINCT FROM EXCLUDED.away_team_id \
                    OR games.status IS DISTINCT FROM EXCLUDED.status \
                 RETURNING (xmax <> 0) AS updated",
            )
            .bind::<Text, _>(&game.game_id)
            .bind::<Text, _>(&game.season)
            .bind::<Date, _>(game.game_date)
            .bind::<Int4, _>(game.home_team_id)
            .bind::<Int4, _>(game.away_team_id)
            .bind::<Text, _>(&game.status)
            .bind::<Text, _>(&game.source)
            .bind::<Nullable<Text>, _>(&game.source_url)
            .bind::<Timestamptz, _>(game.ingested_at_utc);

            let rows: Vec<UpdatedFlag> = query.load(conn)?;
            updated += rows.iter().filter(|r| r.updated).count();
        }
        Ok(updated)
    })
}

pub fn upsert_pbp_events(conn: &mut PgConnection, events: &[NewPbpEvent]) -> diesel::QueryResult<usize> {
    let mut total_updated = 0;
    for chunk in events.chunks(PBP_BATCH_SIZE) {
        total_updated += conn.transaction(|conn| {
            let mut updated = 0;
            for event in chunk {
                let query = sql_query(
                    "INSERT INTO pbp_events \
                     (game_id, event_idx, period, clock, clock_seconds, seconds_elapsed, \
                      team_id, player1_id, action_type, action_subtype, description, \
                      source, source_url, ingested_at_utc) \
                     VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14) \
                     ON CONFLICT (game_id, event_idx) DO UPDATE SET \
                       period = EXCLUDED.period, clock = EXCLUDED.clock, \
                       clock_seconds = EXCLUDED.clock_seconds, seconds_elapsed = EXCLUDED.seconds_elapsed, \
                       team_id = EXCLUDED.team_id, player1_id = EXCLUDED.player1_id, \
                       action_type = EXCLUDED.action_type, action_subtype = EXCLUDED.action_subtype, \
                       description = EXCLUDED.description, source = EXCLUDED.source, \
                       source_url = EXCLUDED.source_url, ingested_at_utc = EXCLUDED.ingested_at_utc \
                     WHERE pbp_events.period IS DISTINCT FROM EXCLUDED.period \
                        OR pbp_events.clock IS DISTINCT FROM EXCLUDED.clock \
                        OR pbp_events.clock_seconds IS DISTINCT FROM EXCLUDED.clock_seconds \
                        OR pbp_events.seconds_elapsed IS DISTINCT FROM EXCLUDED.seconds_elapsed \
                        OR pbp_events.team_id IS DISTINCT FROM EXCLUDED.team_id \
                        OR pbp_events.player1_id IS DISTINCT FROM EXCLUDED.player1_id \
                        OR pbp_events.action_type IS DISTINCT FROM EXCLUDED.action_type \
                        OR pbp_events.action_subtype IS DISTINCT FROM EXCLUDED.action_subtype \
                        OR pbp_events.description IS DISTINCT FROM EXCLUDED.description \
                     RETURNING (xmax <> 0) AS updated",
                )
                .bind::<Text, _>(&event.game_id)
                .bind::<Int4, _>(event.event_idx)
                .bind::<Int4, _>(event.period)
                .bind::<Text, _>(&event.clock)
                .bind::<Float8, _>(event.clock_seconds)
                .bind::<Float8, _>(event.seconds_elapsed)
                .bind::<Nullable<Int4>, _>(event.team_id)
                .bind::<Nullable<Int4>, _>(event.player1_id)
                .bind::<Nullable<Int4>, _>(event.action_type)
                .bind::<Nullable<Int4>, _>(event.action_subtype)
                .bind::<Nullable<Text>, _>(&event.description)
                .bind::<Text, _>(&event.source)
                .bind::<Nullable<Text>, _>(&event.source_url)
                .bind::<Timestamptz, _>(event.ingested_at_utc);

                let rows: Vec<UpdatedFlag> = query.load(conn)?;
                updated += rows.iter().filter(|r| r.updated).count();
            }
            diesel::QueryResult::Ok(updated)
        })?;
    }
    Ok(total_updated)
}

pub fn upsert_shot_events(conn: &mut PgConnection, shots: &[NewShotEvent]) -> diesel::QueryResult<usize> {
    conn.transaction(|conn| {
        let mut updated = 0;
        for shot in shots {
            let query = sql_query(
                "INSERT INTO shot_events \
                 (game_id, player_id, period, loc_x, loc_y, team_id, shot_made_flag, event_num, \
                  source, source_url, ingested_at_utc) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11) \
                 ON CONFLICT (game_id, player_id, period, loc_x, loc_y) DO UPDATE SET \
                   team_id = EXCLUDED.team_id, shot_made_flag = EXCLUDED.shot_made_flag, \
                   event_num = EXCLUDED.event_num, source = EXCLUDED.source, \
                   source_url = EXCLUDED.source_url, ingested_at_utc = EXCLUDED.ingested_at_utc \
                 WHERE shot_events.team_id IS DISTINCT FROM EXCLUDED.team_id \
                    OR shot_events.shot_made_flag IS DISTINCT FROM EXCLUDED.shot_made_flag \
                    OR shot_events.event_num IS DISTINCT FROM EXCLUDED.event_num \
                 RETURNING (xmax <> 0) AS updated",
            )
            .bind::<Text, _>(&shot.game_id)
            .bind::<Int4, _>(shot.player_id)
            .bind::<Int4, _>(shot.period)
            .bind::<Int4, _>(shot.loc_x)
            .bind::<Int4, _>(shot.loc_y)
            .bind::<Nullable<Int4>, _>(shot.team_id)
            .bind::<Int4, _>(shot.shot_made_flag)
            .bind::<Nullable<Int4>, _>(shot.event_num)
            .bind::<Text, _>(&shot.source)
            .bind::<Nullable<Text>, _>(&shot.source_url)
            .bind::<Timestamptz, _>(shot.ingested_at_utc);

            let rows: Vec<UpdatedFlag> = query.load(conn)?;
            updated += rows.iter().filter(|r| r.updated).count();
        }
        Ok(updated)
    })
}

pub fn upsert_lineup_stints(conn: &mut PgConnection, stints: &[NewLineupStint]) -> diesel::QueryResult<usize> {
    use diesel::sql_types::Array;

    conn.transaction(|conn| {
        let mut updated = 0;
        for stint in stints {
            let query = sql_query(
                "INSERT INTO lineup_stints \
                 (game_id, team_id, period, lineup_player_ids, seconds_played, \
                  source, source_url, ingested_at_utc) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8) \
                 ON CONFLICT (game_id, team_id, period, lineup_player_ids) DO UPDATE SET \
                   seconds_played = EXCLUDED.seconds_played, source = EXCLUDED.source, \
                   source_url = EXCLUDED.source_url, ingested_at_utc = EXCLUDED.ingested_at_utc \
                 WHERE lineup_stints.seconds_played IS DISTINCT FROM EXCLUDED.seconds_played \
                 RETURNING (xmax <> 0) AS updated",
            )
            .bind::<Text, _>(&stint.game_id)
            .bind::<Int4, _>(stint.team_id)
            .bind::<Int4, _>(stint.period)
            .bind::<Array<Int4>, _>(&stint.lineup_player_ids)
            .bind::<Float8, _>(stint.seconds_played)
            .bind::<Text, _>(&stint.source)
            .bind::<Nullable<Text>, _>(&stint.source_url)
            .bind::<Timestamptz, _>(stint.ingested_at_utc);

            let rows: Vec<UpdatedFlag> = query.load(conn)?;
            updated += rows.iter().filter(|r| r.updated).count();
        }
        Ok(updated)
    })
}

pub fn upsert_starting_lineups(
    conn: &mut PgConnection,
    lineups: &[NewStartingLineup],
) -> diesel::QueryResult<usize> {
    use diesel::sql_types::Array;

    conn.transaction(|conn| {
        let mut updated = 0;
        for lineup in lineups {
            let query = sql_query(
                "INSERT INTO starting_lineups (game_id, team_id, player_ids, source, source_url, ingested_at_utc) \
                 VALUES ($1,$2,$3,$4,$5,$6) \
                 ON CONFLICT (game_id, team_id) DO UPDATE SET \
                   player_ids = EXCLUDED.player_ids, source = EXCLUDED.source, \
                   source_url = EXCLUDED.source_url, ingested_at_utc = EXCLUDED.ingested_at_utc \
                 WHERE starting_lineups.player_ids IS DISTINCT FROM EXCLUDED.player_ids \
                 RETURNING (xmax <> 0) AS updated",
            )
            .bind::<Text, _>(&lineup.game_id)
            .bind::<Int4, _>(lineup.team_id)
            .bind::<Array<Int4>, _>(&lineup.player_ids)
            .bind::<Text, _>(&lineup.source)
            .bind::<Nullable<Text>, _>(&lineup.source_url)
            .bind::<Timestamptz, _>(lineup.ingested_at_utc);

            let rows: Vec<UpdatedFlag> = query.load(conn)?;
            updated += rows.iter().filter(|r| r.updated).count();
        }
        Ok(updated)
    })
}

fn upsert_referee_row(
    conn: &mut PgConnection,
    table: &str,
    row: &NewRefAssignment,
) -> diesel::QueryResult<bool> {
    let sql = format!(
        "INSERT INTO {table} (game_id, referee_name_slug, referee_name, role, source, source_url, ingested_at_utc) \
         VALUES ($1,$2,$3,$4,$5,$6,$7) \
         ON CONFLICT (game_id, referee_name_slug) DO UPDATE SET \
           referee_name = EXCLUDED.referee_name, role = EXCLUDED.role, source = EXCLUDED.source, \
           source_url = EXCLUDED.source_url, ingested_at_utc = EXCLUDED.ingested_at_utc \
         WHERE {table}.referee_name IS DISTINCT FROM EXCLUDED.referee_name \
            OR {table}.role IS DISTINCT FROM EXCLUDED.role \
         RETURNING (xmax <> 0) AS updated"
    );

    let query = sql_query(sql)
        .bind::<Text, _>(&row.game_id)
        .bind::<Text, _>(&row.referee_name_slug)
        .bind::<Text, _>(&row.referee_name)
        .bind::<Text, _>(&row.role)
        .bind::<Text, _>(&row.source)
        .bind::<Nullable<Text>, _>(&row.source_url)
        .bind::<Timestamptz, _>(row.ingested_at_utc);

    let rows: Vec<UpdatedFlag> = query.load(conn)?;
    Ok(rows.first().map(|r| r.updated).unwrap_or(false))
}

pub fn upsert_ref_assignments(
    conn: &mut PgConnection,
    assignments: &[NewRefAssignment],
) -> diesel::QueryResult<usize> {
    conn.transaction(|conn| {
        let mut updated = 0;
        for row in assignments {
            if upsert_referee_row(conn, "ref_assignments", row)? {
                updated += 1;
            }
        }
        Ok(updated)
    })
}

pub fn upsert_ref_alternates(
    conn: &mut PgConnection,
    alternates: &[NewRefAlternate],
) -> diesel::QueryResult<usize> {
    conn.transaction(|conn| {
        let mut updated = 0;
        for row in alternates {
            let as_assignment = NewRefAssignment {
                game_id: row.game_id.clone(),
                referee_name_slug: row.referee_name_slug.clone(),
                referee_name: row.referee_name.clone(),
                role: row.role.clone(),
                source: row.source.clone(),
                source_url: row.source_url.clone(),
                ingested_at_utc: row.ingested_at_utc,
            };
            if upsert_referee_row(conn, "ref_alternates", &as_assignment)? {
                updated += 1;
            }
        }
        Ok(updated)
    })
}

pub fn upsert_outcomes(conn: &mut PgConnection, outcomes: &[NewOutcome]) -> diesel::QueryResult<usize> {
    conn.transaction(|conn| {
        let mut updated = 0;
        for outcome in outcomes {
            let query = sql_query(
                "INSERT INTO outcomes (game_id, home_score, away_score, total_points, home_win, margin, \
                  source, source_url, ingested_at_utc) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9) \
                 ON CONFLICT (game_id) DO UPDATE SET \
                   home_score = EXCLUDED.home_score, away_score = EXCLUDED.away_score, \
                   total_points = EXCLUDED.total_points, home_win = EXCLUDED.home_win, \
                   margin = EXCLUDED.margin, source = EXCLUDED.source, \
                   source_url = EXCLUDED.source_url, ingested_at_utc = EXCLUDED.ingested_at_utc \
                 WHERE outcomes.home_score IS DISTINCT FROM EXCLUDED.home_score \
                    OR outcomes.away_score IS DISTINCT FROM EXCLUDED.away_score \
                    OR outcomes.total_points IS DISTINCT FROM EXCLUDED.total_points \
                    OR outcomes.home_win IS DISTINCT FROM EXCLUDED.home_win \
                    OR outcomes.margin IS DISTINCT FROM EXCLUDED.margin \
                 RETURNING (xmax <> 0) AS updated",
            )
            .bind::<Text, _>(&outcome.game_id)
            .bind::<Int4, _>(outcome.home_score)
            .bind::<Int4, _>(outcome.away_score)
            .bind::<Int4, _>(outcome.total_points)
            .bind::<Bool, _>(outcome.home_win)
            .bind::<Int4, _>(outcome.margin)
            .bind::<Text, _>(&outcome.source)
            .bind::<Nullable<Text>, _>(&outcome.source_url)
            .bind::<Timestamptz, _>(outcome.ingested_at_utc);

            let rows: Vec<UpdatedFlag> = query.load(conn)?;
            updated += rows.iter().filter(|r| r.updated).count();
        }
        Ok(updated)
    })
}

pub fn upsert_game_id_crosswalk(
    conn: &mut PgConnection,
    rows: &[NewGameIdCrosswalk],
) -> diesel::QueryResult<usize> {
    conn.transaction(|conn| {
        let mut updated = 0;
        for row in rows {
            let query = sql_query(
                "INSERT INTO game_id_crosswalk (game_id, bref_game_id, source, source_url, ingested_at_utc) \
                 VALUES ($1,$2,$3,$4,$5) \
                 ON CONFLICT (game_id) DO UPDATE SET \
                   bref_game_id = EXCLUDED.bref_game_id, source = EXCLUDED.source, \
                   source_url = EXCLUDED.source_url, ingested_at_utc = EXCLUDED.ingested_at_utc \
                 WHERE game_id_crosswalk.bref_game_id IS DISTINCT FROM EXCLUDED.bref_game_id \
                 RETURNING (xmax <> 0) AS updated",
            )
            .bind::<Text, _>(&row.game_id)
            .bind::<Nullable<Text>, _>(&row.bref_game_id)
            .bind::<Text, _>(&row.source)
            .bind::<Nullable<Text>, _>(&row.source_url)
            .bind::<Timestamptz, _>(row.ingested_at_utc);

            let rows: Vec<UpdatedFlag> = query.load(conn)?;
            updated += rows.iter().filter(|r| r.updated).count();
        }
        Ok(updated)
    })
}

pub fn upsert_injury_status(
    conn: &mut PgConnection,
    rows: &[NewInjuryStatus],
) -> diesel::QueryResult<usize> {
    conn.transaction(|conn| {
        let mut updated = 0;
        for row in rows {
            let query = sql_query(
                "INSERT INTO injury_status (game_id, player_id, status, description, source, source_url, ingested_at_utc) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7) \
                 ON CONFLICT (game_id, player_id) DO UPDATE SET \
                   status = EXCLUDED.status, description = EXCLUDED.description, source = EXCLUDED.source, \
                   source_url = EXCLUDED.source_url, ingested_at_utc = EXCLUDED.ingested_at_utc \
                 WHERE injury_status.status IS DISTINCT FROM EXCLUDED.status \
                    OR injury_status.description IS DISTINCT FROM EXCLUDED.description \
                 RETURNING (xmax <> 0) AS updated",
            )
            .bind::<Text, _>(&row.game_id)
            .bind::<Int4, _>(row.player_id)
            .bind::<Text, _>(&row.status)
            .bind::<Nullable<Text>, _>(&row.description)
            .bind::<Text, _>(&row.source)
            .bind::<Nullable<Text>, _>(&row.source_url)
            .bind::<Timestamptz, _>(row.ingested_at_utc);

            let rows: Vec<UpdatedFlag> = query.load(conn)?;
            updated += rows.iter().filter(|r| r.updated).count();
        }
        Ok(updated)
    })
}
