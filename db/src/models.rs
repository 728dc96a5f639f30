use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use crate::schema::*;

/// Provenance fields every row in the silver store carries.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub source: String,
    pub source_url: Option<String>,
    pub ingested_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Queryable, Selectable, AsChangeset)]
#[diesel(table_name = games)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewGame {
    pub game_id: String,
    pub season: String,
    pub game_date: NaiveDate,
    pub home_team_id: i32,
    pub away_team_id: i32,
    pub status: String,
    pub source: String,
    pub source_url: Option<String>,
    pub ingested_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Queryable, Selectable, AsChangeset)]
#[diesel(table_name = pbp_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPbpEvent {
    pub game_id: String,
    pub event_idx: i32,
    pub period: i32,
    pub clock: String,
    pub clock_seconds: f64,
    pub seconds_elapsed: f64,
    pub team_id: Option<i32>,
    pub player1_id: Option<i32>,
    pub action_type: Option<i32>,
    pub action_subtype: Option<i32>,
    pub description: Option<String>,
    pub source: String,
    pub source_url: Option<String>,
    pub ingested_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Queryable, Selectable, AsChangeset)]
#[diesel(table_name = shot_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewShotEvent {
    pub game_id: String,
    pub player_id: i32,
    pub period: i32,
    pub loc_x: i32,
    pub loc_y: i32,
    pub team_id: Option<i32>,
    pub shot_made_flag: i32,
    pub event_num: Option<i32>,
    pub source: String,
    pub source_url: Option<String>,
    pub ingested_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Queryable, Selectable, AsChangeset)]
#[diesel(table_name = lineup_stints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewLineupStint {
    pub game_id: String,
    pub team_id: i32,
    pub period: i32,
    pub lineup_player_ids: Vec<i32>,
    pub seconds_played: f64,
    pub source: String,
    pub source_url: Option<String>,
    pub ingested_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Queryable, Selectable, AsChangeset)]
#[diesel(table_name = starting_lineups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewStartingLineup {
    pub game_id: String,
    pub team_id: i32,
    pub player_ids: Vec<i32>,
    pub source: String,
    pub source_url: Option<String>,
    pub ingested_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Queryable, Selectable, AsChangeset)]
#[diesel(table_name = ref_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRefAssignment {
    pub game_id: String,
    pub referee_name_slug: String,
    pub referee_name: String,
    pub role: String,
    pub source: String,
    pub source_url: Option<String>,
    pub ingested_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Queryable, Selectable, AsChangeset)]
#[diesel(table_name = ref_alternates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRefAlternate {
    pub game_id: String,
    pub referee_name_slug: String,
    pub referee_name: String,
    pub role: String,
    pub source: String,
    pub source_url: Option<String>,
    pub ingested_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Queryable, Selectable, AsChangeset)]
#[diesel(table_name = outcomes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewOutcome {
    pub game_id: String,
    pub home_score: i32,
    pub away_score: i32,
    pub total_points: i32,
    pub home_win: bool,
    pub margin: i32,
    pub source: String,
    pub source_url: Option<String>,
    pub ingested_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Queryable, Selectable, AsChangeset)]
#[diesel(table_name = game_id_crosswalk)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewGameIdCrosswalk {
    pub game_id: String,
    pub bref_game_id: Option<String>,
    pub source: String,
    pub source_url: Option<String>,
    pub ingested_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Queryable, Selectable, AsChangeset)]
#[diesel(table_name = injury_status)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewInjuryStatus {
    pub game_id: String,
    pub player_id: i32,
    pub status: String,
    pub description: Option<String>,
    pub source: String,
    pub source_url: Option<String>,
    pub ingested_at_utc: DateTime<Utc>,
}
