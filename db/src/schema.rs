// Table definitions for the silver relational store. Every table carries
// `source`, `source_url`, `ingested_at_utc` provenance columns.

diesel::table! {
    games (game_id) {
        game_id -> Text,
        season -> Text,
        game_date -> Date,
        home_team_id -> Int4,
        away_team_id -> Int4,
        status -> Text,
        source -> Text,
        source_url -> Nullable<Text>,
        ingested_at_utc -> Timestamptz,
    }
}

diesel::table! {
    pbp_events (game_id, event_idx) {
        game_id -> Text,
        event_idx -> Int4,
        period -> Int4,
        clock -> Text,
        clock_seconds -> Float8,
        seconds_elapsed -> Float8,
        team_id -> Nullable<Int4>,
        player1_id -> Nullable<Int4>,
        action_type -> Nullable<Int4>,
        action_subtype -> Nullable<Int4>,
        description -> Nullable<Text>,
        source -> Text,
        source_url -> Nullable<Text>,
        ingested_at_utc -> Timestamptz,
    }
}

diesel::table! {
    shot_events (game_id, player_id, period, loc_x, loc_y) {
        game_id -> Text,
        player_id -> Int4,
        period -> Int4,
        loc_x -> Int4,
        loc_y -> Int4,
        team_id -> Nullable<Int4>,
        shot_made_flag -> Int4,
        event_num -> Nullable<Int4>,
        source -> Text,
        source_url -> Nullable<Text>,
        ingested_at_utc -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::{Array, Int4};

    lineup_stints (game_id, team_id, period, lineup_player_ids) {
        game_id -> Text,
        team_id -> Int4,
        period -> Int4,
        lineup_player_ids -> Array<Int4>,
        seconds_played -> Float8,
        source -> Text,
        source_url -> Nullable<Text>,
        ingested_at_utc -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::{Array, Int4};

    starting_lineups (game_id, team_id) {
        game_id -> Text,
        team_id -> Int4,
        player_ids -> Array<Int4>,
        source -> Text,
        source_url -> Nullable<Text>,
        ingested_at_utc -> Timestamptz,
    }
}

diesel::table! {
    ref_assignments (game_id, referee_name_slug) {
        game_id -> Text,
        referee_name_slug -> Text,
        referee_name -> Text,
        role -> Text,
        source -> Text,
        source_url -> Nullable<Text>,
        ingested_at_utc -> Timestamptz,
    }
}

diesel::table! {
    ref_alternates (game_id, referee_name_slug) {
        game_id -> Text,
        referee_name_slug -> Text,
        referee_name -> Text,
        role -> Text,
        source -> Text,
        source_url -> Nullable<Text>,
        ingested_at_utc -> Timestamptz,
    }
}

diesel::table! {
    outcomes (game_id) {
        game_id -> Text,
        home_score -> Int4,
        away_score -> Int4,
        total_points -> Int4,
        home_win -> Bool,
        margin -> Int4,
        source -> Text,
        source_url -> Nullable<Text>,
        ingested_at_utc -> Timestamptz,
    }
}

diesel::table! {
    game_id_crosswalk (game_id) {
        game_id -> Text,
        bref_game_id -> Nullable<Text>,
        source -> Text,
        source_url -> Nullable<Text>,
        ingested_at_utc -> Timestamptz,
    }
}

diesel::table! {
    injury_status (game_id, player_id) {
        game_id -> Text,
        player_id -> Int4,
        status -> Text,
        description -> Nullable<Text>,
        source -> Text,
        source_url -> Nullable<Text>,
        ingested_at_utc -> Timestamptz,
    }
}
