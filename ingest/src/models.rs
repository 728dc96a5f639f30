use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid game_id '{0}': must match ^00[1-9]\\d{{6}}$")]
    InvalidGameId(String),
    #[error("home_team_id and away_team_id are both {0}: a game cannot play itself")]
    SameTeamOnBothSides(i64),
    #[error("unrecognized game status '{0}' for game {1}")]
    UnknownStatus(String, String),
    #[error("shot_made_flag must be 0 or 1, got {0} for game {1}")]
    InvalidShotMadeFlag(i32, String),
    #[error("lineup for game {0} team {1} has {2} players, expected exactly 5")]
    WrongLineupSize(String, i64, usize),
    #[error("missing required field '{field}' for game {game_id}")]
    MissingField { field: &'static str, game_id: String },
    #[error(transparent)]
    UnknownTricode(#[from] crate::crosswalk::UnknownTricodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Scheduled,
    Live,
    Final,
    Postponed,
    Cancelled,
    Suspended,
    Rescheduled,
}

impl GameStatus {
    /// Normalizes case-insensitive upstream synonyms to the canonical set.
    /// Defaults to `Scheduled` when the input is empty.
    pub fn normalize(raw: &str) -> Result<Self, ValidationError> {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "" => Ok(GameStatus::Scheduled),
            "SCHEDULED" | "PRE GAME" | "NS" => Ok(GameStatus::Scheduled),
            "LIVE" | "IN PROGRESS" | "1" | "2" => Ok(GameStatus::Live),
            "FINAL" | "FT" | "3" | "CLOSED" => Ok(GameStatus::Final),
            "POSTPONED" | "PPD" => Ok(GameStatus::Postponed),
            "CANCELLED" | "CANCELED" => Ok(GameStatus::Cancelled),
            "SUSPENDED" => Ok(GameStatus::Suspended),
            "RESCHEDULED" => Ok(GameStatus::Rescheduled),
            other => Err(ValidationError::UnknownStatus(other.to_string(), String::new())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Scheduled => "SCHEDULED",
            GameStatus::Live => "LIVE",
            GameStatus::Final => "FINAL",
            GameStatus::Postponed => "POSTPONED",
            GameStatus::Cancelled => "CANCELLED",
            GameStatus::Suspended => "SUSPENDED",
            GameStatus::Rescheduled => "RESCHEDULED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub game_id: String,
    pub season: String,
    pub game_date: NaiveDate,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub status: GameStatus,
}

impl Game {
    pub fn new(
        game_id: String,
        season: String,
        game_date: NaiveDate,
        home_team_id: i64,
        away_team_id: i64,
        status: GameStatus,
    ) -> Result<Self, ValidationError> {
        if !crate::season::is_valid_game_id(&game_id) {
            return Err(ValidationError::InvalidGameId(game_id));
        }
        if home_team_id == away_team_id {
            return Err(ValidationError::SameTeamOnBothSides(home_team_id));
        }
        Ok(Self {
            game_id,
            season,
            game_date,
            home_team_id,
            away_team_id,
            status,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PbpEvent {
    pub game_id: String,
    pub event_idx: i32,
    pub period: i32,
    pub clock: String,
    pub clock_seconds: f64,
    pub seconds_elapsed: f64,
    pub team_id: Option<i64>,
    pub player1_id: Option<i64>,
    pub action_type: Option<i32>,
    pub action_subtype: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShotEvent {
    pub game_id: String,
    pub player_id: i64,
    pub period: i32,
    pub loc_x: i32,
    pub loc_y: i32,
    pub team_id: Option<i64>,
    pub shot_made_flag: i32,
    pub event_num: Option<i32>,
}

impl ShotEvent {
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.shot_made_flag != 0 && self.shot_made_flag != 1 {
            return Err(ValidationError::InvalidShotMadeFlag(
                self.shot_made_flag,
                self.game_id,
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineupStint {
    pub game_id: String,
    pub team_id: i64,
    pub period: i32,
    pub lineup_player_ids: Vec<i64>,
    pub seconds_played: f64,
}

impl LineupStint {
    pub fn new(
        game_id: String,
        team_id: i64,
        period: i32,
        mut lineup_player_ids: Vec<i64>,
        seconds_played: f64,
    ) -> Result<Self, ValidationError> {
        lineup_player_ids.sort_unstable();
        if lineup_player_ids.len() != 5 {
            return Err(ValidationError::WrongLineupSize(
                game_id,
                team_id,
                lineup_player_ids.len(),
            ));
        }
        Ok(Self {
            game_id,
            team_id,
            period,
            lineup_player_ids,
            seconds_played,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartingLineup {
    pub game_id: String,
    pub team_id: i64,
    pub player_ids: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefRole {
    CrewChief,
    Referee,
    Umpire,
    Official,
}

impl RefRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefRole::CrewChief => "CREW_CHIEF",
            RefRole::Referee => "REFEREE",
            RefRole::Umpire => "UMPIRE",
            RefRole::Official => "OFFICIAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefAssignment {
    pub game_id: String,
    pub referee_name_slug: String,
    pub referee_name: String,
    pub role: RefRole,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefAlternate {
    pub game_id: String,
    pub referee_name_slug: String,
    pub referee_name: String,
    pub role: RefRole,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub game_id: String,
    pub home_score: i32,
    pub away_score: i32,
    pub total_points: i32,
    pub home_win: bool,
    pub margin: i32,
}

impl Outcome {
    pub fn new(game_id: String, home_score: i32, away_score: i32) -> Self {
        Self {
            game_id,
            home_score,
            away_score,
            total_points: home_score + away_score,
            home_win: home_score > away_score,
            margin: home_score - away_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameIdCrosswalk {
    pub game_id: String,
    pub bref_game_id: Option<String>,
}

pub fn slugify_referee_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_rejects_same_team_both_sides() {
        let err = Game::new(
            "0022300001".to_string(),
            "2023-24".to_string(),
            NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
            1610612747,
            1610612747,
            GameStatus::Final,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::SameTeamOnBothSides(_)));
    }

    #[test]
    fn lineup_stint_sorts_and_validates_size() {
        let stint = LineupStint::new(
            "0022300001".to_string(),
            1610612747,
            1,
            vec![5, 3, 1, 4, 2],
            120.0,
        )
        .unwrap();
        assert_eq!(stint.lineup_player_ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn lineup_stint_rejects_wrong_size() {
        let err = LineupStint::new("0022300001".to_string(), 1, 1, vec![1, 2, 3], 10.0).unwrap_err();
        assert!(matches!(err, ValidationError::WrongLineupSize(_, _, 3)));
    }

    #[test]
    fn status_normalizes_synonyms_case_insensitively() {
        assert_eq!(GameStatus::normalize("final").unwrap(), GameStatus::Final);
        assert_eq!(GameStatus::normalize("").unwrap(), GameStatus::Scheduled);
    }

    #[test]
    fn outcome_derives_totals_and_winner() {
        let outcome = Outcome::new("0022300001".to_string(), 110, 102);
        assert_eq!(outcome.total_points, 212);
        assert!(outcome.home_win);
        assert_eq!(outcome.margin, 8);
    }

    #[test]
    fn slugify_collapses_punctuation_and_case() {
        assert_eq!(slugify_referee_name("Scott Foster Jr."), "scott-foster-jr");
    }
}
