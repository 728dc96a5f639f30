use chrono::NaiveDate;

/// Validates the full 10-character game ID shape: `^00[1-9]\d{6}$` — `002`
/// regular season, `001` preseason, `003` playoffs, `004` play-in.
pub fn is_valid_game_id(game_id: &str) -> bool {
    let bytes = game_id.as_bytes();
    bytes.len() == 10
        && bytes[0] == b'0'
        && bytes[1] == b'0'
        && bytes[2].is_ascii_digit()
        && bytes[2] != b'0'
        && bytes[3..].iter().all(u8::is_ascii_digit)
}

/// Derives season from the two-digit year at positions 3-4 of a game ID,
/// e.g. `"0022300123"` -> `"2023-24"`. Returns `None` for a malformed ID.
pub fn derive_season_from_game_id(game_id: &str) -> Option<String> {
    if !is_valid_game_id(game_id) {
        return None;
    }
    let yy: u32 = game_id[3..5].parse().ok()?;
    let start_year = 2000 + yy;
    let end_yy = (yy + 1) % 100;
    Some(format!("{start_year}-{end_yy:02}"))
}

/// Derives season from a game date using NBA season boundaries: month >= 10
/// starts a new season in that calendar year, otherwise the season started
/// the previous calendar year.
pub fn derive_season_from_date(game_date: NaiveDate) -> String {
    use chrono::Datelike;
    let start = if game_date.month() >= 10 {
        game_date.year()
    } else {
        game_date.year() - 1
    };
    format!("{start}-{:02}", (start + 1) % 100)
}

/// Validates `"YYYY-YY"` shape, used to accept an explicit season value
/// before falling back to derivation.
pub fn is_valid_season_format(season: &str) -> bool {
    let bytes = season.as_bytes();
    bytes.len() == 7
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

/// Precedence: explicit valid season, then game-ID derivation, then date
/// derivation, then the literal `"UNKNOWN"`.
pub fn derive_season(
    explicit: Option<&str>,
    game_id: Option<&str>,
    game_date: Option<NaiveDate>,
) -> String {
    if let Some(season) = explicit {
        if is_valid_season_format(season) {
            return season.to_string();
        }
    }
    if let Some(game_id) = game_id {
        if let Some(season) = derive_season_from_game_id(game_id) {
            return season;
        }
    }
    if let Some(date) = game_date {
        return derive_season_from_date(date);
    }
    "UNKNOWN".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_from_game_id() {
        assert_eq!(
            derive_season_from_game_id("0022300123"),
            Some("2023-24".to_string())
        );
    }

    #[test]
    fn derives_from_date_before_october() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(derive_season_from_date(date), "2023-24");
    }

    #[test]
    fn derives_from_date_october_or_later() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 15).unwrap();
        assert_eq!(derive_season_from_date(date), "2024-25");
    }

    #[test]
    fn rejects_malformed_game_id() {
        assert_eq!(derive_season_from_game_id("abc"), None);
        assert_eq!(derive_season_from_game_id("0002300123"), None);
    }

    #[test]
    fn falls_back_to_unknown() {
        assert_eq!(derive_season(None, None, None), "UNKNOWN");
    }

    #[test]
    fn prefers_explicit_valid_season() {
        assert_eq!(
            derive_season(Some("2022-23"), Some("0022300123"), None),
            "2022-23"
        );
    }
}
