use hashbrown::HashMap;
use once_cell::sync::Lazy;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Unknown tricode '{tricode}' for game {game_id}")]
pub struct UnknownTricodeError {
    pub tricode: String,
    pub game_id: String,
}

const CANONICAL_TEAMS: &[(&str, i64)] = &[
    ("ATL", 1610612737),
    ("BOS", 1610612738),
    ("BRK", 1610612751),
    ("CHA", 1610612766),
    ("CHI", 1610612741),
    ("CLE", 1610612739),
    ("DAL", 1610612742),
    ("DEN", 1610612743),
    ("DET", 1610612765),
    ("GSW", 1610612744),
    ("HOU", 1610612745),
    ("IND", 1610612754),
    ("LAC", 1610612746),
    ("LAL", 1610612747),
    ("MEM", 1610612763),
    ("MIA", 1610612748),
    ("MIL", 1610612749),
    ("MIN", 1610612750),
    ("NOP", 1610612740),
    ("NYK", 1610612752),
    ("OKC", 1610612760),
    ("ORL", 1610612753),
    ("PHI", 1610612755),
    ("PHX", 1610612756),
    ("POR", 1610612757),
    ("SAC", 1610612758),
    ("SAS", 1610612759),
    ("TOR", 1610612761),
    ("UTA", 1610612762),
    ("WAS", 1610612764),
];

/// Historical/variant tricodes that resolve to a canonical one.
const TEAM_ALIASES: &[(&str, &str)] = &[
    ("BKN", "BRK"),
    ("PHO", "PHX"),
    ("NOH", "NOP"),
    ("CHO", "CHA"),
];

static TEAM_INDEX: Lazy<HashMap<&'static str, i64>> = Lazy::new(|| {
    let mut index: HashMap<&'static str, i64> = CANONICAL_TEAMS.iter().copied().collect();
    for (alias, canonical) in TEAM_ALIASES {
        if let Some(id) = index.get(canonical).copied() {
            index.insert(alias, id);
        }
    }
    index
});

/// Resolves a team tricode to its team ID, normalizing (trim, upper) the
/// input first. `game_id` is embedded in the error message so a quarantine
/// or log line can point at the offending game.
pub fn resolve_team_id(tricode: &str, game_id: &str) -> Result<i64, UnknownTricodeError> {
    let normalized = tricode.trim().to_uppercase();
    TEAM_INDEX
        .get(normalized.as_str())
        .copied()
        .ok_or_else(|| UnknownTricodeError {
            tricode: tricode.to_string(),
            game_id: game_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_canonical_tricode() {
        assert_eq!(resolve_team_id("LAL", "0022300001").unwrap(), 1610612747);
    }

    #[test]
    fn resolves_alias_to_canonical_id() {
        assert_eq!(
            resolve_team_id("BKN", "0022300001").unwrap(),
            resolve_team_id("BRK", "0022300001").unwrap()
        );
    }

    #[test]
    fn is_case_and_whitespace_insensitive() {
        assert_eq!(resolve_team_id(" lal ", "x").unwrap(), 1610612747);
    }

    #[test]
    fn unknown_tricode_error_contains_tricode_and_game_id() {
        let err = resolve_team_id("XYZ", "0022300123").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("XYZ"));
        assert!(message.contains("0022300123"));
    }
}
