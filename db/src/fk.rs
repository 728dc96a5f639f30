use diesel::prelude::*;
use hashbrown::HashSet;
use log::warn;

use crate::schema::games::dsl as games_dsl;

/// Partitions `candidate_game_ids` into those that exist in `games` and
/// those that don't. Logs the full set of missing keys for the rejected
/// side; callers proceed with only the valid subset.
pub fn partition_by_existing_game_ids<'a, T, F>(
    conn: &mut PgConnection,
    rows: Vec<T>,
    game_id_of: F,
) -> QueryResult<(Vec<T>, Vec<T>)>
where
    F: Fn(&T) -> &str,
{
    let candidate_ids: HashSet<String> = rows.iter().map(|r| game_id_of(r).to_string()).collect();
    if candidate_ids.is_empty() {
        return Ok((rows, Vec::new()));
    }

    let candidate_vec: Vec<String> = candidate_ids.iter().cloned().collect();
    let existing: HashSet<String> = games_dsl::games
        .filter(games_dsl::game_id.eq_any(&candidate_vec))
        .select(games_dsl::game_id)
        .load::<String>(conn)?
        .into_iter()
        .collect();

    let missing: Vec<&String> = candidate_ids.difference(&existing).collect();
    if !missing.is_empty() {
        warn!(
            "FK check rejected rows referencing missing games.game_id values: {:?}",
            missing
        );
    }

    let (valid, rejected): (Vec<T>, Vec<T>) = rows
        .into_iter()
        .partition(|r| existing.contains(game_id_of(r)));

    Ok((valid, rejected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ids_reported_without_duplicates() {
        let mut existing = HashSet::new();
        existing.insert("0022300001".to_string());

        let candidates: HashSet<String> = ["0022300001", "0022300002", "0022300002"]
            .into_iter()
            .map(str::to_string)
            .collect();

        let missing: Vec<_> = candidates.difference(&existing).collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0], "0022300002");
    }
}
