use serde_json::{Map, Value};
use thiserror::Error;

use crate::preprocess::preprocess;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("missing result set '{0}'")]
    MissingResultSet(&'static str),
    #[error("could not resolve game_id from any of: summary.parameters.GameID, boxscore.parameters.GameID, GameSummary.GAME_ID")]
    MissingGameId,
}

/// A single row of a stats-API result set, re-keyed by header name and
/// preprocessed. Fields absent or empty become `null`.
pub type Row = Map<String, Value>;

/// Looks up a `resultSets` entry by name and zips its `headers` with each
/// `rowSet` row into neutral record maps. Rows shorter than `headers` are
/// skipped. Preprocessing is applied to the raw payload once up front and,
/// defensively, to each emitted row again.
pub fn extract_result_set(payload: &Value, name: &'static str) -> Result<Vec<Row>, ExtractError> {
    let preprocessed = preprocess(payload);

    let result_sets = preprocessed
        .get("resultSets")
        .or_else(|| preprocessed.get("resultSet"))
        .and_then(Value::as_array);

    let Some(result_sets) = result_sets else {
        return Err(ExtractError::MissingResultSet(name));
    };

    let Some(set) = result_sets
        .iter()
        .find(|s| s.get("name").and_then(Value::as_str) == Some(name))
    else {
        return Err(ExtractError::MissingResultSet(name));
    };

    let headers: Vec<String> = set
        .get("headers")
        .and_then(Value::as_array)
        .map(|h| h.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let rows = set
        .get("rowSet")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row.as_array())
                .filter(|row| row.len() >= headers.len())
                .map(|row| {
                    let mut map = Map::with_capacity(headers.len());
                    for (header, value) in headers.iter().zip(row.iter()) {
                        let value = if matches!(value, Value::Null) || value == "" {
                            Value::Null
                        } else {
                            preprocess(value)
                        };
                        map.insert(header.clone(), value);
                    }
                    map
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(rows)
}

/// `game_id` resolution priority: explicit summary params, then boxscore
/// params, then the `GameSummary` result-set row.
pub fn resolve_game_id(
    summary_payload: Option<&Value>,
    boxscore_payload: Option<&Value>,
) -> Result<String, ExtractError> {
    if let Some(id) = summary_payload.and_then(|p| p.pointer("/parameters/GameID")).and_then(Value::as_str) {
        return Ok(id.to_string());
    }
    if let Some(id) = boxscore_payload.and_then(|p| p.pointer("/parameters/GameID")).and_then(Value::as_str) {
        return Ok(id.to_string());
    }
    if let Some(payload) = summary_payload {
        if let Ok(rows) = extract_result_set(payload, "GameSummary") {
            if let Some(id) = rows.first().and_then(|r| r.get("GAME_ID")).and_then(Value::as_str) {
                return Ok(id.to_string());
            }
        }
    }
    Err(ExtractError::MissingGameId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_rows_keyed_by_header_name() {
        let payload = json!({
            "resultSets": [{
                "name": "GameSummary",
                "headers": ["GAME_ID", "GAME_STATUS_TEXT"],
                "rowSet": [["0022300001", "Final"]],
            }]
        });
        let rows = extract_result_set(&payload, "GameSummary").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["GAME_ID"], json!("0022300001"));
    }

    #[test]
    fn skips_rows_shorter_than_headers() {
        let payload = json!({
            "resultSets": [{
                "name": "PlayByPlay",
                "headers": ["GAME_ID", "EVENTNUM", "PERIOD"],
                "rowSet": [["0022300001", "1"]],
            }]
        });
        let rows = extract_result_set(&payload, "PlayByPlay").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn missing_result_set_is_an_error() {
        let payload = json!({"resultSets": []});
        assert!(extract_result_set(&payload, "GameSummary").is_err());
    }

    #[test]
    fn resolves_game_id_from_summary_parameters_first() {
        let summary = json!({"parameters": {"GameID": "0022300001"}});
        assert_eq!(resolve_game_id(Some(&summary), None).unwrap(), "0022300001");
    }

    #[test]
    fn falls_back_to_game_summary_result_set() {
        let summary = json!({
            "resultSets": [{
                "name": "GameSummary",
                "headers": ["GAME_ID"],
                "rowSet": [["0022300001"]],
            }]
        });
        assert_eq!(resolve_game_id(Some(&summary), None).unwrap(), "0022300001");
    }
}
