use serde_json::{Map, Value};

/// Recursively walks a raw payload, coercing numeric-looking strings to
/// numbers while protecting clock strings and ID fields that must keep
/// their leading zeros. This is the single correctness-critical boundary
/// between "whatever the stats API sent" and anything downstream that
/// assumes consistent types.
pub fn preprocess(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(preprocess).collect()),
        Value::Object(map) => Value::Object(preprocess_object(map)),
        other => coerce_scalar(other),
    }
}

fn preprocess_object(map: &Map<String, Value>) -> Map<String, Value> {
    let mut result = Map::with_capacity(map.len());
    for (key, value) in map {
        if is_protected_id_field(key) && is_protected_digit_string(value) {
            result.insert(key.clone(), value.clone());
        } else {
            result.insert(key.clone(), preprocess(value));
        }
    }
    result
}

fn is_protected_id_field(key: &str) -> bool {
    matches!(key.to_uppercase().as_str(), "GAME_ID" | "GAMEID" | "ID")
}

fn is_protected_digit_string(value: &Value) -> bool {
    match value.as_str() {
        Some(s) => s.len() >= 8 && s.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

fn coerce_scalar(value: &Value) -> Value {
    let Some(s) = value.as_str() else {
        return value.clone();
    };
    let trimmed = s.trim();

    if looks_like_clock(trimmed) {
        return Value::String(s.to_string());
    }

    if let Some(number) = parse_pure_numeric(trimmed) {
        return number;
    }

    value.clone()
}

fn looks_like_clock(s: &str) -> bool {
    crate::clock::parse_clock_to_seconds(s).is_some() && has_clock_shape(s)
}

/// `parse_clock_to_seconds` also (correctly) rejects plain numbers, but a
/// bare integer like `"45"` isn't clock-shaped even though nothing above
/// would mis-parse it; this keeps the "is it clock-shaped" check
/// independent of the numeric-string check below.
fn has_clock_shape(s: &str) -> bool {
    s.contains(':') || s.starts_with("PT")
}

fn parse_pure_numeric(s: &str) -> Option<Value> {
    if s.is_empty() {
        return None;
    }

    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned.is_empty() {
        return None;
    }
    let digits_and_dot = unsigned.replacen('.', "", 1);
    if digits_and_dot.is_empty() || !digits_and_dot.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Reject inputs with more than one '.' (replacen above only strips the first).
    if unsigned.matches('.').count() > 1 {
        return None;
    }

    let as_float: f64 = s.parse().ok()?;
    if as_float.fract() == 0.0 && as_float.abs() < i64::MAX as f64 {
        Some(Value::from(as_float as i64))
    } else {
        Some(Value::from(as_float))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_numeric_strings_but_preserves_clock_and_game_id() {
        let input = json!({
            "PCTIMESTRING": "24:49",
            "VALUE": "123",
            "GAME_ID": "0022301234",
        });
        let expected = json!({
            "PCTIMESTRING": "24:49",
            "VALUE": 123,
            "GAME_ID": "0022301234",
        });
        assert_eq!(preprocess(&input), expected);
    }

    #[test]
    fn coerces_fractional_numeric_strings() {
        let input = json!({"SCORE_MARGIN": "-3.5"});
        assert_eq!(preprocess(&input)["SCORE_MARGIN"], json!(-3.5));
    }

    #[test]
    fn short_digit_strings_in_id_fields_are_still_coerced() {
        // Only digit strings of length >= 8 are protected; a short "ID" like
        // a period number should still coerce normally.
        let input = json!({"ID": "7"});
        assert_eq!(preprocess(&input)["ID"], json!(7));
    }

    #[test]
    fn preprocess_is_idempotent() {
        let input = json!({
            "PCTIMESTRING": "24:49",
            "VALUE": "123",
            "GAME_ID": "0022301234",
            "ISO_CLOCK": "PT11M45.5S",
        });
        let once = preprocess(&input);
        let twice = preprocess(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn recurses_into_arrays_and_nested_objects() {
        let input = json!({"rows": [["1", "24:49"], ["2", "PT1M2S"]]});
        let result = preprocess(&input);
        assert_eq!(result["rows"][0][0], json!(1));
        assert_eq!(result["rows"][0][1], json!("24:49"));
    }
}
