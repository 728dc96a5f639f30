/// Parses `M:SS[.fff]` or `PTxMy[.fff]S` into seconds remaining. Returns
/// `None` for anything else rather than erroring — callers treat a bad
/// clock as a data-coercion skip, not a hard failure.
pub fn parse_clock_to_seconds(time_str: &str) -> Option<f64> {
    let time_clean = time_str.trim();

    if let Some(seconds) = parse_iso_duration(time_clean) {
        return Some(seconds);
    }
    parse_mmss(time_clean)
}

fn parse_iso_duration(s: &str) -> Option<f64> {
    let rest = s.strip_prefix("PT")?;
    let rest = rest.strip_suffix('S')?;
    let (minutes_str, seconds_str) = rest.split_once('M')?;

    if minutes_str.is_empty() || !minutes_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !is_valid_seconds_literal(seconds_str) {
        return None;
    }

    let minutes: f64 = minutes_str.parse().ok()?;
    let seconds: f64 = seconds_str.parse().ok()?;
    Some(minutes * 60.0 + seconds)
}

fn parse_mmss(s: &str) -> Option<f64> {
    let (minutes_str, seconds_part) = s.split_once(':')?;
    if minutes_str.is_empty()
        || minutes_str.len() > 2
        || !minutes_str.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let (seconds_str, fractional_str) = match seconds_part.split_once('.') {
        Some((sec, frac)) => (sec, Some(frac)),
        None => (seconds_part, None),
    };

    if seconds_str.len() != 2 || !seconds_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let seconds_value: u32 = seconds_str.parse().ok()?;
    if seconds_value > 59 {
        return None;
    }

    let fractional = match fractional_str {
        Some(digits) if !digits.is_empty() && digits.len() <= 3 && digits.bytes().all(|b| b.is_ascii_digit()) => {
            let value: f64 = digits.parse().ok()?;
            value / 10f64.powi(digits.len() as i32)
        }
        Some(_) => return None,
        None => 0.0,
    };

    let minutes: f64 = minutes_str.parse().ok()?;
    Some(minutes * 60.0 + seconds_value as f64 + fractional)
}

fn is_valid_seconds_literal(s: &str) -> bool {
    match s.split_once('.') {
        Some((whole, frac)) => {
            !whole.is_empty()
                && whole.bytes().all(|b| b.is_ascii_digit())
                && !frac.is_empty()
                && frac.len() <= 3
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()),
    }
}

/// 720s for periods 1-4 (regulation), 300s for overtime periods.
pub fn period_length(period: i32) -> f64 {
    if period <= 4 {
        12.0 * 60.0
    } else {
        5.0 * 60.0
    }
}

/// `seconds_elapsed = period_length - clock_seconds`, flipping sign once if
/// negative as a data-consistency safety valve.
pub fn seconds_elapsed(clock_seconds: f64, period: i32) -> f64 {
    let elapsed = period_length(period) - clock_seconds;
    if elapsed < 0.0 {
        elapsed.abs()
    } else {
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mmss_with_milliseconds() {
        assert_eq!(parse_clock_to_seconds("11:45.500"), Some(705.5));
    }

    #[test]
    fn parses_iso_duration() {
        assert_eq!(parse_clock_to_seconds("PT11M45.500S"), Some(705.5));
    }

    #[test]
    fn parses_single_digit_minutes() {
        assert_eq!(parse_clock_to_seconds("5:30"), Some(330.0));
    }

    #[test]
    fn parses_iso_duration_without_fraction() {
        assert_eq!(parse_clock_to_seconds("PT11M45S"), Some(705.0));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_clock_to_seconds("not a clock"), None);
        assert_eq!(parse_clock_to_seconds("12:60"), None);
        assert_eq!(parse_clock_to_seconds("PT11M"), None);
    }

    #[test]
    fn period_length_matches_regulation_and_overtime() {
        assert_eq!(period_length(1), 720.0);
        assert_eq!(period_length(4), 720.0);
        assert_eq!(period_length(5), 300.0);
    }

    #[test]
    fn elapsed_plus_remaining_equals_period_length() {
        let clock_seconds = parse_clock_to_seconds("10:00").unwrap();
        let elapsed = seconds_elapsed(clock_seconds, 1);
        assert_eq!(elapsed + clock_seconds, period_length(1));
    }

    #[test]
    fn negative_elapsed_flips_sign() {
        // clock_seconds > period_length shouldn't happen, but if it does we
        // must not return a negative seconds_elapsed.
        let elapsed = seconds_elapsed(800.0, 1);
        assert_eq!(elapsed, 80.0);
    }
}
