use chrono::{DateTime, Utc};

pub const FS_PER_SECOND: i64 = 1_000_000_000_000_000;

/// Split a wall clock time into whole unix seconds and the sub-second
/// remainder in femtoseconds.
pub fn split_timestamp(ts: &DateTime<Utc>) -> (i64, i64) {
    let secs = ts.timestamp();
    let fs = i64::from(ts.timestamp_subsec_nanos()) * 1_000_000;
    (secs, fs)
}

pub fn prefix_multiplier(prefix: char) -> Option<f64> {
    match prefix {
        'p' => Some(1e-12),
        'n' => Some(1e-9),
        'u' | 'µ' => Some(1e-6),
        'm' => Some(1e-3),
        'k' | 'K' => Some(1e3),
        'M' => Some(1e6),
        'G' => Some(1e9),
        _ => None,
    }
}

/// Parse a number with an optional SI prefix and unit, e.g. `"(2.5MS/s)"`,
/// `"500us"` or `"4K"`.
pub fn parse_si(s: &str, unit: &str) -> Option<f64> {
    let s = s.trim().trim_start_matches('(').trim_end_matches(')');
    let s = s.strip_suffix(unit).unwrap_or(s);
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(s.len());
    let (number, prefix) = s.split_at(split);
    let value = number.parse::<f64>().ok()?;
    let mut rest = prefix.chars();
    match (rest.next(), rest.next()) {
        (None, _) => Some(value),
        (Some(p), None) => prefix_multiplier(p).map(|m| value * m),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn split_subsecond() {
        let ts = Utc
            .timestamp_opt(1_700_000_000, 250_000_000)
            .single()
            .expect("valid timestamp");
        assert_eq!(split_timestamp(&ts), (1_700_000_000, FS_PER_SECOND / 4));
    }

    #[test]
    fn parse_rates() {
        assert_eq!(parse_si("(2.5MS/s)", "S/s"), Some(2.5e6));
        assert_eq!(parse_si("50kS/s", "S/s"), Some(50e3));
        assert_eq!(parse_si("4K", ""), Some(4000.0));
        assert_eq!(parse_si("12", ""), Some(12.0));
        assert_eq!(parse_si("fast", "S/s"), None);
        assert_eq!(parse_si("2xyS/s", "S/s"), None);
    }
}
