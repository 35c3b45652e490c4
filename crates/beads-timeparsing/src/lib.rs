//! Duration and timestamp parsing shared across the beads workspace:
//! advice-hook timeout validation, land-gate step timing, and CLI
//! `--timeout`/`--until` flags all go through the same two entry points.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("empty time expression")]
    Empty,
    #[error("invalid duration expression '{0}'")]
    InvalidDuration(String),
    #[error("invalid date expression '{0}'")]
    InvalidDate(String),
}

/// Parses a duration expression like `30s`, `5m`, `2h`, `1d`, `2w`.
///
/// The numeric part must be a non-negative integer; the unit is a single
/// trailing letter (`s`/`m`/`h`/`d`/`w`).
pub fn parse_duration(expr: &str) -> Result<chrono::Duration, TimeParseError> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(TimeParseError::Empty);
    }

    let (digits, unit) = expr.split_at(expr.len() - 1);
    let amount: i64 = digits
        .parse()
        .map_err(|_| TimeParseError::InvalidDuration(expr.to_string()))?;

    let duration = match unit {
        "s" => chrono::Duration::seconds(amount),
        "m" => chrono::Duration::minutes(amount),
        "h" => chrono::Duration::hours(amount),
        "d" => chrono::Duration::days(amount),
        "w" => chrono::Duration::weeks(amount),
        _ => return Err(TimeParseError::InvalidDuration(expr.to_string())),
    };
    Ok(duration)
}

/// Parses an absolute timestamp: an RFC3339 datetime or a bare `YYYY-MM-DD`
/// date (interpreted as midnight UTC).
pub fn parse_timestamp(expr: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(TimeParseError::Empty);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(expr) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0).ok_or_else(|| TimeParseError::InvalidDate(expr.to_string()))?;
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(TimeParseError::InvalidDate(expr.to_string()))
}

/// Parses either an absolute date/timestamp or a relative duration applied
/// to now, trying the absolute form first.
pub fn parse_date_or_relative(expr: &str) -> Result<DateTime<Utc>, TimeParseError> {
    if let Ok(ts) = parse_timestamp(expr) {
        return Ok(ts);
    }
    let duration = parse_duration(expr)?;
    Ok(Utc::now() + duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_duration_unit() {
        assert_eq!(parse_duration("30s").unwrap(), chrono::Duration::seconds(30));
        assert_eq!(parse_duration("5m").unwrap(), chrono::Duration::minutes(5));
        assert_eq!(parse_duration("2h").unwrap(), chrono::Duration::hours(2));
        assert_eq!(parse_duration("1d").unwrap(), chrono::Duration::days(1));
        assert_eq!(parse_duration("2w").unwrap(), chrono::Duration::weeks(2));
    }

    #[test]
    fn rejects_unknown_unit_or_empty() {
        assert!(parse_duration("5x").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn parses_bare_date_as_midnight_utc() {
        let ts = parse_timestamp("2025-06-01").unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-06-01 00:00:00");
    }

    #[test]
    fn parse_date_or_relative_prefers_absolute() {
        let ts = parse_date_or_relative("2025-06-01").unwrap();
        assert_eq!(ts.format("%Y-%m-%d").to_string(), "2025-06-01");
        let relative = parse_date_or_relative("3d").unwrap();
        assert!(relative > Utc::now());
    }
}
