use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::warn;

/// Parses `createdAt` values into timezone-naive date-times.
///
/// Offsets are dropped after parsing: `2021-03-15T10:00:00+02:00` becomes
/// `2021-03-15 10:00:00`, keeping the wall clock the record was written in.
pub struct TimestampParser;

impl TimestampParser {
    /// Parse a JSON value.
    ///
    /// * `null`, booleans, arrays, objects → `None`
    /// * string → see [`TimestampParser::parse_str`]
    /// * number → Unix seconds, read as a UTC wall clock
    pub fn parse(value: &Value) -> Option<NaiveDateTime> {
        match value {
            Value::String(s) => Self::parse_str(s),
            Value::Number(n) => {
                if let Some(secs) = n.as_i64() {
                    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
                } else if let Some(f) = n.as_f64() {
                    // Floor so that negative instants keep a non-negative fraction.
                    let whole = f.floor();
                    let mut secs = whole as i64;
                    let mut nanos = ((f - whole) * 1_000_000_000.0).round() as u32;
                    if nanos >= 1_000_000_000 {
                        secs += 1;
                        nanos = 0;
                    }
                    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Parse an ISO 8601 string, with or without offset, or a bare date.
    pub fn parse_str(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_local());
        }

        // Offsets without a colon, e.g. `+0000`.
        const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
                return Some(dt.naive_local());
            }
        }

        const NAIVE_FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M",
        ];
        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0);
        }

        warn!("could not parse timestamp string \"{}\"", s);
        None
    }
}
