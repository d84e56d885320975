//! Replay Time
//!
//! Nanosecond timestamps for snapshot replay. The router never reads
//! system time; every timestamp comes from the market data.

use chrono::{DateTime, TimeZone, Utc};

/// Nanoseconds since Unix epoch (1970-01-01 00:00:00 UTC).
pub type Nanos = i64;

/// Conversion constant
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Helper to convert chrono DateTime to Nanos.
#[inline]
pub fn datetime_to_nanos(dt: &DateTime<Utc>) -> Option<Nanos> {
    dt.timestamp_nanos_opt()
}

/// Helper to convert Nanos to chrono DateTime.
#[inline]
pub fn nanos_to_datetime(nanos: Nanos) -> Option<DateTime<Utc>> {
    let secs = nanos.div_euclid(NANOS_PER_SEC);
    let nsecs = nanos.rem_euclid(NANOS_PER_SEC) as u32;
    Utc.timestamp_opt(secs, nsecs).single()
}

/// Parse a feed timestamp: either integer nanoseconds or an RFC3339 string.
pub fn parse_timestamp(s: &str) -> Option<Nanos> {
    let s = s.trim();
    if let Ok(ns) = s.parse::<i64>() {
        return Some(ns);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .and_then(|dt| datetime_to_nanos(&dt.with_timezone(&Utc)))
}

/// Render a timestamp for logs; falls back to raw nanos when out of range.
pub fn format_nanos(nanos: Nanos) -> String {
    match nanos_to_datetime(nanos) {
        Some(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true),
        None => format!("{}ns", nanos),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_nanos() {
        assert_eq!(parse_timestamp("1722519392491911683"), Some(1_722_519_392_491_911_683));
        assert_eq!(parse_timestamp(" 42 "), Some(42));
    }

    #[test]
    fn test_parse_rfc3339() {
        let ns = parse_timestamp("2024-08-01T13:36:32.491911683Z").unwrap();
        assert_eq!(ns % NANOS_PER_SEC, 491_911_683);
        assert_eq!(format_nanos(ns), "2024-08-01T13:36:32.491911683Z");
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_datetime_roundtrip() {
        let dt = nanos_to_datetime(1_700_000_000 * NANOS_PER_SEC + 5).unwrap();
        assert_eq!(datetime_to_nanos(&dt), Some(1_700_000_000 * NANOS_PER_SEC + 5));
    }
}
