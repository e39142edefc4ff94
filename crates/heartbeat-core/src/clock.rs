//! UTC epoch-millisecond conversions.
//!
//! Every downstream component (queue, consumer, compactor, reader) works
//! only in epoch milliseconds. ISO-8601 parsing is confined to the HTTP
//! edge (`Sample::from_wire`) per the timestamp-normalization discipline.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Milliseconds since the Unix epoch, UTC. Naive (no-timezone) inputs
/// are interpreted as UTC, mirroring `datetime_to_epoch_ms` in the
/// original Python implementation.
pub fn datetime_to_epoch_ms(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

pub fn epoch_ms_to_datetime(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or_else(|| Utc.timestamp_nanos(0))
}

/// Derives the `YYYY-MM-DD` UTC date string a sample belongs to.
pub fn epoch_ms_to_date_str(ms: i64) -> String {
    epoch_ms_to_datetime(ms).format("%Y-%m-%d").to_string()
}

/// Parses an ISO-8601 timestamp (accepting a trailing `Z`) into epoch ms.
pub fn parse_iso8601_to_epoch_ms(s: &str) -> Result<i64, chrono::ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).timestamp_millis());
    }
    // Accept a bare "Z" suffix as RFC3339 requires an offset, not "Z" alone
    // on naive inputs -- fall back to naive parsing and assume UTC.
    let trimmed = s.trim_end_matches('Z');
    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))?;
    Ok(Utc.from_utc_datetime(&naive).timestamp_millis())
}

/// Truncates an epoch-millisecond timestamp down to the start of its minute.
pub fn truncate_to_minute_ms(ms: i64) -> i64 {
    ms - ms.rem_euclid(60_000)
}

/// Formats epoch milliseconds as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_timestamp_z(ms: i64) -> String {
    epoch_ms_to_datetime(ms).format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_epoch_ms() {
        let ms = 1_705_315_200_000; // 2024-01-15T10:40:00Z
        let s = epoch_ms_to_date_str(ms);
        assert_eq!(s, "2024-01-15");
    }

    #[test]
    fn parses_zulu_suffix() {
        let ms = parse_iso8601_to_epoch_ms("2025-01-15T10:00:30Z").unwrap();
        assert_eq!(epoch_ms_to_date_str(ms), "2025-01-15");
        assert_eq!(format_timestamp_z(ms), "2025-01-15T10:00:30Z");
    }

    #[test]
    fn truncates_to_minute() {
        let ms = parse_iso8601_to_epoch_ms("2025-01-15T10:00:59Z").unwrap();
        let truncated = truncate_to_minute_ms(ms);
        assert_eq!(format_timestamp_z(truncated), "2025-01-15T10:00:00Z");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_iso8601_to_epoch_ms("not-a-date").is_err());
    }
}
