//! Timestamp parsing, canonical formatting and ordering
//!
//! Timestamps travel as text. Anything that parses as RFC 3339 is rewritten
//! to a canonical UTC form; anything else is kept verbatim so that no event
//! is lost over a bad clock string.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::error::{HistoryError, Result};

/// Parse an RFC 3339 timestamp (fractional seconds optional) into UTC.
///
/// Only the strict form is accepted: an uppercase `T` between date and time
/// and an uppercase `Z` for UTC. chrono alone also takes a space or `t`/`z`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if value.as_bytes().get(10) != Some(&b'T') || value.contains(['t', 'z']) {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Canonical UTC text: `YYYY-MM-DDTHH:MM:SS[.fraction]Z`, with trailing
/// zeros dropped from the fraction.
pub fn format_canonical(ts: &DateTime<Utc>) -> String {
    let mut out = ts.format("%Y-%m-%dT%H:%M:%S").to_string();
    let nanos = ts.timestamp_subsec_nanos();
    if nanos > 0 {
        let fraction = format!("{:09}", nanos);
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out.push('Z');
    out
}

pub fn normalize_timestamp(raw: &str) -> String {
    let trimmed = raw.trim();
    match parse_timestamp(trimmed) {
        Some(ts) => format_canonical(&ts),
        None => trimmed.to_string(),
    }
}

/// Total order over timestamp text.
///
/// Parsable values compare by instant, ties broken by the raw text. A value
/// that does not parse sorts before one that does; two unparsable values
/// compare as plain strings.
pub fn compare_timestamps(a: &str, b: &str) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(ta), Some(tb)) => ta.cmp(&tb).then_with(|| a.cmp(b)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Parse an optional user-supplied time bound. Blank means "no bound".
pub fn parse_time_bound(value: Option<&str>, flag: &str) -> Result<Option<DateTime<Utc>>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    parse_timestamp(value).map(Some).ok_or_else(|| {
        HistoryError::config(format!(
            "invalid {} value {:?}: expected RFC3339",
            flag, value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_converts_offset_to_utc() {
        assert_eq!(
            normalize_timestamp("2026-02-17T14:00:01+02:00"),
            "2026-02-17T12:00:01Z"
        );
    }

    #[test]
    fn test_normalize_keeps_nanoseconds_trimmed() {
        assert_eq!(
            normalize_timestamp("2026-02-17T12:00:01.123456789Z"),
            "2026-02-17T12:00:01.123456789Z"
        );
        assert_eq!(
            normalize_timestamp("2026-02-17T12:00:01.500Z"),
            "2026-02-17T12:00:01.5Z"
        );
    }

    #[test]
    fn test_normalize_preserves_unparsable_text() {
        assert_eq!(normalize_timestamp("  yesterday-ish "), "yesterday-ish");
        assert_eq!(normalize_timestamp(""), "");
    }

    #[test]
    fn test_lenient_separators_are_kept_verbatim() {
        assert!(parse_timestamp("2026-02-17 12:00:01Z").is_none());
        assert!(parse_timestamp("2026-02-17t12:00:01Z").is_none());
        assert!(parse_timestamp("2026-02-17T12:00:01z").is_none());
        assert_eq!(
            normalize_timestamp("2026-02-17 12:00:01Z"),
            "2026-02-17 12:00:01Z"
        );
        assert!(parse_timestamp("2026-02-17T12:00:01.25-05:00").is_some());
    }

    #[test]
    fn test_unparsable_sorts_before_parsable() {
        assert_eq!(
            compare_timestamps("not-a-time", "2026-02-17T12:00:00Z"),
            Ordering::Less
        );
        assert_eq!(
            compare_timestamps("2026-02-17T12:00:00Z", "not-a-time"),
            Ordering::Greater
        );
        assert_eq!(compare_timestamps("b", "a"), Ordering::Greater);
    }

    #[test]
    fn test_equal_instants_tie_break_on_text() {
        let a = "2026-02-17T12:00:00Z";
        let b = "2026-02-17T14:00:00+02:00";
        assert_eq!(compare_timestamps(a, b), a.cmp(b));
        assert_eq!(compare_timestamps(a, a), Ordering::Equal);
    }

    #[test]
    fn test_parse_time_bound() {
        assert!(parse_time_bound(None, "--from").unwrap().is_none());
        assert!(parse_time_bound(Some("  "), "--from").unwrap().is_none());
        assert!(parse_time_bound(Some("2026-02-17T12:00:05Z"), "--from")
            .unwrap()
            .is_some());

        let err = parse_time_bound(Some("17/02/2026"), "--to").unwrap_err();
        assert!(matches!(err, HistoryError::Config(_)));
        assert!(err.to_string().contains("--to"));
    }
}
