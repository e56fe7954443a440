//! Per-sport normalization of raw provider payloads.
//!
//! Everything upstream of this module is untyped `serde_json::Value`;
//! everything downstream sees only the canonical [`Match`] / [`Series`]
//! shapes. Normalizers are pure: unparseable records yield `None`, missing
//! optional fields never panic, and no input is ever mutated.

pub mod basketball;
pub mod cricket;
pub mod display;
pub mod football;

pub use display::{format_match_for_display, MatchDisplay};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::model::{Match, Sport};

/// Normalize one raw match record for the given sport.
///
/// Returns `None` for records that lack the fields any match needs (an ID
/// and two teams); partial records are normalized with gaps, not dropped.
pub fn normalize_match(raw: &Value, sport: Sport) -> Option<Match> {
    match sport {
        Sport::Cricket => cricket::normalize_match(raw),
        Sport::Football => football::normalize_match(raw),
        Sport::Basketball => basketball::normalize_match(raw),
    }
}

// ── Shared field helpers ─────────────────────────────────────────────────────

/// Providers disagree on whether IDs are strings or numbers.
pub(crate) fn id_string(v: &Value) -> Option<String> {
    v.as_str()
        .map(str::to_string)
        .or_else(|| v.as_i64().map(|n| n.to_string()))
        .or_else(|| v.as_u64().map(|n| n.to_string()))
}

/// Integer that may arrive as a JSON number or a numeric string.
pub(crate) fn int_field(v: &Value) -> Option<i64> {
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Parse the timestamp formats seen across providers: RFC 3339, naive
/// `YYYY-MM-DDTHH:MM:SS` (assumed UTC), and bare dates.
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Derive a short name for teams the provider gives none for: initials of a
/// multi-word name, else the first three characters uppercased.
pub(crate) fn derive_short_name(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    if words.len() >= 2 {
        words
            .iter()
            .filter_map(|w| w.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .collect()
    } else {
        name.chars()
            .take(3)
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_derive_short_name() {
        assert_eq!(derive_short_name("Manchester United"), "MU");
        assert_eq!(derive_short_name("Royal Challengers Bangalore"), "RCB");
        assert_eq!(derive_short_name("Arsenal"), "ARS");
        assert_eq!(derive_short_name("ab"), "AB");
        assert_eq!(derive_short_name(""), "");
    }

    #[test]
    fn test_id_string_accepts_both_shapes() {
        assert_eq!(id_string(&json!("abc")), Some("abc".into()));
        assert_eq!(id_string(&json!(42)), Some("42".into()));
        assert_eq!(id_string(&json!(null)), None);
    }

    #[test]
    fn test_int_field_accepts_numeric_strings() {
        assert_eq!(int_field(&json!(3)), Some(3));
        assert_eq!(int_field(&json!("3")), Some(3));
        assert_eq!(int_field(&json!("x")), None);
    }

    #[test]
    fn test_parse_datetime_variants() {
        assert!(parse_datetime("2024-03-01T09:30:00+00:00").is_some());
        assert!(parse_datetime("2024-03-01T09:30:00").is_some());
        assert!(parse_datetime("2024-03-01").is_some());
        assert!(parse_datetime("next tuesday").is_none());
    }

    #[test]
    fn test_normalize_garbage_is_none_for_every_sport() {
        for sport in [Sport::Cricket, Sport::Football, Sport::Basketball] {
            assert!(normalize_match(&json!("garbage"), sport).is_none());
            assert!(normalize_match(&json!({}), sport).is_none());
            assert!(normalize_match(&json!(null), sport).is_none());
        }
    }
}
