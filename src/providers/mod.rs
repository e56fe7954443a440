//! `SportProvider` implementations for the upstream APIs.
//!
//! Providers are the only place where endpoint paths, cache classes, and
//! raw payloads meet: every read goes endpoint → cache → upstream client →
//! normalizer, and only canonical entities come back out.

pub mod apisports;
pub mod cricket;

pub use apisports::ApiSportsProvider;
pub use cricket::CricketDataProvider;

use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{Match, Sport};
use crate::normalize;

/// Normalize an array payload, dropping unparseable records instead of
/// failing the batch.
fn normalize_batch(raw: &Value, sport: Sport) -> Vec<Match> {
    let Some(items) = raw.as_array() else {
        warn!(sport = %sport, "expected an array payload from upstream");
        return Vec::new();
    };
    let matches: Vec<Match> = items
        .iter()
        .filter_map(|item| normalize::normalize_match(item, sport))
        .collect();
    let skipped = items.len() - matches.len();
    if skipped > 0 {
        debug!(sport = %sport, skipped, "dropped unparseable match records");
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_batch_drops_garbage_records() {
        let raw = json!([
            {"id": "c-1", "teams": ["A", "B"], "status": "Live"},
            {"this": "is not a match"},
            42
        ]);
        let matches = normalize_batch(&raw, Sport::Cricket);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "c-1");
    }

    #[test]
    fn test_normalize_batch_non_array_is_empty() {
        assert!(normalize_batch(&json!({"data": []}), Sport::Football).is_empty());
        assert!(normalize_batch(&json!(null), Sport::Football).is_empty());
    }
}
