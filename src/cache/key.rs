//! Deterministic cache key construction.

/// Build a cache key from an endpoint and its query params.
///
/// Params are sorted by name before concatenation, so the same param set
/// yields the same key regardless of the order the caller assembled it in.
pub fn cache_key(endpoint: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return endpoint.to_string();
    }
    let mut sorted: Vec<(&str, &str)> = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(b.1)));
    let query: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{}?{}", endpoint, query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_param_order() {
        assert_eq!(
            cache_key("cricket/live", &[("b", "2"), ("a", "1")]),
            cache_key("cricket/live", &[("a", "1"), ("b", "2")]),
        );
    }

    #[test]
    fn test_key_shape() {
        assert_eq!(
            cache_key("cricket/live", &[("b", "2"), ("a", "1")]),
            "cricket/live?a=1&b=2"
        );
        assert_eq!(cache_key("cricket/live", &[]), "cricket/live");
    }

    #[test]
    fn test_distinct_params_distinct_keys() {
        assert_ne!(
            cache_key("cricket/live", &[("a", "1")]),
            cache_key("cricket/live", &[("a", "2")]),
        );
        assert_ne!(
            cache_key("cricket/live", &[("a", "1")]),
            cache_key("football/live", &[("a", "1")]),
        );
    }
}
