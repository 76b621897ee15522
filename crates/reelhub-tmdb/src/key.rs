//! Canonical cache-key derivation for TMDB requests.

/// Derive the cache key for an endpoint + parameter set.
///
/// Path separators are normalized to `_` and parameters are sorted
/// lexicographically by name, so identical calls share one cache entry
/// regardless of parameter insertion order.
pub fn derive_key(endpoint: &str, params: &[(&str, String)]) -> String {
    let mut key = endpoint.trim_matches('/').replace('/', "_");
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by_key(|(name, _)| *name);
    for (name, value) in sorted {
        key.push('_');
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
    key
}
