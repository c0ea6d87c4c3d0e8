//! Cache key derivation.

use serde::Serialize;

/// Deterministic identifier of a proxied resource.
///
/// Always `scheme://hostname:port` followed by the path and, when present,
/// `?query`. The port is explicit even when it is the scheme default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key from already-normalized parts.
    pub fn new(scheme: &str, host: &str, port: u16, path_and_query: &str) -> Self {
        Self(format!("{scheme}://{host}:{port}{path_and_query}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_includes_explicit_port() {
        let key = CacheKey::new("http", "example.test", 80, "/a.txt");
        assert_eq!(key.as_str(), "http://example.test:80/a.txt");
        assert_eq!(key.to_string(), "http://example.test:80/a.txt");
    }
}
