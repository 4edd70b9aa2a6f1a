//! Cache key scheme and expiry

use std::time::Duration;

/// Lifetime of a cached page body
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

/// Prefix of the per-URL access counter key
pub const COUNT_PREFIX: &str = "count:";

/// Prefix of the per-URL cached body key
pub const CONTENT_PREFIX: &str = "cached:";

/// Settings for a [`CachedFetcher`](crate::CachedFetcher).
///
/// Key prefixes are fixed: neither is a prefix of the other, so no two URLs
/// can ever map to the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL }
    }
}

impl CacheConfig {
    /// Replace the expiry
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Expiry applied when a fetched body is written
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Counter key for `url`
    pub fn count_key(&self, url: &str) -> String {
        format!("{}{}", COUNT_PREFIX, url)
    }

    /// Cached body key for `url`
    pub fn content_key(&self, url: &str) -> String {
        format!("{}{}", CONTENT_PREFIX, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keys() {
        let config = CacheConfig::default();
        assert_eq!(config.count_key("http://example.com"), "count:http://example.com");
        assert_eq!(config.content_key("http://example.com"), "cached:http://example.com");
        assert_eq!(config.ttl(), Duration::from_secs(10));
    }

    #[test]
    fn test_prefixes_are_disjoint() {
        assert!(!COUNT_PREFIX.starts_with(CONTENT_PREFIX));
        assert!(!CONTENT_PREFIX.starts_with(COUNT_PREFIX));
    }

    #[test]
    fn test_urls_never_share_a_key() {
        let config = CacheConfig::default();
        let urls = [
            "http://example.com",
            "http://example.com/",
            "http://example.com/a",
            "http://example.co",
            "1",
            "x1",
            "ed:1",
            "count:1",
            "cached:1",
            "",
        ];

        for (i, a) in urls.iter().enumerate() {
            for b in &urls[i + 1..] {
                assert_ne!(config.count_key(a), config.count_key(b));
                assert_ne!(config.content_key(a), config.content_key(b));
            }
            for b in &urls {
                assert_ne!(config.count_key(a), config.content_key(b));
            }
        }
    }

    #[test]
    fn test_with_ttl_keeps_key_scheme() {
        let config = CacheConfig::default().with_ttl(Duration::from_secs(60));
        assert_eq!(config.ttl(), Duration::from_secs(60));
        assert_eq!(config.count_key("u"), "count:u");
        assert_eq!(config.content_key("u"), "cached:u");
    }
}
