//! CachedFetcher: cache-aside wrapper around a page fetcher

use pagestore::Store;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::fetcher::Fetch;
use crate::stats::CacheStats;

/// Wraps a [`Fetch`] with a store-backed page cache and per-URL access counter.
///
/// Each call increments `count:<url>`, then returns `cached:<url>` if it holds
/// a non-empty value. Otherwise the page is fetched, written back with the
/// configured expiry, and returned. Hits never extend the expiry.
///
/// The counter increment and the cache check/write are separate store
/// commands. Two callers missing on the same URL at once both fetch, and the
/// last write wins.
pub struct CachedFetcher<S, F> {
    store: S,
    fetcher: F,
    config: CacheConfig,
    stats: CacheStats,
}

impl<S: Store, F: Fetch> CachedFetcher<S, F> {
    /// Wrap `fetcher` with the default 10 second cache
    pub fn new(store: S, fetcher: F) -> Self {
        Self::with_config(store, fetcher, CacheConfig::default())
    }

    /// Wrap `fetcher` with custom key prefixes or expiry
    pub fn with_config(store: S, fetcher: F, config: CacheConfig) -> Self {
        Self {
            store,
            fetcher,
            config,
            stats: CacheStats::default(),
        }
    }

    /// Fetch `url`, serving from the cache when possible.
    ///
    /// Store and fetch errors propagate unchanged. The counter is incremented
    /// before anything else, so it still moves when the fetch fails; a failed
    /// fetch writes nothing to the cache.
    pub fn fetch_with_cache(&mut self, url: &str) -> Result<String> {
        let count = self.store.incr(&self.config.count_key(url))?;
        debug!("Access #{} for {}", count, url);

        let content_key = self.config.content_key(url);
        if let Some(cached) = self.store.get(&content_key)? {
            if !cached.is_empty() {
                self.stats.hits += 1;
                debug!("Cache hit for {} ({} bytes)", url, cached.len());
                return Ok(String::from_utf8(cached)
                    .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()));
            }
        }

        self.stats.misses += 1;
        debug!("Cache miss for {}", url);

        let stats = &mut self.stats;
        let body = self
            .fetcher
            .fetch(url)
            .inspect_err(|_| stats.fetch_failures += 1)?;

        self.store.set_ex(&content_key, body.as_bytes(), self.config.ttl())?;
        Ok(body)
    }

    /// Current access count for `url`, 0 if never accessed
    pub fn access_count(&mut self, url: &str) -> Result<u64> {
        let raw = match self.store.get(&self.config.count_key(url))? {
            Some(raw) => raw,
            None => return Ok(0),
        };
        std::str::from_utf8(&raw)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| pagestore::Error::NotAnInteger.into())
    }

    /// Turn this wrapper into a plain `url -> text` function
    pub fn into_fn(mut self) -> impl FnMut(&str) -> Result<String> {
        move |url| self.fetch_with_cache(url)
    }
}

impl<S, F> CachedFetcher<S, F> {
    /// Hit/miss counts for this wrapper
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Cache settings in use
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The wrapped store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the wrapped store
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The wrapped fetcher
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Unwrap into the store and fetcher
    pub fn into_inner(self) -> (S, F) {
        (self.store, self.fetcher)
    }
}
