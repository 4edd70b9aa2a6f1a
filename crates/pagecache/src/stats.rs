//! Per-wrapper hit/miss tally

/// Outcome counts for one `CachedFetcher`, as seen by this process.
///
/// The shared per-URL access counters live in the store; these only cover
/// calls made through one wrapper.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls answered from the cache
    pub hits: u64,
    /// Calls that went to the fetcher
    pub misses: u64,
    /// Misses whose fetch returned an error
    pub fetch_failures: u64,
}

impl CacheStats {
    /// Share of calls answered from the cache, 0.0 before any call
    pub fn hit_ratio(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            calls => self.hits as f64 / calls as f64,
        }
    }
}
