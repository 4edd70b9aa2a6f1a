//! # pagecache
//!
//! Cache-aside page fetching over a key-value store.
//!
//! ## Architecture
//! - **Fetch**: anything that turns a URL into page text (`HttpFetcher`, or a closure)
//! - **CachedFetcher**: counts every access, serves cached text when present,
//!   otherwise fetches and caches with a fixed expiry
//! - **Store**: `pagestore::Store` (`RespStore` for Redis, `MemoryStore` in-process)
//!
//! ```no_run
//! use pagecache::{CachedFetcher, HttpFetcher};
//! use pagestore::RespStore;
//!
//! # fn main() -> pagecache::Result<()> {
//! let store = RespStore::connect("127.0.0.1:6379")?;
//! let mut pages = CachedFetcher::new(store, HttpFetcher::new()?);
//! let body = pages.fetch_with_cache("http://example.com")?;
//! # let _ = body;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod fetcher;
mod stats;

pub use cache::CachedFetcher;
pub use config::{CacheConfig, CONTENT_PREFIX, COUNT_PREFIX, DEFAULT_TTL};
pub use error::{Error, Result};
pub use fetcher::{Fetch, HttpFetcher};
pub use stats::CacheStats;
