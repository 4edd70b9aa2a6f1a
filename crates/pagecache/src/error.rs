//! Error types for pagecache

use thiserror::Error;

/// Result type alias for pagecache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by fetching or caching a page.
///
/// Nothing is retried or swallowed; each variant carries the underlying error.
#[derive(Error, Debug)]
pub enum Error {
    /// Talking to the key-value store failed
    #[error("Store error: {0}")]
    Store(#[from] pagestore::Error),

    /// The HTTP request failed (connect, DNS, timeout, body read)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O failure from a custom fetch source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
