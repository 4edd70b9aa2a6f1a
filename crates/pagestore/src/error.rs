//! Error types for pagestore

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for store operations
#[derive(Error, Debug)]
pub enum Error {
    /// Connecting to or talking with the Redis server failed,
    /// including error replies such as `-ERR value is not an integer`
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Malformed RESP frame seen by the embedded server
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// INCR on a value that is not a 64-bit integer
    #[error("Value is not an integer or out of range")]
    NotAnInteger,

    /// Expiry must be positive
    #[error("Invalid expire time: {0:?}")]
    InvalidTtl(std::time::Duration),
}
