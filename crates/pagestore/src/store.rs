//! The key-value store surface used by the page cache

use std::time::Duration;

use crate::error::Result;

/// A key-value store offering counters and expiring values.
///
/// Mirrors the Redis commands `INCR`, `GET` and `SET key value EX ttl`.
/// Implementations own expiry; callers never delete.
pub trait Store {
    /// Increment the integer at `key`, creating it at 0 first if absent.
    /// Returns the value after the increment.
    fn incr(&mut self, key: &str) -> Result<i64>;

    /// Fetch the value at `key`, or `None` if absent or expired.
    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` at `key`, replacing any previous value, expiring after `ttl`.
    fn set_ex(&mut self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
}

impl<S: Store + ?Sized> Store for &mut S {
    fn incr(&mut self, key: &str) -> Result<i64> {
        (**self).incr(key)
    }

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set_ex(&mut self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        (**self).set_ex(key, value, ttl)
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn incr(&mut self, key: &str) -> Result<i64> {
        (**self).incr(key)
    }

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set_ex(&mut self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        (**self).set_ex(key, value, ttl)
    }
}
