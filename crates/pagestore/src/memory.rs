//! In-process key-value store with per-key expiry
//!
//! Expired entries are dropped lazily, on the next access to the key.

use ahash::RandomState;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::store::Store;

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline <= now)
    }
}

type Entries = HashMap<String, Entry, RandomState>;

/// Shared in-memory store.
///
/// Clones share the same data, so a test can keep a handle while a
/// `CachedFetcher` or the embedded server owns another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<Entries>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining time to live of `key`; `None` if absent or without expiry
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        live(&mut entries, key, now)?
            .expires_at
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Whether `key` holds a live value
    pub fn contains(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        live(&mut entries, key, Instant::now()).is_some()
    }

    /// Remove `key`, returning whether a live value was present
    pub fn remove(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        entries
            .remove(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.len()
    }

    /// Check if the store holds no live keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every key
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Shared-reference INCR, used by the embedded server
    pub fn incr_shared(&self, key: &str) -> Result<i64> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let (current, expires_at) = match live(&mut entries, key, now) {
            Some(entry) => {
                let n = std::str::from_utf8(&entry.value)
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or(Error::NotAnInteger)?;
                (n, entry.expires_at)
            }
            None => (0, None),
        };

        let next = current.checked_add(1).ok_or(Error::NotAnInteger)?;
        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string().into_bytes(),
                expires_at,
            },
        );
        Ok(next)
    }

    /// Shared-reference GET, used by the embedded server
    pub fn get_shared(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock();
        live(&mut entries, key, Instant::now()).map(|entry| entry.value.clone())
    }

    /// Shared-reference SET with optional expiry, used by the embedded server
    pub fn set_shared(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        if let Some(ttl) = ttl {
            if ttl.is_zero() {
                return Err(Error::InvalidTtl(ttl));
            }
        }

        let entry = Entry {
            value: value.to_vec(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }
}

/// Look up `key`, evicting it first if its deadline has passed
fn live<'a>(entries: &'a mut Entries, key: &str, now: Instant) -> Option<&'a Entry> {
    if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
        entries.remove(key);
        return None;
    }
    entries.get(key)
}

impl Store for MemoryStore {
    fn incr(&mut self, key: &str) -> Result<i64> {
        self.incr_shared(key)
    }

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get_shared(key))
    }

    fn set_ex(&mut self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.set_shared(key, value, Some(ttl))
    }
}
