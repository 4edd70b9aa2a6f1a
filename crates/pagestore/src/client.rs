//! Blocking connection to a Redis-compatible store

use redis::{Client, Connection};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::Store;

/// A single blocking connection to a Redis-compatible server.
///
/// One command is in flight at a time; no timeouts are set, so calls block
/// for as long as the OS socket does.
pub struct RespStore {
    con: Connection,
    addr: String,
}

impl RespStore {
    /// Connect to `addr`, given as `host:port` or a `redis://` URL
    pub fn connect(addr: &str) -> Result<Self> {
        let url = if addr.contains("://") {
            addr.to_string()
        } else {
            format!("redis://{}/", addr)
        };
        let con = Client::open(url.as_str())?.get_connection()?;
        info!("Connected to store at {}", addr);

        Ok(Self {
            con,
            addr: addr.to_string(),
        })
    }

    /// Address this client connected to
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Round-trip a `PING`
    pub fn ping(&mut self) -> Result<()> {
        let _: String = redis::cmd("PING").query(&mut self.con)?;
        Ok(())
    }

    /// Send `QUIT` and drop the connection
    pub fn close(mut self) -> Result<()> {
        redis::cmd("QUIT").query::<()>(&mut self.con)?;
        info!("Disconnected from store at {}", self.addr);
        Ok(())
    }
}

impl Store for RespStore {
    fn incr(&mut self, key: &str) -> Result<i64> {
        debug!("INCR {}", key);
        Ok(redis::cmd("INCR").arg(key).query(&mut self.con)?)
    }

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        debug!("GET {}", key);
        Ok(redis::cmd("GET").arg(key).query(&mut self.con)?)
    }

    fn set_ex(&mut self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let (unit, amount) = expiry_args(ttl)?;
        debug!("SET {} <{} bytes> {} {}", key, value.len(), unit, amount);

        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg(unit)
            .arg(amount)
            .query::<()>(&mut self.con)?;
        Ok(())
    }
}

/// `EX <secs>` for whole seconds, `PX <millis>` otherwise
fn expiry_args(ttl: Duration) -> Result<(&'static str, u64)> {
    if ttl.subsec_nanos() == 0 && ttl.as_secs() > 0 {
        Ok(("EX", ttl.as_secs()))
    } else if ttl.as_millis() > 0 {
        Ok(("PX", u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)))
    } else {
        Err(Error::InvalidTtl(ttl))
    }
}
