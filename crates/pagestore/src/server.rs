//! Embedded Redis-compatible server over a [`MemoryStore`]
//!
//! Speaks enough RESP for the page cache and for `redis` client inspection in
//! tests. Runs on its own thread with a current-thread tokio runtime.

use bytes::BytesMut;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, warn};

use crate::error::Error;
use crate::memory::MemoryStore;
use crate::resp::RespValue;

/// Start serving `store` on an ephemeral localhost port.
///
/// The server thread runs until the process exits.
pub fn spawn(store: MemoryStore) -> io::Result<SocketAddr> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::Builder::new()
        .name(format!("pagestore-server-{}", addr.port()))
        .spawn(move || {
            runtime.block_on(async move {
                let listener = match TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        error!("Failed to register listener: {}", e);
                        return;
                    }
                };
                serve(listener, store).await;
            })
        })?;

    debug!("Embedded store listening on {}", addr);
    Ok(addr)
}

async fn serve(listener: TcpListener, store: MemoryStore) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!("New connection from {}", addr);
                let handler = CommandHandler::new(store.clone());

                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, handler).await {
                        error!("Error handling client {}: {}", addr, e);
                    }
                    debug!("Connection closed: {}", addr);
                });
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
            }
        }
    }
}

async fn handle_client(mut stream: TcpStream, handler: CommandHandler) -> io::Result<()> {
    let mut buffer = BytesMut::with_capacity(4096);

    loop {
        let n = stream.read_buf(&mut buffer).await?;
        if n == 0 {
            return Ok(());
        }

        loop {
            match RespValue::parse(&mut buffer) {
                Ok(Some(cmd)) => {
                    let (response, quit) = handler.handle(cmd);
                    stream.write_all(&response.serialize()).await?;
                    if quit {
                        return Ok(());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Parse error: {}", e);
                    let error_resp = RespValue::Error(format!("ERR {}", e));
                    stream.write_all(&error_resp.serialize()).await?;
                    buffer.clear();
                    break;
                }
            }
        }
    }
}

struct CommandHandler {
    store: MemoryStore,
}

fn err(msg: impl Into<String>) -> RespValue {
    RespValue::Error(msg.into())
}

fn ok() -> RespValue {
    RespValue::SimpleString("OK".to_string())
}

fn wrong_args(command: &str) -> RespValue {
    err(format!(
        "ERR wrong number of arguments for '{}' command",
        command.to_lowercase()
    ))
}

fn arg_bytes(arg: &RespValue) -> Option<&[u8]> {
    match arg {
        RespValue::BulkString(Some(b)) => Some(b),
        _ => None,
    }
}

fn arg_key(arg: &RespValue) -> Option<String> {
    arg_bytes(arg).map(|b| String::from_utf8_lossy(b).into_owned())
}

fn arg_u64(arg: &RespValue) -> Option<u64> {
    std::str::from_utf8(arg_bytes(arg)?).ok()?.parse().ok()
}

impl CommandHandler {
    fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Returns the reply and whether the connection should close afterwards
    fn handle(&self, cmd: RespValue) -> (RespValue, bool) {
        let arr = match cmd {
            RespValue::Array(Some(arr)) if !arr.is_empty() => arr,
            _ => return (err("ERR invalid command format"), false),
        };

        let command = match arg_bytes(&arr[0]) {
            Some(cmd) => String::from_utf8_lossy(cmd).to_uppercase(),
            None => return (err("ERR invalid command"), false),
        };
        let args = &arr[1..];

        let reply = match command.as_str() {
            "QUIT" => return (ok(), true),
            "PING" => self.handle_ping(args),
            "ECHO" => self.handle_echo(args),
            "GET" => self.handle_get(args),
            "SET" => self.handle_set(args),
            "INCR" => self.handle_incr(args),
            "TTL" => self.handle_ttl(args),
            "DEL" => self.handle_del(args),
            "DBSIZE" => RespValue::Integer(self.store.len() as i64),
            "FLUSHDB" => {
                self.store.clear();
                ok()
            }
            // redis-rs sends CLIENT SETINFO on connect
            "CLIENT" => ok(),
            _ => err(format!("ERR unknown command '{}'", command)),
        };
        (reply, false)
    }

    fn handle_ping(&self, args: &[RespValue]) -> RespValue {
        match args {
            [] => RespValue::SimpleString("PONG".to_string()),
            [msg] => msg.clone(),
            _ => wrong_args("PING"),
        }
    }

    fn handle_echo(&self, args: &[RespValue]) -> RespValue {
        match args {
            [msg] => msg.clone(),
            _ => wrong_args("ECHO"),
        }
    }

    fn handle_get(&self, args: &[RespValue]) -> RespValue {
        let key = match args {
            [key] => arg_key(key),
            _ => return wrong_args("GET"),
        };
        match key {
            Some(key) => RespValue::BulkString(self.store.get_shared(&key)),
            None => err("ERR invalid key type"),
        }
    }

    fn handle_set(&self, args: &[RespValue]) -> RespValue {
        if args.len() < 2 {
            return wrong_args("SET");
        }
        let (key, value) = match (arg_key(&args[0]), arg_bytes(&args[1])) {
            (Some(k), Some(v)) => (k, v),
            _ => return err("ERR invalid key or value type"),
        };

        let ttl = match &args[2..] {
            [] => None,
            [unit, amount] => {
                let amount = match arg_u64(amount) {
                    Some(n) if n > 0 => n,
                    _ => return err("ERR invalid expire time in 'set' command"),
                };
                match arg_key(unit).map(|u| u.to_uppercase()).as_deref() {
                    Some("EX") => Some(Duration::from_secs(amount)),
                    Some("PX") => Some(Duration::from_millis(amount)),
                    _ => return err("ERR syntax error"),
                }
            }
            _ => return err("ERR syntax error"),
        };

        match self.store.set_shared(&key, value, ttl) {
            Ok(()) => ok(),
            Err(e) => err(format!("ERR {}", e)),
        }
    }

    fn handle_incr(&self, args: &[RespValue]) -> RespValue {
        let key = match args {
            [key] => arg_key(key),
            _ => return wrong_args("INCR"),
        };
        let Some(key) = key else {
            return err("ERR invalid key type");
        };

        match self.store.incr_shared(&key) {
            Ok(n) => RespValue::Integer(n),
            Err(Error::NotAnInteger) => err("ERR value is not an integer or out of range"),
            Err(e) => err(format!("ERR {}", e)),
        }
    }

    /// Seconds remaining, rounded up; -1 without expiry, -2 when missing
    fn handle_ttl(&self, args: &[RespValue]) -> RespValue {
        let key = match args {
            [key] => arg_key(key),
            _ => return wrong_args("TTL"),
        };
        let Some(key) = key else {
            return err("ERR invalid key type");
        };

        if !self.store.contains(&key) {
            return RespValue::Integer(-2);
        }
        match self.store.ttl(&key) {
            Some(remaining) => {
                let millis = remaining.as_millis() as i64;
                RespValue::Integer((millis + 999) / 1000)
            }
            None => RespValue::Integer(-1),
        }
    }

    fn handle_del(&self, args: &[RespValue]) -> RespValue {
        if args.is_empty() {
            return wrong_args("DEL");
        }
        let deleted = args
            .iter()
            .filter_map(arg_key)
            .filter(|key| self.store.remove(key))
            .count();
        RespValue::Integer(deleted as i64)
    }
}
