//! # pagestore
//!
//! Key-value store access for getpage.
//!
//! ## Layout
//! - **Store**: the three commands the page cache needs (`INCR`, `GET`, `SET ... EX`)
//! - **RespStore**: blocking connection to a Redis-compatible server
//! - **MemoryStore**: in-process store with per-key expiry
//! - **server** (feature `test-server`): embedded RESP server over a `MemoryStore`
//!
//! The client integration tests need the embedded server, so they only run
//! with `cargo test -p pagestore --features test-server` (a plain
//! `cargo test --workspace` enables it through `pagecache`'s dev-dependencies).

#![warn(missing_docs)]

mod client;
mod error;
mod memory;
mod store;

#[cfg(feature = "test-server")]
pub mod resp;
#[cfg(feature = "test-server")]
pub mod server;

pub use client::RespStore;
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use store::Store;
