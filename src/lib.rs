//! # kvstore - A Redis-Compatible In-Memory Key-Value Server
//!
//! kvstore speaks the RESP2 wire protocol over TCP, so `redis-cli` and
//! ordinary Redis client libraries can talk to it. It keeps a single keyspace
//! of binary-safe keys and string values with optional expiry.
//!
//! ## Features
//!
//! - **Redis-Compatible**: RESP2 framing, pipelining, and Redis error text
//! - **Concurrent**: Sharded storage with RwLock per shard
//! - **TTL Support**: Keys can carry a deadline and are expired lazily on read
//! - **Async I/O**: Built on Tokio, one task per client connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              kvstore                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  │                         │
//! │                            ▼                  ▼                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │   RESP      │    │              StorageEngine                   │   │
//! │  │   Parser    │    │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │   │
//! │  │             │    │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ │   │
//! │  └─────────────┘    │  │RwLock  │ │RwLock  │ │RwLock  │ │shards  │ │   │
//! │                     │  └────────┘ └────────┘ └────────┘ └────────┘ │   │
//! │                     └──────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use kvstore::commands::CommandHandler;
//! use kvstore::connection::{handle_connection, ConnectionStats};
//! use kvstore::storage::StorageEngine;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let storage = Arc::new(StorageEngine::new());
//!     let stats = Arc::new(ConnectionStats::new());
//!     let handler = CommandHandler::new(storage).with_stats(Arc::clone(&stats));
//!
//!     let listener = TcpListener::bind("127.0.0.1:6379").await.unwrap();
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let handler = handler.clone();
//!         let stats = Arc::clone(&stats);
//!
//!         tokio::spawn(handle_connection(stream, addr, handler, stats, None));
//!     }
//! }
//! ```
//!
//! ## Supported Commands
//!
//! ### Key Commands
//! - `SET key value [EX seconds | PX milliseconds]`
//! - `GET key`
//! - `DEL key`
//! - `EXISTS key`
//! - `EXPIRE key seconds`
//!
//! ### Server Commands
//! - `PING`
//! - `INFO`
//! - `COMMAND`
//! - `CLIENT LIST | SETNAME name | GETNAME`
//! - `CONFIG GET parameter | SET ...`
//! - `HELLO [...]`
//! - `AUTH ...` / `SELECT ...` (accepted, no effect)
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP value model, incremental parser and command frames
//! - [`storage`]: Thread-safe storage engine with TTL support
//! - [`commands`]: Command registry and implementations
//! - [`connection`]: Client connection management
//! - [`config`]: Command-line and environment configuration
//!
//! ## Expiry
//!
//! There is no background sweeper. A key past its deadline stays in its shard
//! until a `GET` observes it and evicts it, or until something overwrites or
//! deletes it.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{ParseError, RespParser, RespValue};
pub use storage::StorageEngine;

/// The default port kvstore listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host kvstore binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Seconds of client silence before the connection is closed
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

/// Version of kvstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
