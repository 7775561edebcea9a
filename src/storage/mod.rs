//! Storage Engine Module
//!
//! The key space shared by every client connection.
//!
//! ## Features
//!
//! - **Sharded Storage**: independent `RwLock` shards reduce lock contention
//! - **RwLock**: Multiple concurrent readers, exclusive writers
//! - **Type Tags**: every entry records its [`DataType`]
//! - **Lazy Expiry**: expiry is checked when a key is read, never swept
//!
//! ## Example
//!
//! ```
//! use kvstore::storage::{DataType, Entry, StorageEngine};
//! use bytes::Bytes;
//! use std::time::{Duration, Instant};
//!
//! let engine = StorageEngine::new();
//!
//! engine.set(Bytes::from("name"), Bytes::from("alice"), DataType::String);
//! assert_eq!(engine.get(b"name").unwrap().value, Bytes::from("alice"));
//!
//! let session = Entry::string(Bytes::from("abc123"))
//!     .with_expiry(Instant::now() + Duration::from_secs(60));
//! engine.set_entry(Bytes::from("session"), session);
//! assert_eq!(engine.expiring_count(), 1);
//! ```

pub mod engine;
pub mod entry;

pub use engine::{MemoryInfo, StorageEngine, StorageStats};
pub use entry::{DataType, Entry};
