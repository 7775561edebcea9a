//! Connection Handler Module
//!
//! This module manages individual client connections to kvstore.
//! Each client connection is handled by its own async task, so one slow
//! client never holds up another.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                    (main.rs)                                │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept()
//!                        ▼
//!           ┌────────────────────────┐
//!           │   For each client...   │
//!           └────────────┬───────────┘
//!                        │
//!                        │ spawn task
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ Read bytes  │───>│ Parse RESP  │───>│ Execute cmd │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                                               │             │
//! │                                               ▼             │
//! │                                      ┌─────────────┐        │
//! │                                      │ Send resp   │        │
//! │                                      └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Pipelining**: Several commands in one read are answered in order
//! - **Idle Timeout**: Silent clients are dropped after a configurable window
//! - **Protocol Errors**: Malformed input gets one error reply, then a close
//! - **Statistics**: Tracks connection and command metrics for `INFO`
//!
//! ## Example
//!
//! ```ignore
//! use kvstore::connection::{handle_connection, ConnectionStats};
//! use kvstore::commands::CommandHandler;
//! use kvstore::storage::StorageEngine;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let storage = Arc::new(StorageEngine::new());
//! let stats = Arc::new(ConnectionStats::new());
//! let handler = CommandHandler::new(storage).with_stats(Arc::clone(&stats));
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(
//!     stream,
//!     addr,
//!     handler.clone(),
//!     Arc::clone(&stats),
//!     Some(Duration::from_secs(60)),
//! ));
//! ```

pub mod handler;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
