//! Command Handler Module
//!
//! This module implements the command processing layer for kvstore.
//! It receives decoded RESP requests, executes them against the storage engine,
//! and returns the reply value to encode.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RESP Parser    │  (protocol module)
//! └────────┬────────┘
//!          │ CommandFrame
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Lookup       │  CommandTable: name -> arity + fn
//! │  - Validate     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! Every failure inside a command is a [`CommandError`], and every
//! `CommandError` becomes an error reply. Nothing escapes the handler.

pub mod error;
pub mod handler;
pub mod table;

pub use error::{CommandError, CommandResult};
pub use handler::CommandHandler;
pub use table::{Arity, CommandFn, CommandSpec, CommandTable};
