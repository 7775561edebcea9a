//! RESP Protocol Implementation
//!
//! This module implements the Redis Serialization Protocol (RESP) codec.
//!
//! ## Modules
//!
//! - `types`: Defines the `RespValue` enum and serialization
//! - `parser`: Incremental parser for incoming RESP data
//! - `frame`: Turns a parsed request array into a `CommandFrame`
//!
//! ## Example
//!
//! ```
//! use kvstore::protocol::{parse_message, CommandFrame, RespValue};
//! use bytes::Bytes;
//!
//! // Parsing incoming data
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let (value, consumed) = parse_message(data).unwrap().unwrap();
//! assert_eq!(consumed, data.len());
//!
//! let frame = CommandFrame::try_from(value).unwrap();
//! assert_eq!(frame.name().as_deref(), Some("GET"));
//!
//! // Creating responses
//! let response = RespValue::bulk_string(Bytes::from("alice"));
//! assert_eq!(response.serialize(), b"$5\r\nalice\r\n");
//! ```

pub mod frame;
pub mod parser;
pub mod types;

pub use frame::{CommandFrame, FrameError};
pub use parser::{parse_message, ParseError, ParseResult, RespParser};
pub use types::RespValue;
