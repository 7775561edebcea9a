//! Incremental RESP Protocol Parser
//!
//! The parser is a pure function from "bytes received so far" to "one decoded
//! value, or not enough data yet". It never blocks and never consumes input on
//! its own; the caller owns the buffer.
//!
//! ## How the Parser Works
//!
//! [`RespParser::parse`] returns either:
//! - `Ok(Some((value, consumed)))` - Successfully parsed a value, `consumed` bytes were used
//! - `Ok(None)` - Need more data, the message is incomplete
//! - `Err(ParseError)` - Invalid protocol data
//!
//! [`RespParser::decode`] wraps this for a `BytesMut` read buffer and advances it
//! by exactly `consumed` bytes on success, leaving it untouched otherwise. The
//! caller then:
//! 1. Appends incoming network data to the buffer
//! 2. Calls `decode()` until it returns `Ok(None)`
//! 3. Waits for more data and repeats
//! 4. On error, decides whether to reply or disconnect (see [`ParseError`])

use crate::protocol::types::{prefix, RespValue, CRLF};
use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

/// Errors that can occur during RESP parsing.
///
/// Running out of input is not an error; see [`RespParser::parse`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unknown type prefix byte
    #[error("unknown type prefix: {0:#04x}")]
    UnknownPrefix(u8),

    /// Invalid integer format (integer values and length headers)
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid UTF-8 in a line-based value
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative (but not -1 for null)
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Array length is negative (but not -1 for null)
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Framing violation (CR without LF, missing terminator, nesting too deep)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The message exceeds maximum allowed size
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

impl ParseError {
    /// True when the input started with a byte that is not a RESP type prefix.
    ///
    /// Every other variant means a recognised unit was malformed.
    pub fn is_unsupported_type(&self) -> bool {
        matches!(self, ParseError::UnknownPrefix(_))
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of elements in a single array
pub const MAX_ARRAY_LEN: usize = 1024 * 1024;

/// Maximum array nesting depth (prevent stack overflow)
pub const MAX_NESTING_DEPTH: usize = 32;

/// Maximum length of a header or simple-string line, terminator excluded
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// An incremental RESP protocol parser.
///
/// # Example
///
/// ```
/// use kvstore::protocol::{RespParser, RespValue};
/// use bytes::{Bytes, BytesMut};
///
/// let parser = RespParser::new();
/// let mut buffer = BytesMut::from(&b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n*1"[..]);
///
/// let value = parser.decode(&mut buffer).unwrap().unwrap();
/// assert_eq!(
///     value,
///     RespValue::array(vec![
///         RespValue::bulk_string(Bytes::from("GET")),
///         RespValue::bulk_string(Bytes::from("name")),
///     ])
/// );
///
/// // The trailing partial frame stays in the buffer.
/// assert!(parser.decode(&mut buffer).unwrap().is_none());
/// assert_eq!(&buffer[..], b"*1");
/// ```
#[derive(Debug, Clone)]
pub struct RespParser {
    /// Largest bulk string accepted
    max_bulk_size: usize,
}

impl Default for RespParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RespParser {
    /// Creates a new parser with the default limits.
    pub fn new() -> Self {
        Self {
            max_bulk_size: MAX_BULK_SIZE,
        }
    }

    /// Creates a parser that rejects bulk strings longer than `max_bulk_size`.
    pub fn with_max_bulk_size(max_bulk_size: usize) -> Self {
        Self { max_bulk_size }
    }

    /// Attempts to parse one RESP value from the start of `buf`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some((value, consumed)))` - Successfully parsed a value
    /// - `Ok(None)` - Incomplete data, need more bytes
    /// - `Err(e)` - Parse error
    pub fn parse(&self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        self.parse_value(buf, 0)
    }

    /// Decodes one value from the front of `buf`, advancing it past the
    /// consumed bytes. On `Ok(None)` or `Err` the buffer is left untouched.
    pub fn decode(&self, buf: &mut BytesMut) -> ParseResult<Option<RespValue>> {
        match self.parse(buf)? {
            Some((value, consumed)) => {
                buf.advance(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn parse_value(&self, buf: &[u8], depth: usize) -> ParseResult<Option<(RespValue, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        if depth > MAX_NESTING_DEPTH {
            return Err(ParseError::ProtocolError(format!(
                "maximum nesting depth exceeded: {}",
                MAX_NESTING_DEPTH
            )));
        }

        match buf[0] {
            prefix::SIMPLE_STRING => Ok(parse_text(buf)?
                .map(|(s, consumed)| (RespValue::SimpleString(s), consumed))),
            prefix::ERROR => {
                Ok(parse_text(buf)?.map(|(s, consumed)| (RespValue::Error(s), consumed)))
            }
            prefix::INTEGER => Ok(parse_header(buf)?
                .map(|(n, consumed)| (RespValue::Integer(n), consumed))),
            prefix::BULK_STRING => self.parse_bulk_string(buf),
            prefix::ARRAY => self.parse_array(buf, depth),
            other => Err(ParseError::UnknownPrefix(other)),
        }
    }

    /// Parses a bulk string: `$<length>\r\n<data>\r\n`
    fn parse_bulk_string(&self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        debug_assert!(buf[0] == prefix::BULK_STRING);

        let (length, data_start) = match parse_header(buf)? {
            Some(header) => header,
            None => return Ok(None),
        };

        if length == -1 {
            return Ok(Some((RespValue::Null, data_start)));
        }

        if length < 0 {
            return Err(ParseError::InvalidBulkLength(length));
        }

        let length = length as usize;
        if length > self.max_bulk_size {
            return Err(ParseError::MessageTooLarge {
                size: length,
                max: self.max_bulk_size,
            });
        }

        let total_needed = data_start + length + CRLF.len();
        if buf.len() < total_needed {
            return Ok(None);
        }

        if &buf[data_start + length..total_needed] != CRLF {
            return Err(ParseError::ProtocolError(
                "bulk string missing trailing CRLF".to_string(),
            ));
        }

        let data = Bytes::copy_from_slice(&buf[data_start..data_start + length]);
        Ok(Some((RespValue::BulkString(data), total_needed)))
    }

    /// Parses an array: `*<count>\r\n<elements...>`
    fn parse_array(&self, buf: &[u8], depth: usize) -> ParseResult<Option<(RespValue, usize)>> {
        debug_assert!(buf[0] == prefix::ARRAY);

        let (count, mut consumed) = match parse_header(buf)? {
            Some(header) => header,
            None => return Ok(None),
        };

        if count == -1 {
            return Ok(Some((RespValue::NullArray, consumed)));
        }

        if count < 0 {
            return Err(ParseError::InvalidArrayLength(count));
        }

        let count = count as usize;
        if count > MAX_ARRAY_LEN {
            return Err(ParseError::MessageTooLarge {
                size: count,
                max: MAX_ARRAY_LEN,
            });
        }

        // The count comes off the wire, so don't trust it for preallocation.
        let mut elements = Vec::with_capacity(count.min(64));

        for _ in 0..count {
            match self.parse_value(&buf[consumed..], depth + 1)? {
                Some((value, element_consumed)) => {
                    elements.push(value);
                    consumed += element_consumed;
                }
                None => return Ok(None),
            }
        }

        Ok(Some((RespValue::Array(elements), consumed)))
    }
}

/// Finds the CRLF that ends the line starting at `buf[0]`.
///
/// Returns the index of the `\r`. A `\r` that is the last buffered byte means
/// the line may still complete. A `\r` followed by anything but `\n`, a bare
/// `\n`, or a line longer than [`MAX_LINE_LEN`] is malformed.
#[inline]
fn read_line(buf: &[u8]) -> ParseResult<Option<usize>> {
    // Only the first MAX_LINE_LEN + 1 bytes can hold a legal terminator.
    let window = &buf[..buf.len().min(MAX_LINE_LEN + 1)];

    let end = match window.iter().position(|&b| b == b'\r' || b == b'\n') {
        Some(pos) => pos,
        None if buf.len() > MAX_LINE_LEN => {
            return Err(ParseError::MessageTooLarge {
                size: buf.len(),
                max: MAX_LINE_LEN,
            })
        }
        None => return Ok(None),
    };

    if buf[end] == b'\n' {
        return Err(ParseError::ProtocolError(
            "LF not preceded by CR".to_string(),
        ));
    }

    match buf.get(end + 1) {
        Some(b'\n') => Ok(Some(end)),
        Some(_) => Err(ParseError::ProtocolError(
            "CR not followed by LF".to_string(),
        )),
        None => Ok(None),
    }
}

/// Parses `+text\r\n` / `-text\r\n`, returning the text and bytes consumed.
fn parse_text(buf: &[u8]) -> ParseResult<Option<(String, usize)>> {
    let end = match read_line(&buf[1..])? {
        Some(pos) => 1 + pos,
        None => return Ok(None),
    };

    let s = std::str::from_utf8(&buf[1..end]).map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
    Ok(Some((s.to_string(), end + CRLF.len())))
}

/// Parses a signed decimal line after the prefix byte: integers and the
/// length headers of bulk strings and arrays.
fn parse_header(buf: &[u8]) -> ParseResult<Option<(i64, usize)>> {
    let end = match read_line(&buf[1..])? {
        Some(pos) => 1 + pos,
        None => return Ok(None),
    };

    let digits = &buf[1..end];
    let n = parse_decimal(digits)
        .ok_or_else(|| ParseError::InvalidInteger(String::from_utf8_lossy(digits).into_owned()))?;

    Ok(Some((n, end + CRLF.len())))
}

/// Canonical signed decimal: optional `-`, no `+`, no leading zeros, no `-0`.
fn parse_decimal(digits: &[u8]) -> Option<i64> {
    let magnitude = digits.strip_prefix(b"-").unwrap_or(digits);

    let canonical = match magnitude {
        [] => false,
        [b'0'] => magnitude.len() == digits.len(),
        [b'0', ..] => false,
        _ => magnitude.iter().all(u8::is_ascii_digit),
    };
    if !canonical {
        return None;
    }

    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Helper function to parse a single RESP message from bytes.
///
/// This is a convenience function for simple use cases.
pub fn parse_message(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    RespParser::new().parse(buf)
}
