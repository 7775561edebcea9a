//! Command Frames
//!
//! A client request arrives as a RESP array of bulk strings. [`CommandFrame`]
//! is that array with the RESP wrapping removed: an ordered list of byte
//! strings whose first element names the command.

use crate::protocol::types::RespValue;
use bytes::Bytes;
use thiserror::Error;

/// Why a decoded value could not be turned into a [`CommandFrame`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The request was not an array (or was the null array)
    #[error("ERR invalid command format")]
    NotAnArray,

    /// An element of the request array was not a string
    #[error("ERR invalid argument at position {0}")]
    InvalidElement(usize),
}

/// A decoded client request.
///
/// An empty frame is representable; the dispatcher reports it as an error
/// rather than the decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandFrame {
    parts: Vec<Bytes>,
}

impl CommandFrame {
    pub fn new(parts: Vec<Bytes>) -> Self {
        Self { parts }
    }

    /// Number of tokens, command name included.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The command name, uppercased for case-insensitive lookup.
    pub fn name(&self) -> Option<String> {
        self.parts
            .first()
            .map(|name| String::from_utf8_lossy(name).to_ascii_uppercase())
    }

    /// The arguments after the command name.
    pub fn args(&self) -> &[Bytes] {
        self.parts.get(1..).unwrap_or(&[])
    }
}

impl<T: Into<Bytes>> FromIterator<T> for CommandFrame {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<RespValue> for CommandFrame {
    type Error = FrameError;

    fn try_from(value: RespValue) -> Result<Self, Self::Error> {
        let elements = match value {
            RespValue::Array(elements) => elements,
            _ => return Err(FrameError::NotAnArray),
        };

        elements
            .into_iter()
            .enumerate()
            .map(|(i, element)| match element {
                RespValue::BulkString(b) => Ok(b),
                RespValue::SimpleString(s) => Ok(Bytes::from(s)),
                _ => Err(FrameError::InvalidElement(i)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(CommandFrame::new)
    }
}

impl From<CommandFrame> for RespValue {
    fn from(frame: CommandFrame) -> Self {
        RespValue::Array(frame.parts.into_iter().map(RespValue::BulkString).collect())
    }
}
