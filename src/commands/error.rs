//! Command Errors
//!
//! Everything that can go wrong while interpreting a single command. Each
//! variant renders as the text of a RESP error reply, error class token first,
//! so the dispatcher turns any `Err` into a reply with `to_string()`.

use crate::protocol::FrameError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("ERR empty command")]
    EmptyCommand,

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    /// Carries the lowercase command name, e.g. `set` or `client|setname`
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(String),

    #[error("ERR unknown subcommand '{subcommand}'. Try {command} HELP.")]
    UnknownSubcommand { command: String, subcommand: String },

    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    #[error("ERR invalid expire time in '{0}' command")]
    InvalidExpireTime(String),

    #[error("ERR syntax error")]
    Syntax,

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Result type for command implementations.
pub type CommandResult = Result<crate::protocol::RespValue, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_error_class() {
        assert_eq!(
            CommandError::UnknownCommand("FOOX".into()).to_string(),
            "ERR unknown command 'FOOX'"
        );
        assert_eq!(
            CommandError::WrongArity("get".into()).to_string(),
            "ERR wrong number of arguments for 'get' command"
        );
        assert_eq!(
            CommandError::UnknownSubcommand {
                command: "CLIENT".into(),
                subcommand: "BOGUS".into()
            }
            .to_string(),
            "ERR unknown subcommand 'BOGUS'. Try CLIENT HELP."
        );
        assert!(CommandError::WrongType.to_string().starts_with("WRONGTYPE "));
        assert_eq!(
            CommandError::from(FrameError::NotAnArray).to_string(),
            "ERR invalid command format"
        );
    }
}
