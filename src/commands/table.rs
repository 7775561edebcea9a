//! Command Registry
//!
//! Maps an uppercase command name to its arity rule and implementation.
//! Commands are added by registering them, not by growing a dispatch `match`.

use crate::commands::error::CommandResult;
use crate::commands::CommandHandler;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;

/// A command implementation. Receives the arguments after the command name.
pub type CommandFn = fn(&CommandHandler, &[Bytes]) -> CommandResult;

/// How many tokens a command accepts, counting the command name itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    OneOf(&'static [usize]),
    Any,
}

impl Arity {
    pub fn accepts(&self, tokens: usize) -> bool {
        match *self {
            Arity::Exact(n) => tokens == n,
            Arity::AtLeast(n) => tokens >= n,
            Arity::OneOf(allowed) => allowed.contains(&tokens),
            Arity::Any => true,
        }
    }
}

/// A registered command.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    /// Uppercase name
    pub name: &'static str,
    pub arity: Arity,
    pub run: CommandFn,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// The set of commands a [`CommandHandler`] can dispatch to.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    /// Registration order, which is also the order COMMAND reports
    specs: Vec<CommandSpec>,
    index: HashMap<&'static str, usize>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command, replacing any earlier registration under the same name.
    ///
    /// `name` must be uppercase; lookups are made with uppercased input.
    pub fn register(&mut self, name: &'static str, arity: Arity, run: CommandFn) {
        debug_assert_eq!(name, name.to_ascii_uppercase());

        let spec = CommandSpec { name, arity, run };
        if let Some(&i) = self.index.get(name) {
            self.specs[i] = spec;
            return;
        }

        self.index.insert(name, self.specs.len());
        self.specs.push(spec);
    }

    pub fn lookup(&self, name: &str) -> Option<&CommandSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(|spec| spec.name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RespValue;

    fn noop(_: &CommandHandler, _: &[Bytes]) -> CommandResult {
        Ok(RespValue::ok())
    }

    fn other(_: &CommandHandler, _: &[Bytes]) -> CommandResult {
        Ok(RespValue::integer(2))
    }

    #[test]
    fn test_arity_rules() {
        assert!(Arity::Exact(2).accepts(2));
        assert!(!Arity::Exact(2).accepts(3));
        assert!(Arity::AtLeast(2).accepts(5));
        assert!(!Arity::AtLeast(2).accepts(1));
        assert!(Arity::OneOf(&[3, 5]).accepts(5));
        assert!(!Arity::OneOf(&[3, 5]).accepts(4));
        assert!(Arity::Any.accepts(1));
    }

    #[test]
    fn test_register_and_lookup() {
        let mut table = CommandTable::new();
        table.register("PING", Arity::Exact(1), noop);
        table.register("GET", Arity::Exact(2), noop);

        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("GET").unwrap().arity, Arity::Exact(2));
        assert!(table.lookup("get").is_none());
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["PING", "GET"]);
    }

    #[test]
    fn test_reregister_keeps_position() {
        let mut table = CommandTable::new();
        table.register("A", Arity::Any, noop);
        table.register("B", Arity::Any, noop);
        table.register("A", Arity::Exact(1), other);

        assert_eq!(table.len(), 2);
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(table.lookup("A").unwrap().arity, Arity::Exact(1));
    }
}
