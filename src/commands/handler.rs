//! Command Handler Module
//!
//! This module implements the Redis-compatible commands for kvstore.
//! It turns a decoded request into a [`CommandFrame`], checks it against the
//! [`CommandTable`] and runs the registered implementation.
//!
//! ## Supported Commands
//!
//! ### Key Commands
//! - `SET key value [EX seconds | PX milliseconds]` - Set a key
//! - `GET key` - Get a key's value
//! - `DEL key` - Delete a key
//! - `EXISTS key` - Check if a key is present
//! - `EXPIRE key seconds` - Set expiry
//!
//! ### Server Commands
//! - `PING` - Test connection
//! - `INFO` - Server information
//! - `COMMAND` - List commands
//! - `CLIENT LIST | SETNAME name | GETNAME` - Client placeholders
//! - `CONFIG GET parameter | SET parameter value` - No configurable parameters
//! - `HELLO [args]` - Server identity
//! - `AUTH`, `SELECT` - Accepted and ignored
//!
//! ## Expiry
//!
//! GET treats an expired key as absent and evicts it. EXISTS, DEL and EXPIRE
//! look at raw presence, so an expired key that has not been read since it
//! expired still counts as present for them.

use crate::commands::error::{CommandError, CommandResult};
use crate::commands::table::{Arity, CommandFn, CommandTable};
use crate::connection::ConnectionStats;
use crate::protocol::{CommandFrame, RespValue};
use crate::storage::{DataType, Entry, StorageEngine};
use bytes::Bytes;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Handles Redis commands by dispatching them to the registered implementation.
///
/// Cloning is cheap: the storage engine, the command table and the stats are
/// all shared.
#[derive(Clone)]
pub struct CommandHandler {
    /// The storage engine
    storage: Arc<StorageEngine>,
    /// Registered commands
    table: Arc<CommandTable>,
    /// Connection counters, reported by INFO
    stats: Arc<ConnectionStats>,
    /// Server start time for INFO command
    start_time: Instant,
}

impl CommandHandler {
    /// Creates a new command handler with the given storage engine and the
    /// built-in command set.
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self {
            storage,
            table: Arc::new(builtin_commands()),
            stats: Arc::new(ConnectionStats::new()),
            start_time: Instant::now(),
        }
    }

    /// Reports the given connection counters in INFO instead of a private set.
    pub fn with_stats(mut self, stats: Arc<ConnectionStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Adds or replaces a command. Clones made before this call keep the old table.
    pub fn register(&mut self, name: &'static str, arity: Arity, run: CommandFn) {
        Arc::make_mut(&mut self.table).register(name, arity, run);
    }

    /// The storage engine this handler works against.
    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    /// Executes a decoded request and returns the reply.
    ///
    /// Never fails: anything wrong with the request becomes an error reply.
    pub fn execute(&self, command: RespValue) -> RespValue {
        match CommandFrame::try_from(command) {
            Ok(frame) => self.handle(&frame),
            Err(e) => RespValue::error(e.to_string()),
        }
    }

    /// Runs one command frame and returns the reply.
    pub fn handle(&self, frame: &CommandFrame) -> RespValue {
        match self.dispatch(frame) {
            Ok(reply) => reply,
            Err(e) => {
                debug!(command = ?frame.name(), error = %e, "Command failed");
                RespValue::error(e.to_string())
            }
        }
    }

    fn dispatch(&self, frame: &CommandFrame) -> CommandResult {
        let name = frame.name().ok_or(CommandError::EmptyCommand)?;

        let spec = self
            .table
            .lookup(&name)
            .ok_or_else(|| CommandError::UnknownCommand(name.clone()))?;

        if !spec.arity.accepts(frame.len()) {
            return Err(CommandError::WrongArity(spec.name.to_ascii_lowercase()));
        }

        (spec.run)(self, frame.args())
    }

    // ========================================================================
    // Key Commands
    // ========================================================================

    /// SET key value [EX seconds | PX milliseconds]
    fn cmd_set(&self, args: &[Bytes]) -> CommandResult {
        let key = args[0].clone();
        let value = args[1].clone();

        let entry = match args.get(2..) {
            Some([modifier, amount]) => {
                let unit = match uppercase(modifier).as_str() {
                    "EX" => TtlUnit::Seconds,
                    "PX" => TtlUnit::Millis,
                    _ => return Err(CommandError::Syntax),
                };
                let deadline = deadline_from_now(parse_integer(amount)?, unit, "set")?;
                Entry::string(value).with_expiry(deadline)
            }
            _ => Entry::string(value),
        };

        self.storage.set_entry(key, entry);
        Ok(RespValue::ok())
    }

    /// GET key
    fn cmd_get(&self, args: &[Bytes]) -> CommandResult {
        let key = &args[0];

        match self.storage.get(key) {
            None => Ok(RespValue::null()),
            Some(entry) if entry.is_expired() => {
                self.storage.evict_if_expired(key);
                Ok(RespValue::null())
            }
            Some(entry) if entry.data_type != DataType::String => Err(CommandError::WrongType),
            Some(entry) => Ok(RespValue::bulk_string(entry.value)),
        }
    }

    /// DEL key
    fn cmd_del(&self, args: &[Bytes]) -> CommandResult {
        Ok(RespValue::integer(self.storage.delete(&args[0]) as i64))
    }

    /// EXISTS key
    fn cmd_exists(&self, args: &[Bytes]) -> CommandResult {
        Ok(RespValue::integer(self.storage.exists(&args[0]) as i64))
    }

    /// EXPIRE key seconds
    fn cmd_expire(&self, args: &[Bytes]) -> CommandResult {
        let seconds = parse_integer(&args[1])?;
        let deadline = deadline_from_now(seconds, TtlUnit::Seconds, "expire")?;

        Ok(RespValue::integer(self.storage.expire(&args[0], deadline) as i64))
    }

    // ========================================================================
    // Server Commands
    // ========================================================================

    /// PING
    fn cmd_ping(&self, _args: &[Bytes]) -> CommandResult {
        Ok(RespValue::pong())
    }

    /// INFO
    fn cmd_info(&self, _args: &[Bytes]) -> CommandResult {
        let storage = self.storage.stats();
        let mem = self.storage.memory_info();
        let expires = self.storage.expiring_count();

        let avg_ttl = self.storage.avg_ttl().map_or(0, |ttl| ttl.as_millis());

        let keyspace = if mem.keys > 0 {
            format!(
                "db0:keys={},expires={},avg_ttl={}\r\n",
                mem.keys, expires, avg_ttl
            )
        } else {
            String::new()
        };

        let info = format!(
            "# Server\r\n\
             kvstore_version:{}\r\n\
             redis_mode:standalone\r\n\
             os:{}\r\n\
             arch_bits:{}\r\n\
             process_id:{}\r\n\
             uptime_in_seconds:{}\r\n\
             \r\n\
             # Clients\r\n\
             connected_clients:{}\r\n\
             \r\n\
             # Memory\r\n\
             used_memory:{}\r\n\
             used_memory_human:{}\r\n\
             \r\n\
             # Stats\r\n\
             total_connections_received:{}\r\n\
             total_commands_processed:{}\r\n\
             total_net_input_bytes:{}\r\n\
             total_net_output_bytes:{}\r\n\
             total_reads_processed:{}\r\n\
             total_writes_processed:{}\r\n\
             total_deletes_processed:{}\r\n\
             expired_keys:{}\r\n\
             \r\n\
             # Keyspace\r\n\
             {}",
            crate::VERSION,
            std::env::consts::OS,
            usize::BITS,
            std::process::id(),
            self.start_time.elapsed().as_secs(),
            self.stats.active_connections.load(Ordering::Relaxed),
            mem.used_memory,
            human_bytes(mem.used_memory),
            self.stats.connections_accepted.load(Ordering::Relaxed),
            self.stats.commands_processed.load(Ordering::Relaxed),
            self.stats.bytes_read.load(Ordering::Relaxed),
            self.stats.bytes_written.load(Ordering::Relaxed),
            storage.get_ops,
            storage.set_ops,
            storage.del_ops,
            storage.expired,
            keyspace,
        );

        Ok(RespValue::bulk_string(Bytes::from(info)))
    }

    /// COMMAND
    fn cmd_command(&self, _args: &[Bytes]) -> CommandResult {
        let values = self
            .table
            .names()
            .map(|name| RespValue::bulk_string(Bytes::from_static(name.as_bytes())))
            .collect();

        Ok(RespValue::array(values))
    }

    /// CLIENT LIST | SETNAME name | GETNAME
    fn cmd_client(&self, args: &[Bytes]) -> CommandResult {
        let subcommand = uppercase(&args[0]);

        match subcommand.as_str() {
            "LIST" => Ok(RespValue::bulk_string(Bytes::from_static(
                b"id=1 addr=127.0.0.1:0 fd=0 name= db=0 cmd=client|list\n",
            ))),
            "SETNAME" => {
                if args.len() != 2 {
                    return Err(CommandError::WrongArity("client|setname".to_string()));
                }
                Ok(RespValue::ok())
            }
            "GETNAME" => Ok(RespValue::null()),
            _ => Err(CommandError::UnknownSubcommand {
                command: "CLIENT".to_string(),
                subcommand,
            }),
        }
    }

    /// CONFIG GET parameter | SET parameter value
    fn cmd_config(&self, args: &[Bytes]) -> CommandResult {
        let subcommand = uppercase(&args[0]);

        match subcommand.as_str() {
            "GET" => {
                if args.len() < 2 {
                    return Err(CommandError::WrongArity("config|get".to_string()));
                }
                // No configurable parameters are modelled
                Ok(RespValue::array(vec![]))
            }
            "SET" => Ok(RespValue::ok()),
            _ => Err(CommandError::UnknownSubcommand {
                command: "CONFIG".to_string(),
                subcommand,
            }),
        }
    }

    /// HELLO [protover [AUTH username password] [SETNAME clientname]]
    fn cmd_hello(&self, _args: &[Bytes]) -> CommandResult {
        let field = |name: &'static str| RespValue::bulk_string(Bytes::from_static(name.as_bytes()));

        Ok(RespValue::array(vec![
            field("server"),
            field("kvstore"),
            field("version"),
            field(crate::VERSION),
            field("proto"),
            RespValue::integer(2),
            field("id"),
            RespValue::integer(1),
            field("mode"),
            field("standalone"),
            field("role"),
            field("master"),
            field("modules"),
            RespValue::array(vec![]),
        ]))
    }

    /// AUTH / SELECT
    fn cmd_accept(&self, _args: &[Bytes]) -> CommandResult {
        Ok(RespValue::ok())
    }
}

/// The command set every handler starts with.
fn builtin_commands() -> CommandTable {
    let mut table = CommandTable::new();

    table.register("PING", Arity::Exact(1), CommandHandler::cmd_ping);
    table.register("SET", Arity::OneOf(&[3, 5]), CommandHandler::cmd_set);
    table.register("GET", Arity::Exact(2), CommandHandler::cmd_get);
    table.register("DEL", Arity::Exact(2), CommandHandler::cmd_del);
    table.register("EXISTS", Arity::Exact(2), CommandHandler::cmd_exists);
    table.register("EXPIRE", Arity::Exact(3), CommandHandler::cmd_expire);
    table.register("INFO", Arity::Exact(1), CommandHandler::cmd_info);
    table.register("COMMAND", Arity::Exact(1), CommandHandler::cmd_command);
    table.register("CLIENT", Arity::AtLeast(2), CommandHandler::cmd_client);
    table.register("CONFIG", Arity::AtLeast(2), CommandHandler::cmd_config);
    table.register("HELLO", Arity::AtLeast(1), CommandHandler::cmd_hello);
    table.register("AUTH", Arity::Any, CommandHandler::cmd_accept);
    table.register("SELECT", Arity::Any, CommandHandler::cmd_accept);

    table
}

// ============================================================================
// Helper functions
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TtlUnit {
    Seconds,
    Millis,
}

/// Turns a relative TTL into an absolute deadline.
///
/// Zero and negative TTLs yield a deadline at or before now, i.e. a key that
/// is already expired. A TTL past what the clock can represent is rejected.
fn deadline_from_now(amount: i64, unit: TtlUnit, command: &str) -> Result<Instant, CommandError> {
    let now = Instant::now();
    let magnitude = amount.unsigned_abs();
    let span = match unit {
        TtlUnit::Seconds => Duration::from_secs(magnitude),
        TtlUnit::Millis => Duration::from_millis(magnitude),
    };

    if amount >= 0 {
        now.checked_add(span)
            .ok_or_else(|| CommandError::InvalidExpireTime(command.to_string()))
    } else {
        Ok(now.checked_sub(span).unwrap_or(now))
    }
}

fn parse_integer(arg: &[u8]) -> Result<i64, CommandError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(CommandError::NotAnInteger)
}

fn uppercase(arg: &[u8]) -> String {
    String::from_utf8_lossy(arg).to_ascii_uppercase()
}

fn human_bytes(n: usize) -> String {
    const UNITS: [&str; 4] = ["B", "K", "M", "G"];

    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{}B", n)
    } else {
        format!("{:.2}{}", value, UNITS[unit])
    }
}
