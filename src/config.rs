//! Server configuration.
//!
//! Every option can be given on the command line or through a `KVSTORE_*`
//! environment variable. Command-line values take precedence.

use clap::Parser;
use std::time::Duration;

/// Command-line arguments for the kvstore server
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "kvstore")]
#[command(version)]
#[command(about = "A Redis-compatible in-memory key-value server", long_about = None)]
pub struct Config {
    /// Host to bind to
    #[arg(short = 'H', long, env = "KVSTORE_HOST", default_value = crate::DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "KVSTORE_PORT", default_value_t = crate::DEFAULT_PORT)]
    pub port: u16,

    /// Seconds a client may stay silent before it is disconnected (0 = never)
    #[arg(long, env = "KVSTORE_IDLE_TIMEOUT", default_value_t = crate::DEFAULT_IDLE_TIMEOUT_SECS)]
    pub idle_timeout: u64,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long, env = "KVSTORE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The idle window, or `None` when idle clients are never dropped.
    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.idle_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            idle_timeout: crate::DEFAULT_IDLE_TIMEOUT_SECS,
            log_level: "info".to_string(),
        }
    }
}
