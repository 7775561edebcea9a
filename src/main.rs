//! kvstore - A Redis-Compatible In-Memory Key-Value Server
//!
//! This is the main entry point for the kvstore server.
//! It sets up logging, the TCP listener and the shared storage engine, then
//! serves each incoming connection on its own task.

use anyhow::Context;
use clap::Parser;
use kvstore::commands::CommandHandler;
use kvstore::config::Config;
use kvstore::connection::{handle_connection, ConnectionStats};
use kvstore::storage::StorageEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments and KVSTORE_* variables
    let config = Config::parse();

    // Set up logging; RUST_LOG wins over --log-level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Create the storage engine (shared across all connections)
    let storage = Arc::new(StorageEngine::new());

    // Create connection statistics
    let stats = Arc::new(ConnectionStats::new());

    // One handler, cloned per connection; clones share storage, registry and stats
    let handler = CommandHandler::new(storage).with_stats(Arc::clone(&stats));

    // Bind the TCP listener
    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;

    info!(
        version = kvstore::VERSION,
        address = %config.bind_address(),
        idle_timeout_secs = config.idle_timeout,
        "kvstore listening"
    );

    // Main accept loop, until Ctrl+C
    tokio::select! {
        _ = accept_loop(listener, handler, stats, config.idle_timeout()) => {}
        result = signal::ctrl_c() => {
            result.context("failed to listen for Ctrl+C")?;
            info!("Shutdown signal received, stopping server...");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    handler: CommandHandler,
    stats: Arc<ConnectionStats>,
    idle_timeout: Option<Duration>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    error!(client = %addr, error = %e, "Failed to set TCP_NODELAY");
                }

                let handler = handler.clone();
                let stats = Arc::clone(&stats);

                // Spawn a task to handle this connection
                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats, idle_timeout).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
