//! Logger module
//!
//! Thin named helpers over `tracing`, plus subscriber setup:
//! - Server lifecycle logging
//! - Per-request API and access logging
//! - Error and warning logging

mod format;

pub use format::AccessLogEntry;

use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LoggingConfig};

/// Install the global subscriber
///
/// `RUST_LOG` wins over `logging.level`. Should be called once at startup.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.format.as_str() {
        "json" => builder.json().try_init()?,
        _ => builder.try_init()?,
    }
    Ok(())
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!(
        %addr,
        environment = %config.app.environment,
        backend = ?config.store.backend,
        workers = ?config.server.workers,
        "Items API listening on http://{addr}"
    );
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

pub fn log_api_request(method: &str, path: &str, status: u16) {
    tracing::debug!(method, path, status, "api request");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}

pub fn log_shutdown(signal: &str) {
    tracing::info!(signal, "Shutdown requested, no longer accepting connections");
}
