//! Logger module
//!
//! Provides logging utilities for the static server:
//! - Startup banner and shutdown logging
//! - Error, warning and debug logging with level filtering
//! - File-based logging support
//!
//! No per-request access log is written.

pub mod writer;

use crate::config::{AppState, LogLevel, LoggingConfig};
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    writer::init(
        config.level,
        config.info_log_file.as_deref(),
        config.error_log_file.as_deref(),
    )
}

fn write(level: LogLevel, message: &str) {
    if let Some(writer) = writer::try_get() {
        writer.write(level, message);
    } else if level <= LogLevel::Warn {
        eprintln!("{}", writer::format_line(level, message));
    } else if level <= LogLevel::Info {
        println!("{}", writer::format_line(level, message));
    }
}

pub fn log_server_start(addr: &SocketAddr, state: &AppState) {
    let config = &state.config;
    log_info("======================================");
    log_info("Static server started successfully");
    log_info(&format!("Listening on: http://{addr}"));
    log_info(&format!("Content root: {}", state.site.root));
    log_info(&format!("Landing path: {}", state.site.landing_path));
    log_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    if let Some(max_conn) = config.performance.max_connections {
        log_info(&format!("Max connections: {max_conn}"));
    }
    log_info("======================================");
}

pub fn log_shutdown(active_connections: usize) {
    log_info(&format!(
        "Shutdown requested, listener closed ({active_connections} connections still in flight)"
    ));
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    log_debug(&format!("Connection closed with error: {err}"));
}

pub fn log_error(message: &str) {
    write(LogLevel::Error, message);
}

pub fn log_warning(message: &str) {
    write(LogLevel::Warn, message);
}

pub fn log_info(message: &str) {
    write(LogLevel::Info, message);
}

pub fn log_debug(message: &str) {
    write(LogLevel::Debug, message);
}
