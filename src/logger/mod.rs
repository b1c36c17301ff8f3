//! Logger module
//!
//! Provides logging utilities for the mock server:
//! - Startup and shutdown logging
//! - Request dumps and access logging
//! - Error and warning logging
//!
//! Every line gets a local timestamp. Before `init()` runs, output goes to
//! stdout/stderr directly.

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::{Config, LoggingConfig};
use crate::http::RequestDump;
use crate::target::ServeTarget;
use chrono::Local;
use std::net::SocketAddr;
use std::path::Path;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    writer::init(
        config.access_log_file.as_deref(),
        config.error_log_file.as_deref(),
    )
}

fn stamp(message: &str) -> String {
    format!("{} {message}", Local::now().format("%Y/%m/%d %H:%M:%S"))
}

/// Write to info/access log
fn write_info(message: &str) {
    let line = stamp(message);
    match writer::get() {
        Some(w) => w.write_info(&line),
        None => println!("{line}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    let line = stamp(message);
    match writer::get() {
        Some(w) => w.write_error(&line),
        None => eprintln!("{line}"),
    }
}

pub fn log_server_start(
    addr: &SocketAddr,
    target: &ServeTarget,
    config_file: Option<&Path>,
    config: &Config,
) {
    write_info("======================================");
    write_info("Mock server started successfully");
    write_info(&format!("Listening on: http://{addr}/"));
    write_info(&format!("Serving: {}", target.path().display()));
    write_info(&format!(
        "Content-Type: {} (.{})",
        target.content_type(),
        target.extension()
    ));
    if let Some(path) = config_file {
        write_info(&format!("Using config file: {}", path.display()));
    }
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================");
}

pub fn log_missing_target(target: &ServeTarget) {
    log_warning(&format!(
        "{} does not exist yet, requests will get 404 until it does",
        target.path().display()
    ));
}

/// Log the full request as it was received
pub fn log_request_dump(dump: &RequestDump) {
    write_info(&format!("[Request]\n{dump}"));
}

pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_shutdown(signal: &str) {
    write_info(&format!("[Shutdown] {signal} received, stopping server"));
}
