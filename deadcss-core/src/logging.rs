//! Structured logging using **tracing**.
//!
//! Library code only emits events; installing a subscriber is left to the
//! binaries. Both binaries write to stderr: the CLI keeps stdout for the
//! report and the language server uses stdout for the protocol.

use tracing::{error, info, warn};

/// Initializes the global tracing subscriber with JSON output on stderr.
///
/// Call once at startup. Safe to call when a subscriber is already set (the
/// second install is ignored), which keeps tests and embedders happy.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=deadcss_core=debug`)
pub fn init_structured_logging() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Logs a warning event.
pub fn log_warn(message: &str) {
    warn!(detail = %message);
}

/// Logs an info event.
pub fn log_info(message: &str) {
    info!(detail = %message);
}

/// Logs an error event.
pub fn log_error(message: &str) {
    error!(detail = %message);
}

/// Logs a named event, choosing the level from the event name.
pub fn log_event(event: &str, detail: &str) {
    match event.to_uppercase().as_str() {
        "ERROR" => error!(event = %event, detail = %detail),
        "WARN" | "WARNING" => warn!(event = %event, detail = %detail),
        _ => info!(event = %event, detail = %detail),
    }
}
