//! Logging utilities for DBX streams
//!
//! Provides helpers for initializing tracing subscribers. Stream events are
//! emitted under three targets:
//! - [`OPTIMIZER`]: pushdown decisions per pipeline step
//! - [`EXECUTOR`]: execution path and parallel stage choices
//! - [`CLOSE`]: suppressed or late close failures

#[cfg(feature = "logging")]
use tracing_subscriber::{EnvFilter, fmt};

/// Optimizer rule decisions
pub const OPTIMIZER: &str = "dbx_stream::optimizer";
/// Dispatcher path and terminal execution
pub const EXECUTOR: &str = "dbx_stream::executor";
/// Close registry failures
pub const CLOSE: &str = "dbx_stream::close";

/// Filter directives used when `RUST_LOG` is not set.
///
/// Other crates stay at `warn`; stream targets log at `level`. Close failures
/// are always kept at `warn` or more verbose.
pub fn default_directives(level: &str) -> String {
    let close = match level {
        "error" | "off" => "warn",
        other => other,
    };
    format!("warn,{OPTIMIZER}={level},{EXECUTOR}={level},{CLOSE}={close}")
}

/// Initialize logging with default settings
///
/// # Environment Variables
/// - `RUST_LOG` - Log level filter (default: stream targets at "info")
#[cfg(feature = "logging")]
pub fn init() {
    init_with_level("info")
}

/// Initialize logging with a specific level for the stream targets
///
/// # Arguments
/// * `level` - Log level (trace, debug, info, warn, error)
#[cfg(feature = "logging")]
pub fn init_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .try_init();
}

/// Initialize logging for tests
///
/// Verbose enough to see every pushdown decision.
#[cfg(feature = "logging")]
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new(default_directives("trace")))
        .with_test_writer()
        .try_init();
}

// Stub implementations when logging feature is disabled
#[cfg(not(feature = "logging"))]
pub fn init() {}

#[cfg(not(feature = "logging"))]
pub fn init_with_level(_level: &str) {}

#[cfg(not(feature = "logging"))]
pub fn init_test() {}
