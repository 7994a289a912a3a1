//! Logging setup
//!
//! Installs a `tracing` fmt subscriber filtered by `RUST_LOG`, falling back
//! to the given directive. Safe to call more than once; only the first call
//! installs a subscriber.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_DIRECTIVE: &str = "mcp_registry_core=info,mcp_registry_storage=info";

/// Initialize global logging. Returns `false` if a subscriber was already set.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Test-friendly logging: output captured per test by the harness.
pub fn init_test_logging() -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .is_ok()
}
