//! Logging bootstrap for hosts embedding the sync adapter.
//!
//! Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
//! `info` when the variable is unset or unparsable.

#[cfg(test)]
#[path = "logging_test.rs"]
mod logging_test;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, thiserror::Error)]
#[error("logging init failed: {0}")]
pub struct LogInitError(String);

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`LogInitError`] if a global subscriber is already installed.
pub fn init() -> Result<(), LogInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| LogInitError(e.to_string()))
}
