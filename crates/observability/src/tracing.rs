//! Tracing/logging initialization.
//!
//! Events are written to stderr as JSON so command output on stdout stays
//! machine-readable.

use tracing_subscriber::EnvFilter;

/// Initialize tracing with `RUST_LOG`, falling back to `default_directive`.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_with_default(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
