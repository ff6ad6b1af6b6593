//! Process-wide tracing setup shared by the claimdesk binaries.

/// Initialize tracing with the default `info` filter.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_with_default("info");
}

/// Tracing configuration (filters, layers).
pub mod tracing;
