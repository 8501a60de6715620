//! Tracing initialization for embedders and tests.

use tracing_subscriber::EnvFilter;

/// Installs a formatted tracing subscriber honouring `RUST_LOG`, and
/// bridges `log` macros into it. Safe to call more than once; later
/// calls are no-ops.
pub fn init() {
    let _ = tracing_log::LogTracer::init();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
