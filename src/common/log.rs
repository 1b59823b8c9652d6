//! Structured logging emitting JSON lines through `tracing`.
//!
//! Prediction events carry the same keys everywhere: `ev`, `code`, `dur_ms`.

use tracing_subscriber::EnvFilter;

/// Install the JSON subscriber. Safe to call more than once; later calls are no-ops.
pub fn init(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
