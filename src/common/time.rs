//! Simple time helpers used for latency reporting.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current timestamp in milliseconds since the Unix epoch.
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Milliseconds elapsed since `start_ms`, saturating at zero and `u32::MAX`.
pub fn elapsed_ms(start_ms: u128) -> u32 {
    u32::try_from(now_ms().saturating_sub(start_ms)).unwrap_or(u32::MAX)
}
