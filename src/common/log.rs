//! Logging utilities on top of `tracing`.
//!
//! Service entry points emit one event per call carrying the `module`, `ev`,
//! `code` and `dur_ms` fields so the output stays greppable as JSON-ish lines.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "cardiorisk=info,tower_http=info";

/// Install the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

/// Emit a structured event matching the documented schema.
pub fn log_event(level: Level, module: &str, event: &str, code: u32, dur_ms: u128) {
    let dur_ms = dur_ms as u64;
    match level {
        Level::ERROR => tracing::error!(module, ev = event, code, dur_ms),
        Level::WARN => tracing::warn!(module, ev = event, code, dur_ms),
        Level::INFO => tracing::info!(module, ev = event, code, dur_ms),
        Level::DEBUG => tracing::debug!(module, ev = event, code, dur_ms),
        _ => tracing::trace!(module, ev = event, code, dur_ms),
    }
}

/// Log the outcome of a service call, choosing the level from the result.
pub fn log_outcome<T>(
    module: &str,
    event: &str,
    result: &crate::common::RiskResult<T>,
    dur_ms: u128,
) {
    match result {
        Ok(_) => log_event(Level::INFO, module, event, 0, dur_ms),
        Err(err) => {
            tracing::warn!(error = %err, "{module}::{event} failed");
            log_event(Level::WARN, module, event, err.code() as u32, dur_ms);
        }
    }
}
