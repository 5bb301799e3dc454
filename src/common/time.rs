//! Simple time helpers used by multiple services.

use std::time::Instant;

use chrono::{DateTime, Utc};

/// Current wall-clock time, used for artefact metadata.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds elapsed since `start`.
pub fn elapsed_ms(start: Instant) -> u128 {
    start.elapsed().as_millis()
}
