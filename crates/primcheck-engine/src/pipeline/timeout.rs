//! Deadline utilities for bounded runs.

use std::time::{Duration, Instant};

pub(crate) fn deadline_exceeded(deadline: Option<Instant>) -> bool {
    match deadline {
        Some(deadline) => Instant::now() >= deadline,
        None => false,
    }
}

pub(crate) fn overall_timeout_duration(timeout_secs: u64) -> Option<Duration> {
    if timeout_secs == 0 {
        None
    } else {
        Some(Duration::from_secs(timeout_secs))
    }
}

pub(crate) fn deadline_from_timeout_secs(timeout_secs: u64) -> Option<Instant> {
    overall_timeout_duration(timeout_secs).and_then(|t| Instant::now().checked_add(t))
}

/// Milliseconds since `started`, saturating.
pub(crate) fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
