//! Time source for award timestamps.

use crate::Timestamp;
use chrono::Utc;

/// Source of `created_at` timestamps for the write path.
///
/// Production uses [`SystemClock`]; tests inject a manual clock so that
/// ordering assertions never depend on wall-clock timing.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}
