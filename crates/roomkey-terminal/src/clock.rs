//! Wall-clock source for card read timestamps.
//!
//! Loop timing uses `tokio::time`; only the timestamp attached to a card
//! read needs the calendar time, and the terminal may not have one.

use chrono::{DateTime, Utc};

/// Source of the current UTC time.
pub trait TimeSource: Send + Sync {
    /// Current wall-clock time, or `None` when the clock is not set.
    fn now(&self) -> Option<DateTime<Utc>>;
}

/// System clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Option<DateTime<Utc>> {
        // An unset RTC reports the epoch (or earlier).
        let now = Utc::now();
        (now.timestamp() > 0).then_some(now)
    }
}

/// Fixed reading, for tests and clockless setups.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedTimeSource(pub Option<DateTime<Utc>>);

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Option<DateTime<Utc>> {
        self.0
    }
}
