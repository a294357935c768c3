//! Test clock.

use chrono::{DateTime, TimeZone, Utc};
use eventline_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// 2026-01-15 10:00:00 UTC, the instant most tests use.
    ///
    /// # Panics
    ///
    /// Panics only if chrono rejects the constant timestamp.
    #[must_use]
    pub fn default_instant() -> Self {
        Self(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0)
                .single()
                .expect("valid constant timestamp"),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
