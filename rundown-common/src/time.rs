//! Wall clock utilities
//!
//! The engine never reads the system clock directly. It asks a [`Clock`], so
//! tests can drive time explicitly with [`ManualClock`].

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds between two instants (`later - earlier`, may be negative)
pub fn millis_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_milliseconds()
}

/// Shift an instant by a signed number of milliseconds
pub fn add_millis(instant: DateTime<Utc>, millis: i64) -> DateTime<Utc> {
    instant + Duration::milliseconds(millis)
}

/// Running time of a pausable timer at `now`
///
/// Frozen at `paused_at` while paused; `accumulated_pause` covers pauses that
/// already ended.
pub fn running_millis(
    started_at: DateTime<Utc>,
    paused_at: Option<DateTime<Utc>>,
    accumulated_pause: i64,
    now: DateTime<Utc>,
) -> i64 {
    millis_between(started_at, paused_at.unwrap_or(now)) - accumulated_pause
}

/// Source of "now" for the engine
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    /// Clock starting at a fixed, readable instant
    pub fn at_epoch() -> Self {
        Self::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 19, 0, 0)
                .single()
                .unwrap_or_default(),
        )
    }

    pub fn advance(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.millis.store(instant.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.millis.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_manual_clock_advances_exactly() {
        let clock = ManualClock::at_epoch();
        let t0 = clock.now();
        clock.advance(10_000);
        assert_eq!(millis_between(t0, clock.now()), 10_000);
        clock.advance(-500);
        assert_eq!(millis_between(t0, clock.now()), 9_500);
    }

    #[test]
    fn test_add_millis_round_trip() {
        let t0 = now();
        let later = add_millis(t0, 1_234);
        assert_eq!(millis_between(t0, later), 1_234);
        assert_eq!(millis_between(later, t0), -1_234);
    }
}
