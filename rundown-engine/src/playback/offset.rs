//! Schedule drift tracking
//!
//! Offset compares how long the show has been running with where the plan
//! says it should be given the active entry and its progress. Positive values
//! mean the show is behind.
//!
//! In relative mode the show clock starts when the show actually started and
//! stops while paused. In absolute mode it is the wall clock since the planned
//! show start, so a late start or a pause both count as lateness.

use crate::playback::session::PlaybackSession;
use chrono::{DateTime, Utc};
use rundown_common::events::{OffsetMode, OffsetSnapshot};
use rundown_common::time::{add_millis, millis_between};
use rundown_common::RundownEntry;

/// Computes [`OffsetSnapshot`] values on demand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OffsetTracker {
    pub mode: OffsetMode,
    /// Wall-clock instant the show is planned to begin at
    ///
    /// Absolute mode falls back to the actual show start when unset.
    pub planned_start: Option<DateTime<Utc>>,
}

impl OffsetTracker {
    pub fn new(mode: OffsetMode) -> Self {
        Self {
            mode,
            planned_start: None,
        }
    }

    /// Offset at `now`
    ///
    /// Zero everywhere while no show is running.
    pub fn compute(
        &self,
        session: &PlaybackSession,
        active: Option<&RundownEntry>,
        total_duration: i64,
        now: DateTime<Utc>,
    ) -> OffsetSnapshot {
        let (Some(show_started_at), Some(entry)) = (session.show_started_at, active) else {
            return OffsetSnapshot {
                mode: self.mode,
                ..Default::default()
            };
        };

        let (anchor, paused) = match self.mode {
            OffsetMode::Relative => (
                show_started_at,
                session.show_paused + session.pause_in_progress(now),
            ),
            OffsetMode::Absolute => (self.planned_start.unwrap_or(show_started_at), 0),
        };
        let actual = millis_between(anchor, now) - paused;
        let progress = session
            .elapsed_at(now)
            .unwrap_or(0)
            .clamp(0, entry.duration.max(0));
        let planned = entry.time_start + progress;

        let offset = actual - planned;
        let bound = entry.duration.max(0);
        let expected_end = total_duration + offset;

        OffsetSnapshot {
            mode: self.mode,
            offset,
            relative_offset: offset.clamp(-bound, bound),
            expected_end: Some(expected_end),
            expected_end_at: Some(add_millis(anchor, paused + expected_end)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rundown::store::tests::{build, event};
    use crate::rundown::NormalisedRundown;
    use rundown_common::time::{Clock, ManualClock};

    fn rundown() -> NormalisedRundown {
        build(vec![
            event("e1", 300_000),
            event("e2", 600_000),
            event("e3", 300_000),
        ])
    }

    fn offset_of(
        session: &PlaybackSession,
        rundown: &NormalisedRundown,
        now: DateTime<Utc>,
    ) -> OffsetSnapshot {
        let active = session
            .active_entry_id
            .as_deref()
            .and_then(|id| rundown.get(id));
        OffsetTracker::default().compute(session, active, rundown.total_duration, now)
    }

    #[test]
    fn test_on_plan_offset_is_zero_at_each_start() {
        let rundown = rundown();
        let clock = ManualClock::at_epoch();
        let mut session = PlaybackSession::new();

        session.arm(&rundown, "e1", clock.now()).unwrap();
        session.play(&rundown, clock.now()).unwrap();
        assert_eq!(offset_of(&session, &rundown, clock.now()).offset, 0);

        clock.advance(150_000);
        assert_eq!(offset_of(&session, &rundown, clock.now()).offset, 0);

        clock.advance(150_000);
        session.advance(&rundown, clock.now()).unwrap();
        let snapshot = offset_of(&session, &rundown, clock.now());
        assert_eq!(snapshot.offset, 0);
        assert_eq!(snapshot.expected_end, Some(1_200_000));
    }

    #[test]
    fn test_overrun_puts_show_behind() {
        let rundown = rundown();
        let clock = ManualClock::at_epoch();
        let t0 = clock.now();
        let mut session = PlaybackSession::new();

        session.arm(&rundown, "e1", t0).unwrap();
        session.play(&rundown, t0).unwrap();
        clock.advance(420_000);

        let running = offset_of(&session, &rundown, clock.now());
        assert_eq!(running.offset, 120_000);
        assert_eq!(running.relative_offset, 120_000);

        session.advance(&rundown, clock.now()).unwrap();
        let snapshot = offset_of(&session, &rundown, clock.now());
        assert_eq!(snapshot.offset, 120_000);
        assert_eq!(snapshot.expected_end, Some(1_320_000));
        assert_eq!(snapshot.expected_end_at, Some(add_millis(t0, 1_320_000)));
    }

    #[test]
    fn test_relative_offset_bounded_by_duration() {
        let rundown = build(vec![event("short", 10_000), event("next", 10_000)]);
        let clock = ManualClock::at_epoch();
        let mut session = PlaybackSession::new();

        session.arm(&rundown, "short", clock.now()).unwrap();
        session.play(&rundown, clock.now()).unwrap();
        clock.advance(60_000);

        let snapshot = offset_of(&session, &rundown, clock.now());
        assert_eq!(snapshot.offset, 50_000);
        assert_eq!(snapshot.relative_offset, 10_000);
    }

    #[test]
    fn test_pause_does_not_drift() {
        let rundown = rundown();
        let clock = ManualClock::at_epoch();
        let mut session = PlaybackSession::new();

        session.arm(&rundown, "e1", clock.now()).unwrap();
        session.play(&rundown, clock.now()).unwrap();
        clock.advance(10_000);
        session.pause(clock.now()).unwrap();
        clock.advance(30_000);
        assert_eq!(offset_of(&session, &rundown, clock.now()).offset, 0);

        session.play(&rundown, clock.now()).unwrap();
        clock.advance(5_000);
        assert_eq!(offset_of(&session, &rundown, clock.now()).offset, 0);
    }

    #[test]
    fn test_stopped_show_has_no_offset() {
        let snapshot =
            OffsetTracker::default().compute(&PlaybackSession::new(), None, 1_000, Utc::now());
        assert_eq!(snapshot, OffsetSnapshot::default());
    }

    #[test]
    fn test_absolute_mode_counts_pauses_and_late_start() {
        let rundown = rundown();
        let clock = ManualClock::at_epoch();
        let planned = clock.now();
        let mut absolute = OffsetTracker::new(OffsetMode::Absolute);
        absolute.planned_start = Some(planned);
        let relative = OffsetTracker::new(OffsetMode::Relative);

        // Show starts a minute late
        clock.advance(60_000);
        let mut session = PlaybackSession::new();
        session.arm(&rundown, "e1", clock.now()).unwrap();
        session.play(&rundown, clock.now()).unwrap();

        clock.advance(10_000);
        session.pause(clock.now()).unwrap();
        clock.advance(30_000);

        let active = rundown.get("e1");
        let total = rundown.total_duration;
        let abs = absolute.compute(&session, active, total, clock.now());
        let rel = relative.compute(&session, active, total, clock.now());

        assert_eq!(abs.mode, OffsetMode::Absolute);
        assert_eq!(abs.offset, 90_000);
        assert_eq!(abs.expected_end_at, Some(add_millis(planned, 1_290_000)));
        assert_eq!(rel.offset, 0);
    }

    #[test]
    fn test_absolute_without_planned_start_uses_show_start() {
        let rundown = rundown();
        let clock = ManualClock::at_epoch();
        let mut session = PlaybackSession::new();
        session.arm(&rundown, "e1", clock.now()).unwrap();
        session.play(&rundown, clock.now()).unwrap();
        clock.advance(5_000);
        session.pause(clock.now()).unwrap();
        clock.advance(15_000);

        let snapshot = OffsetTracker::new(OffsetMode::Absolute).compute(
            &session,
            rundown.get("e1"),
            rundown.total_duration,
            clock.now(),
        );
        assert_eq!(snapshot.offset, 15_000);
    }
}
