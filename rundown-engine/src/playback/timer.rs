//! Timer derivation
//!
//! Derives the published timer fields of the active entry at one instant.

use crate::playback::session::PlaybackSession;
use chrono::{DateTime, Utc};
use rundown_common::config::PhaseThresholds;
use rundown_common::events::{TimerPhase, TimerState};
use rundown_common::time::add_millis;
use rundown_common::RundownEntry;

/// Phase of a countdown with `current` ms remaining
pub fn phase_for(current: i64, thresholds: &PhaseThresholds) -> TimerPhase {
    if current < 0 {
        TimerPhase::Overtime
    } else if current <= thresholds.danger_ms {
        TimerPhase::Danger
    } else if current <= thresholds.warning_ms {
        TimerPhase::Warning
    } else {
        TimerPhase::Default
    }
}

/// Timer state for `active` at `now`
///
/// An armed entry reports its full countdown with zero elapsed.
pub fn derive_timer(
    session: &PlaybackSession,
    active: Option<&RundownEntry>,
    thresholds: &PhaseThresholds,
    now: DateTime<Utc>,
) -> TimerState {
    let Some(entry) = active else {
        return TimerState {
            playback: session.state,
            added_time: session.added_time,
            ..Default::default()
        };
    };

    let elapsed = session.elapsed_at(now).unwrap_or(0);
    let current = entry.duration + session.added_time - elapsed;
    let expected_finish = session.started_at.map(|started_at| {
        add_millis(
            started_at,
            session.accumulated_pause
                + session.pause_in_progress(now)
                + entry.duration
                + session.added_time,
        )
    });

    TimerState {
        playback: session.state,
        phase: phase_for(current, thresholds),
        duration: Some(entry.duration),
        elapsed: Some(elapsed),
        current: Some(current),
        added_time: session.added_time,
        started_at: session.started_at,
        paused_at: session.paused_at,
        expected_finish,
    }
}
