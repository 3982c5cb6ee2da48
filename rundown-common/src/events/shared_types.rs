//! Shared type definitions for event data
//!
//! Snapshot structs published by the clock task and returned by polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::playback_types::{AuxDirection, AuxPlayback, OffsetMode, PlaybackState, TimerPhase};
use crate::entry::RundownEntry;

/// Timer fields of the active entry, derived at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub playback: PlaybackState,
    pub phase: TimerPhase,
    /// Planned length of the active entry
    pub duration: Option<i64>,
    /// Running time, excluding pauses
    pub elapsed: Option<i64>,
    /// Remaining time (`duration + added_time - elapsed`), negative in overtime
    pub current: Option<i64>,
    pub added_time: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub expected_finish: Option<DateTime<Utc>>,
}

/// Drift between the programmed schedule and the wall clock
///
/// Positive offsets mean the show is running behind plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetSnapshot {
    /// Reference `offset` was measured against
    pub mode: OffsetMode,
    pub offset: i64,
    /// `offset` limited to the active entry's own duration
    pub relative_offset: i64,
    /// Planned show end adjusted by `offset`, relative to show start
    pub expected_end: Option<i64>,
    /// `expected_end` on the wall clock
    pub expected_end_at: Option<DateTime<Utc>>,
}

/// Consistent view of playback produced by one clock tick or poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Rundown generation the snapshot was computed against
    pub generation: u64,
    pub timer: TimerState,
    pub active_entry: Option<RundownEntry>,
    pub next_entry: Option<RundownEntry>,
    pub offset: OffsetSnapshot,
    pub on_air: bool,
    pub aux: AuxTimerState,
}

/// Standalone auxiliary timer, independent of the rundown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuxTimerState {
    pub playback: AuxPlayback,
    pub direction: AuxDirection,
    pub duration: i64,
    /// Running time, excluding pauses
    pub elapsed: i64,
    /// Remaining time when counting down, elapsed when counting up
    pub current: i64,
    pub phase: TimerPhase,
    pub expected_finish: Option<DateTime<Utc>>,
}

/// Actual start/end times recorded for one entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryReport {
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}
