//! Auxiliary timer
//!
//! A free-standing stopwatch for the operator, unrelated to the rundown. It
//! shares the pause accounting and phase thresholds of the main timer.

use crate::error::{Error, Result};
use crate::playback::timer::phase_for;
use chrono::{DateTime, Utc};
use rundown_common::config::PhaseThresholds;
use rundown_common::events::{AuxDirection, AuxPlayback, AuxTimerState, TimerPhase};
use rundown_common::time::{add_millis, millis_between, running_millis};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxTimer {
    playback: AuxPlayback,
    direction: AuxDirection,
    duration: i64,
    started_at: Option<DateTime<Utc>>,
    paused_at: Option<DateTime<Utc>>,
    accumulated_pause: i64,
}

impl AuxTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playback(&self) -> AuxPlayback {
        self.playback
    }

    /// Start from zero, or resume from pause
    ///
    /// Returns false when already running.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        match self.playback {
            AuxPlayback::Play => return false,
            AuxPlayback::Pause => {
                self.accumulated_pause += self.pause_in_progress(now);
                self.paused_at = None;
            }
            AuxPlayback::Stop => {
                self.started_at = Some(now);
                self.paused_at = None;
                self.accumulated_pause = 0;
            }
        }
        self.playback = AuxPlayback::Play;
        true
    }

    /// Freeze a running timer; anything else is left alone
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if self.playback != AuxPlayback::Play {
            return false;
        }
        self.paused_at = Some(now);
        self.playback = AuxPlayback::Pause;
        true
    }

    /// Reset to the full duration
    pub fn stop(&mut self) -> bool {
        if self.playback == AuxPlayback::Stop {
            return false;
        }
        self.playback = AuxPlayback::Stop;
        self.started_at = None;
        self.paused_at = None;
        self.accumulated_pause = 0;
        true
    }

    pub fn set_duration(&mut self, duration: i64) -> Result<()> {
        if duration < 0 {
            return Err(Error::Validation(format!(
                "Aux timer duration {} is negative",
                duration
            )));
        }
        self.duration = duration;
        Ok(())
    }

    /// Lengthen or shorten the countdown; the duration never drops below zero
    pub fn add_time(&mut self, delta: i64) {
        self.duration = (self.duration + delta).max(0);
    }

    /// Returns true when the direction changed
    pub fn set_direction(&mut self, direction: AuxDirection) -> bool {
        let changed = self.direction != direction;
        self.direction = direction;
        changed
    }

    fn pause_in_progress(&self, now: DateTime<Utc>) -> i64 {
        self.paused_at
            .map_or(0, |paused_at| millis_between(paused_at, now).max(0))
    }

    /// Published view at `now`
    pub fn state_at(&self, now: DateTime<Utc>, thresholds: &PhaseThresholds) -> AuxTimerState {
        let elapsed = self
            .started_at
            .map_or(0, |started| {
                running_millis(started, self.paused_at, self.accumulated_pause, now)
            });
        let remaining = self.duration - elapsed;

        AuxTimerState {
            playback: self.playback,
            direction: self.direction,
            duration: self.duration,
            elapsed,
            current: match self.direction {
                AuxDirection::CountDown => remaining,
                AuxDirection::CountUp => elapsed,
            },
            phase: match self.playback {
                AuxPlayback::Stop => TimerPhase::None,
                _ => phase_for(remaining, thresholds),
            },
            expected_finish: self.started_at.map(|started| {
                add_millis(
                    started,
                    self.accumulated_pause + self.pause_in_progress(now) + self.duration,
                )
            }),
        }
    }
}
