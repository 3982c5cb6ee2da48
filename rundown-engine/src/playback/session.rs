//! Playback session and its state machine
//!
//! `PlaybackSession` is the single mutable record of what is playing. Each
//! transition returns a [`Transition`] describing the state change and the
//! entries that started or finished, which the engine turns into events and
//! run report updates.

use crate::error::{Error, Result};
use crate::playback::roll::{self, RollPosition};
use crate::rundown::NormalisedRundown;
use chrono::{DateTime, Utc};
use rundown_common::events::PlaybackState;
use rundown_common::time::{add_millis, millis_between, running_millis};
use serde::Serialize;

/// Mutable playback state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSession {
    pub state: PlaybackState,
    pub active_entry_id: Option<String>,
    /// When the active entry began (planned start on the wall clock in roll)
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    /// Paused time of the active entry, excluded from elapsed
    pub accumulated_pause: i64,
    /// Signed manual adjustment of the active entry's countdown
    pub added_time: i64,
    /// Independent of playback state
    pub on_air: bool,
    /// Wall-clock instant corresponding to planned time zero
    pub show_started_at: Option<DateTime<Utc>>,
    /// Paused time of the whole show, excluded from offset
    pub show_paused: i64,
}

/// Entry lifecycle notification produced by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started {
        entry_id: String,
        at: DateTime<Utc>,
    },
    Finished {
        entry_id: String,
        elapsed: i64,
        completed: bool,
        at: DateTime<Utc>,
    },
}

/// Outcome of one state machine step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub old_state: PlaybackState,
    pub new_state: PlaybackState,
    pub old_entry_id: Option<String>,
    pub entry_id: Option<String>,
    pub events: Vec<SessionEvent>,
}

impl Transition {
    /// Whether state or active entry moved
    pub fn is_change(&self) -> bool {
        self.old_state != self.new_state || self.old_entry_id != self.entry_id
    }
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Running time of the active entry, excluding pauses
    ///
    /// Frozen at `paused_at` while paused. `None` until the entry starts.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Option<i64> {
        let started = self.started_at?;
        Some(running_millis(
            started,
            self.paused_at,
            self.accumulated_pause,
            now,
        ))
    }

    /// Length of the pause currently in progress
    pub fn pause_in_progress(&self, now: DateTime<Utc>) -> i64 {
        self.paused_at
            .map_or(0, |paused_at| millis_between(paused_at, now).max(0))
    }

    /// Select an entry without starting its timer
    ///
    /// Closes out whatever was running. Not available while rolling.
    pub fn arm(
        &mut self,
        rundown: &NormalisedRundown,
        entry_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition> {
        if rundown.is_empty() {
            return Err(Error::InvalidState("Rundown is empty".to_string()));
        }
        if self.state == PlaybackState::Roll {
            return Err(Error::InvalidState("Cannot arm while rolling".to_string()));
        }
        let entry = rundown
            .get(entry_id)
            .ok_or_else(|| Error::NotFound(format!("Entry {}", entry_id)))?;
        if !entry.is_playable() {
            return Err(Error::Validation(format!(
                "Entry {} ({}) is not playable",
                entry_id, entry.kind
            )));
        }

        let (old_state, old_entry_id) = self.mark();
        let mut events = Vec::new();
        self.close_out(rundown, now, &mut events);
        self.fold_pause(now);
        self.reset_entry();
        self.state = PlaybackState::Armed;
        self.active_entry_id = Some(entry.id.clone());

        Ok(self.transition(old_state, old_entry_id, events))
    }

    /// Start the armed entry or resume from pause
    ///
    /// Playing while already playing changes nothing.
    pub fn play(&mut self, rundown: &NormalisedRundown, now: DateTime<Utc>) -> Result<Transition> {
        let (old_state, old_entry_id) = self.mark();
        let mut events = Vec::new();

        match self.state {
            PlaybackState::Play => {}
            PlaybackState::Armed => {
                let entry = self
                    .active_entry_id
                    .as_deref()
                    .and_then(|id| rundown.get(id))
                    .ok_or_else(|| Error::InvalidState("Armed entry is gone".to_string()))?;

                if self.show_started_at.is_none() {
                    self.show_started_at = Some(add_millis(now, -entry.time_start));
                    self.show_paused = 0;
                }
                self.started_at = Some(now);
                self.paused_at = None;
                self.accumulated_pause = 0;
                self.state = PlaybackState::Play;
                events.push(SessionEvent::Started {
                    entry_id: entry.id.clone(),
                    at: now,
                });
            }
            PlaybackState::Pause => {
                let paused = self.pause_in_progress(now);
                self.accumulated_pause += paused;
                self.show_paused += paused;
                self.paused_at = None;
                self.state = PlaybackState::Play;
            }
            PlaybackState::Stop | PlaybackState::Roll => {
                return Err(Error::InvalidState(format!("Cannot play from {}", self.state)));
            }
        }

        Ok(self.transition(old_state, old_entry_id, events))
    }

    /// Freeze the running timer
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<Transition> {
        let (old_state, old_entry_id) = self.mark();
        match self.state {
            PlaybackState::Pause => {}
            PlaybackState::Play => {
                self.paused_at = Some(now);
                self.state = PlaybackState::Pause;
            }
            _ => {
                return Err(Error::InvalidState(format!("Cannot pause from {}", self.state)));
            }
        }
        Ok(self.transition(old_state, old_entry_id, Vec::new()))
    }

    /// Stop everything; valid from any state
    pub fn stop(&mut self, rundown: &NormalisedRundown, now: DateTime<Utc>) -> Transition {
        let (old_state, old_entry_id) = self.mark();
        let mut events = Vec::new();
        self.close_out(rundown, now, &mut events);
        self.reset_entry();
        self.active_entry_id = None;
        self.show_started_at = None;
        self.show_paused = 0;
        self.state = PlaybackState::Stop;
        self.transition(old_state, old_entry_id, events)
    }

    /// Close out the active entry and start the next playable one
    ///
    /// Stops when nothing playable remains.
    pub fn advance(
        &mut self,
        rundown: &NormalisedRundown,
        now: DateTime<Utc>,
    ) -> Result<Transition> {
        if !matches!(
            self.state,
            PlaybackState::Armed | PlaybackState::Play | PlaybackState::Pause
        ) {
            return Err(Error::InvalidState(format!("Cannot advance from {}", self.state)));
        }

        let next = match self.active_entry_id.as_deref().and_then(|id| rundown.index_of(id)) {
            Some(index) => rundown.next_playable_after(index),
            None => rundown.first_playable(),
        };
        let Some(next) = next else {
            return Ok(self.stop(rundown, now));
        };

        let (old_state, old_entry_id) = self.mark();
        let mut events = Vec::new();
        self.close_out(rundown, now, &mut events);
        self.fold_pause(now);
        self.reset_entry();

        if self.show_started_at.is_none() {
            self.show_started_at = Some(add_millis(now, -next.time_start));
            self.show_paused = 0;
        }
        self.active_entry_id = Some(next.id.clone());
        self.started_at = Some(now);
        self.state = PlaybackState::Play;
        events.push(SessionEvent::Started {
            entry_id: next.id.clone(),
            at: now,
        });

        Ok(self.transition(old_state, old_entry_id, events))
    }

    /// Re-arm the active entry from zero
    pub fn reload(&mut self, rundown: &NormalisedRundown, now: DateTime<Utc>) -> Result<Transition> {
        if !matches!(
            self.state,
            PlaybackState::Armed | PlaybackState::Play | PlaybackState::Pause
        ) {
            return Err(Error::InvalidState(format!("Cannot reload from {}", self.state)));
        }
        let entry_id = self
            .active_entry_id
            .clone()
            .ok_or_else(|| Error::InvalidState("Nothing to reload".to_string()))?;
        self.arm(rundown, &entry_id, now)
    }

    /// Enter autonomous mode anchored at `epoch`
    ///
    /// The active entry is chosen by [`PlaybackSession::settle_roll`].
    pub fn roll(&mut self, epoch: DateTime<Utc>) -> Result<Transition> {
        if !matches!(self.state, PlaybackState::Stop | PlaybackState::Armed) {
            return Err(Error::InvalidState(format!("Cannot roll from {}", self.state)));
        }

        let (old_state, old_entry_id) = self.mark();
        self.reset_entry();
        self.active_entry_id = None;
        self.show_started_at = Some(epoch);
        self.show_paused = 0;
        self.state = PlaybackState::Roll;
        Ok(self.transition(old_state, old_entry_id, Vec::new()))
    }

    /// Activate whichever entry's planned window contains `now`
    ///
    /// No-op outside roll. Leaves roll for `Stop` once the last entry is over.
    pub fn settle_roll(&mut self, rundown: &NormalisedRundown, now: DateTime<Utc>) -> Transition {
        let (old_state, old_entry_id) = self.mark();
        let Some(epoch) = self.show_started_at.filter(|_| self.state == PlaybackState::Roll) else {
            return self.transition(old_state, old_entry_id, Vec::new());
        };

        let mut events = Vec::new();
        match roll::resolve(rundown, millis_between(epoch, now)) {
            RollPosition::Active(entry_id) => {
                if self.active_entry_id.as_deref() != Some(entry_id.as_str()) {
                    self.close_out(rundown, now, &mut events);
                    self.reset_entry();
                    if let Some(entry) = rundown.get(&entry_id) {
                        self.started_at = Some(add_millis(epoch, entry.time_start));
                    }
                    self.active_entry_id = Some(entry_id.clone());
                    events.push(SessionEvent::Started { entry_id, at: now });
                }
            }
            RollPosition::Waiting(_) => {
                self.close_out(rundown, now, &mut events);
                self.reset_entry();
                self.active_entry_id = None;
            }
            RollPosition::Finished => return self.stop(rundown, now),
        }

        self.transition(old_state, old_entry_id, events)
    }

    /// Shift the active countdown without touching elapsed
    ///
    /// Returns false when `delta` is zero.
    pub fn adjust_added_time(&mut self, delta: i64, max_magnitude: i64) -> Result<bool> {
        if !self.state.accepts_added_time() {
            return Err(Error::InvalidState(format!(
                "Cannot add time while {}",
                self.state
            )));
        }
        if delta.unsigned_abs() > max_magnitude.unsigned_abs() {
            return Err(Error::Validation(format!(
                "Added time {}ms exceeds limit of {}ms",
                delta, max_magnitude
            )));
        }
        if delta == 0 {
            return Ok(false);
        }
        self.added_time += delta;
        Ok(true)
    }

    /// Returns true when the flag changed
    pub fn set_on_air(&mut self, on_air: bool) -> bool {
        let changed = self.on_air != on_air;
        self.on_air = on_air;
        changed
    }

    fn mark(&self) -> (PlaybackState, Option<String>) {
        (self.state, self.active_entry_id.clone())
    }

    fn transition(
        &self,
        old_state: PlaybackState,
        old_entry_id: Option<String>,
        events: Vec<SessionEvent>,
    ) -> Transition {
        Transition {
            old_state,
            new_state: self.state,
            old_entry_id,
            entry_id: self.active_entry_id.clone(),
            events,
        }
    }

    /// Emit `Finished` for a started active entry
    fn close_out(
        &self,
        rundown: &NormalisedRundown,
        now: DateTime<Utc>,
        events: &mut Vec<SessionEvent>,
    ) {
        let (Some(entry_id), Some(elapsed)) = (self.active_entry_id.clone(), self.elapsed_at(now))
        else {
            return;
        };
        let completed = rundown
            .get(&entry_id)
            .is_some_and(|entry| elapsed >= entry.duration + self.added_time);
        events.push(SessionEvent::Finished {
            entry_id,
            elapsed,
            completed,
            at: now,
        });
    }

    /// Count an interrupted pause against the show, not the schedule
    fn fold_pause(&mut self, now: DateTime<Utc>) {
        self.show_paused += self.pause_in_progress(now);
    }

    fn reset_entry(&mut self) {
        self.started_at = None;
        self.paused_at = None;
        self.accumulated_pause = 0;
        self.added_time = 0;
    }
}
