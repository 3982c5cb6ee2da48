//! Rundown entry model
//!
//! Plain data definitions for the entries of a running order. These types carry
//! no behaviour beyond small classification helpers; ordering, timing and
//! validation against the entry kind belong to the engine.
//!
//! All times are milliseconds. `time_start`/`time_end` are planned offsets from
//! show start, independent of the wall clock.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Custom field values keyed by the externally defined field key
pub type CustomFields = BTreeMap<String, String>;

/// Entry variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Timed segment with a planned start and end
    #[default]
    Event,
    /// Schedule adjustment marker carrying a signed magnitude
    Delay,
    /// Zero-length title used for grouping
    Block,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Event => write!(f, "event"),
            EntryKind::Delay => write!(f, "delay"),
            EntryKind::Block => write!(f, "block"),
        }
    }
}

/// One entry of the rundown as stored by the engine
///
/// In the normalised view `time_start` and `time_end` are the computed values
/// after all upstream durations, gaps and pending delays have been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RundownEntry {
    /// Opaque unique id, immutable once assigned
    pub id: String,
    /// Entry variant
    pub kind: EntryKind,
    /// Short run-position label
    pub cue: String,
    pub title: String,
    pub is_public: bool,
    pub colour: String,
    pub custom_fields: CustomFields,
    /// Skipped entries stay in the order but do not advance the timeline
    pub skip: bool,
    /// Planned start offset from show start
    pub time_start: i64,
    /// Planned end offset from show start
    pub time_end: i64,
    /// Events: planned length (>= 0). Delays: signed magnitude. Blocks: always 0.
    ///
    /// May differ from `time_end - time_start` when the caller set it explicitly.
    pub duration: i64,
    /// Planned hold (signed) between the preceding timed entry and this one
    pub gap: i64,
    /// Caller-declared `time_end - time_start` when it differs from `duration`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<i64>,
}

impl RundownEntry {
    pub fn is_event(&self) -> bool {
        self.kind == EntryKind::Event
    }

    pub fn is_delay(&self) -> bool {
        self.kind == EntryKind::Delay
    }

    pub fn is_block(&self) -> bool {
        self.kind == EntryKind::Block
    }

    /// Whether the entry can be armed and played
    pub fn is_playable(&self) -> bool {
        self.is_event() && !self.skip
    }

    /// Whether the entry advances the cumulative timeline
    pub fn is_timed(&self) -> bool {
        !self.skip && !self.is_block()
    }

    /// Length between `time_start` and `time_end`
    pub fn planned_span(&self) -> i64 {
        self.span.unwrap_or(self.duration)
    }
}

/// Caller-supplied entry for insertion
///
/// Missing timing fields are derived by the engine: `duration` falls back to
/// `time_end - time_start`, and a missing `time_start` places the entry
/// directly after its predecessor. A `duration` that disagrees with the given
/// times is kept as declared and the times are kept as a separate span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryDraft {
    /// Assigned by the engine when absent
    pub id: Option<String>,
    pub kind: EntryKind,
    pub cue: String,
    pub title: String,
    pub is_public: bool,
    pub colour: String,
    pub custom_fields: CustomFields,
    pub skip: bool,
    pub time_start: Option<i64>,
    pub time_end: Option<i64>,
    pub duration: Option<i64>,
}

impl EntryDraft {
    /// Event draft with a planned length
    pub fn event(title: impl Into<String>, duration_ms: i64) -> Self {
        Self {
            kind: EntryKind::Event,
            title: title.into(),
            duration: Some(duration_ms),
            ..Default::default()
        }
    }

    /// Delay marker draft with a signed magnitude
    pub fn delay(magnitude_ms: i64) -> Self {
        Self {
            kind: EntryKind::Delay,
            duration: Some(magnitude_ms),
            ..Default::default()
        }
    }

    /// Block (grouping title) draft
    pub fn block(title: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Block,
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_cue(mut self, cue: impl Into<String>) -> Self {
        self.cue = cue.into();
        self
    }

    pub fn with_times(mut self, time_start: i64, time_end: i64) -> Self {
        self.time_start = Some(time_start);
        self.time_end = Some(time_end);
        self
    }

    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }
}

/// Partial update applied by edit and batch edit
///
/// Custom fields are merged key by key into the existing map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryPatch {
    pub cue: Option<String>,
    pub title: Option<String>,
    pub is_public: Option<bool>,
    pub colour: Option<String>,
    pub custom_fields: Option<CustomFields>,
    pub skip: Option<bool>,
    pub time_start: Option<i64>,
    pub time_end: Option<i64>,
    pub duration: Option<i64>,
}

impl EntryPatch {
    /// True when the patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when the patch affects derived timing
    pub fn touches_timing(&self) -> bool {
        self.time_start.is_some()
            || self.time_end.is_some()
            || self.duration.is_some()
            || self.skip.is_some()
    }
}
