//! Playback-related type definitions
//!
//! Supporting types for playback state and timer phase.

use serde::{Deserialize, Serialize};

/// Playback state enumeration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No active entry
    #[default]
    Stop,
    /// Entry selected, timer not running
    Armed,
    /// Timer running
    Play,
    /// Timer frozen
    Pause,
    /// Entries activate from the wall clock
    Roll,
}

impl PlaybackState {
    /// Whether the active entry's timer is counting
    pub fn is_running(&self) -> bool {
        matches!(self, PlaybackState::Play | PlaybackState::Roll)
    }

    /// States in which added time may be adjusted
    pub fn accepts_added_time(&self) -> bool {
        matches!(
            self,
            PlaybackState::Play | PlaybackState::Pause | PlaybackState::Roll
        )
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Stop => write!(f, "stop"),
            PlaybackState::Armed => write!(f, "armed"),
            PlaybackState::Play => write!(f, "play"),
            PlaybackState::Pause => write!(f, "pause"),
            PlaybackState::Roll => write!(f, "roll"),
        }
    }
}

/// Countdown phase derived from the remaining time
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    /// No timer (nothing active)
    #[default]
    None,
    Default,
    Warning,
    Danger,
    /// Remaining time below zero
    Overtime,
}

impl std::fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerPhase::None => write!(f, "none"),
            TimerPhase::Default => write!(f, "default"),
            TimerPhase::Warning => write!(f, "warning"),
            TimerPhase::Danger => write!(f, "danger"),
            TimerPhase::Overtime => write!(f, "overtime"),
        }
    }
}

/// Reference the schedule offset is measured against
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OffsetMode {
    /// Wall clock since the planned show start; pauses count as lateness
    Absolute,
    /// Running time since the show actually started, pauses excluded
    #[default]
    Relative,
}

impl std::fmt::Display for OffsetMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OffsetMode::Absolute => write!(f, "absolute"),
            OffsetMode::Relative => write!(f, "relative"),
        }
    }
}

/// Run state of the auxiliary timer
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AuxPlayback {
    #[default]
    Stop,
    Play,
    Pause,
}

/// Which way the auxiliary timer shows time
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AuxDirection {
    #[default]
    CountDown,
    CountUp,
}
