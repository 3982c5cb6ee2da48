//! # Rundown Engine
//!
//! Timing and playback core for a live-show running order.
//!
//! **Purpose:** Maintain the ordered rundown with its derived timing, drive the
//! playback state machine, and produce timer/offset snapshots for whoever
//! publishes them.
//!
//! **Architecture:** single-writer service object (`RundownEngine`) guarding the
//! rundown store and playback session, plus a periodic clock task. Changes go
//! out as `RundownEvent`s on the shared `EventBus`; transport and persistence
//! live outside this crate.

pub mod engine;
pub mod error;
pub mod playback;
pub mod rundown;
pub mod seed;

pub use engine::{spawn_clock_task, ClockTask, RundownEngine};
pub use error::{Error, Result};
pub use playback::{PlaybackSession, PlaybackTarget};
pub use rundown::{DelayOutcome, NormalisedRundown, RundownPage};
