//! Rundown engine service
//!
//! **Module Structure:**
//! - `core.rs`: construction, shared state, reads, snapshots and event publishing
//! - `rundown_ops.rs`: structural rundown mutations (insert, edit, delete, reorder, delay)
//! - `playback_ops.rs`: playback transitions and settling of due transitions
//! - `aux_ops.rs`: offset mode and auxiliary timer
//! - `clock.rs`: periodic clock task publishing timer snapshots

mod aux_ops;
mod clock;
mod core;
mod playback_ops;
mod rundown_ops;

pub use self::clock::{spawn_clock_task, ClockTask};
pub use self::core::RundownEngine;
