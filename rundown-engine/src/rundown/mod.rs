//! Rundown storage and structural operations
//!
//! - `store`: authoritative order/entries and the normalised projection
//! - `operations`: insert, edit, delete, reorder and swap
//! - `delay`: consuming delay markers into downstream timing

pub mod delay;
pub mod operations;
pub mod store;

pub use delay::DelayOutcome;
pub use store::{normalise, NormalisedRundown, RundownPage, RundownStore};
