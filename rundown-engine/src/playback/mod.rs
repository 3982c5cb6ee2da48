//! Playback state and timer derivation
//!
//! The session is plain data mutated by the engine under its write lock. Timer,
//! offset and roll computations are pure functions of the session, the
//! normalised rundown and an instant, so the clock task can evaluate them from
//! a read lock. The auxiliary timer stands apart from the rundown but follows
//! the same rules.

pub mod aux_timer;
pub mod offset;
pub mod report;
pub mod roll;
pub mod session;
pub mod target;
pub mod timer;

pub use aux_timer::AuxTimer;
pub use offset::OffsetTracker;
pub use report::RunReport;
pub use roll::RollPosition;
pub use session::{PlaybackSession, SessionEvent, Transition};
pub use target::PlaybackTarget;
pub use timer::{derive_timer, phase_for};
