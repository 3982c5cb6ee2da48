//! Roll mode resolution
//!
//! In roll the wall clock drives playback: whichever playable entry's planned
//! window `[time_start, time_end)` contains the time since the show epoch is
//! active. There is no wraparound past the last entry.

use crate::rundown::NormalisedRundown;

/// Where the show is relative to the planned timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollPosition {
    /// Inside this entry's window
    Active(String),
    /// Between windows; the next entry to activate
    Waiting(String),
    /// Past the last window, or nothing playable
    Finished,
}

/// Resolve the roll position at `show_elapsed` ms after the epoch
pub fn resolve(rundown: &NormalisedRundown, show_elapsed: i64) -> RollPosition {
    let mut upcoming = None;

    for entry in rundown.iter().filter(|entry| entry.is_playable()) {
        if entry.time_start <= show_elapsed && show_elapsed < entry.time_end {
            return RollPosition::Active(entry.id.clone());
        }
        if upcoming.is_none() && entry.time_start > show_elapsed {
            upcoming = Some(entry.id.clone());
        }
    }

    match upcoming {
        Some(id) => RollPosition::Waiting(id),
        None => RollPosition::Finished,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rundown::store::tests::{build, event};

    fn rundown() -> NormalisedRundown {
        let mut later = event("e3", 60_000);
        later.gap = 30_000;
        let mut skipped = event("s", 1_000);
        skipped.skip = true;
        build(vec![event("e1", 60_000), skipped, event("e2", 0), later])
    }

    #[test]
    fn test_active_window_is_half_open() {
        let rundown = rundown();
        assert_eq!(resolve(&rundown, 0), RollPosition::Active("e1".to_string()));
        assert_eq!(resolve(&rundown, 59_999), RollPosition::Active("e1".to_string()));
        // Zero-length e2 never holds the window
        assert_eq!(resolve(&rundown, 60_000), RollPosition::Waiting("e3".to_string()));
    }

    #[test]
    fn test_before_epoch_waits_for_first() {
        let rundown = rundown();
        assert_eq!(resolve(&rundown, -5_000), RollPosition::Waiting("e1".to_string()));
    }

    #[test]
    fn test_gap_then_finish() {
        let rundown = rundown();
        assert_eq!(resolve(&rundown, 90_000), RollPosition::Active("e3".to_string()));
        assert_eq!(resolve(&rundown, 150_000), RollPosition::Finished);
        assert_eq!(resolve(&NormalisedRundown::default(), 0), RollPosition::Finished);
    }
}
