//! Delay application
//!
//! A pending delay marker shifts everything after it while it sits in the
//! order. Applying it consumes the marker: every downstream entry keeps its
//! start moved by the magnitude (clamped at zero individually), baked into the
//! entry gaps, and the marker is removed, all in one rebuild. The operation is
//! one-way.

use crate::error::{Error, Result};
use crate::rundown::store::{normalise, RundownStore, Timeline};
use serde::Serialize;
use tracing::{info, warn};

/// Result of consuming a delay marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayOutcome {
    pub delay_id: String,
    pub magnitude: i64,
    /// Downstream entries whose start would have gone below zero
    pub clamped: Vec<String>,
    pub generation: u64,
}

impl RundownStore {
    /// Consume the delay `delay_id` into downstream timing
    pub fn apply_delay(&mut self, delay_id: &str) -> Result<DelayOutcome> {
        let index = self
            .view()
            .index_of(delay_id)
            .filter(|_| self.view().get(delay_id).is_some_and(|e| e.is_delay()))
            .ok_or_else(|| Error::NotFound(format!("Delay {}", delay_id)))?;

        let (mut order, mut entries) = self.parts();
        order.remove(index);
        let delay = entries
            .remove(delay_id)
            .ok_or_else(|| Error::NotFound(format!("Delay {}", delay_id)))?;
        // A skipped marker never contributed to timing
        let magnitude = if delay.skip { 0 } else { delay.duration };

        // Timeline as it would be with the marker simply dropped
        let baseline = normalise(order.clone(), entries.clone(), 0);
        let downstream = &order[index..];

        let clamped: Vec<String> = downstream
            .iter()
            .filter_map(|id| baseline.get(id))
            .filter(|entry| !entry.is_delay() && entry.time_start + magnitude < 0)
            .map(|entry| entry.id.clone())
            .collect();

        if magnitude != 0 {
            // Walk the downstream timeline and set each gap so the entry lands
            // on its baseline start plus the magnitude. A clamped entry leaves a
            // shortfall that the next entry's gap takes back.
            let mut timeline = Timeline::starting_at(baseline.cursor_before(index));
            for id in downstream {
                let (Some(entry), Some(planned)) = (entries.get_mut(id), baseline.get(id)) else {
                    continue;
                };
                if !entry.is_delay() && !entry.skip {
                    let target = (planned.time_start + magnitude).max(0);
                    if (timeline.cursor() + entry.gap).max(0) != target {
                        entry.gap = target - timeline.cursor();
                    }
                }
                timeline.place(entry);
            }
        }

        let generation = self.commit(order, entries);

        if !clamped.is_empty() {
            warn!(
                delay_id,
                magnitude,
                count = clamped.len(),
                "Delay clamped entries at show start"
            );
        }
        info!(delay_id, magnitude, generation, "Applied delay");

        Ok(DelayOutcome {
            delay_id: delay_id.to_string(),
            magnitude,
            clamped,
            generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rundown_common::EntryDraft;

    fn with_delay(magnitude: i64) -> RundownStore {
        let mut store = RundownStore::new();
        for draft in [
            EntryDraft::event("One", 300_000).with_id("e1"),
            EntryDraft::delay(magnitude).with_id("d"),
            EntryDraft::event("Two", 600_000).with_id("e2"),
            EntryDraft::event("Three", 300_000).with_id("e3"),
        ] {
            let len = store.len();
            store.insert(draft, len).unwrap();
        }
        store
    }

    #[test]
    fn test_apply_positive_delay() {
        let mut store = with_delay(180_000);

        // Pending delay already reflected in computed times
        assert_eq!(store.get("e2").unwrap().time_start, 480_000);
        let generation = store.generation();

        let outcome = store.apply_delay("d").unwrap();

        assert_eq!(outcome.magnitude, 180_000);
        assert!(outcome.clamped.is_empty());
        assert_eq!(outcome.generation, generation + 1);
        assert!(store.get("d").is_err());
        assert_eq!(store.len(), 3);
        assert_eq!(store.get("e1").unwrap().time_start, 0);
        assert_eq!(store.get("e2").unwrap().time_start, 480_000);
        assert_eq!(store.get("e3").unwrap().time_start, 1_080_000);
        assert_eq!(store.normalised().total_duration, 1_380_000);
    }

    #[test]
    fn test_shift_survives_later_rebuilds() {
        let mut store = with_delay(180_000);
        store.apply_delay("d").unwrap();

        store.insert(EntryDraft::event("Four", 60_000), 3).unwrap();
        store.swap("e3", "e2").unwrap();

        // The baked gap travels with e2
        assert_eq!(store.get("e3").unwrap().time_start, 300_000);
        assert_eq!(store.get("e2").unwrap().time_start, 780_000);
    }

    #[test]
    fn test_negative_delay_reports_clamped() {
        let mut store = RundownStore::new();
        for draft in [
            EntryDraft::event("One", 60_000).with_id("e1"),
            EntryDraft::delay(-120_000).with_id("d"),
            EntryDraft::event("Two", 90_000).with_id("e2"),
            EntryDraft::event("Three", 60_000).with_id("e3"),
            EntryDraft::event("Four", 30_000).with_id("e4"),
        ] {
            let len = store.len();
            store.insert(draft, len).unwrap();
        }

        // Baseline starts: e1=0, e2=60000, e3=150000, e4=210000
        let outcome = store.apply_delay("d").unwrap();

        assert_eq!(outcome.clamped, vec!["e2".to_string()]);
        assert_eq!(store.get("e2").unwrap().time_start, 0);
        assert_eq!(store.get("e3").unwrap().time_start, 30_000);
        assert_eq!(store.get("e4").unwrap().time_start, 90_000);
        assert_eq!(store.normalised().total_duration, 120_000);
    }

    #[test]
    fn test_negative_delay_clamps_each_entry() {
        let mut store = RundownStore::new();
        for draft in [
            EntryDraft::event("One", 10_000).with_id("e1"),
            EntryDraft::delay(-50_000).with_id("d"),
            EntryDraft::event("Two", 10_000).with_id("e2"),
            EntryDraft::event("Three", 10_000).with_id("e3"),
            EntryDraft::event("Four", 40_000).with_id("e4"),
            EntryDraft::event("Five", 10_000).with_id("e5"),
        ] {
            let len = store.len();
            store.insert(draft, len).unwrap();
        }

        // Baseline starts: e2=10000, e3=20000, e4=30000, e5=70000
        let outcome = store.apply_delay("d").unwrap();

        assert_eq!(
            outcome.clamped,
            vec!["e2".to_string(), "e3".to_string(), "e4".to_string()]
        );
        for id in ["e2", "e3", "e4"] {
            assert_eq!(store.get(id).unwrap().time_start, 0, "{} start", id);
        }
        assert_eq!(store.get("e5").unwrap().time_start, 20_000);

        // Later rebuilds keep the shift
        store.insert(EntryDraft::block("Tail"), 6).unwrap();
        assert_eq!(store.get("e5").unwrap().time_start, 20_000);
    }

    #[test]
    fn test_apply_delay_rejects_non_delay() {
        let mut store = with_delay(1_000);
        let generation = store.generation();

        assert!(matches!(store.apply_delay("e2"), Err(Error::NotFound(_))));
        assert!(matches!(store.apply_delay("missing"), Err(Error::NotFound(_))));
        assert_eq!(store.generation(), generation);
    }

    #[test]
    fn test_trailing_delay_is_consumed() {
        let mut store = RundownStore::new();
        store.insert(EntryDraft::event("Only", 10_000).with_id("e1"), 0).unwrap();
        store.insert(EntryDraft::delay(5_000).with_id("d"), 1).unwrap();
        assert_eq!(store.normalised().total_duration, 15_000);

        let outcome = store.apply_delay("d").unwrap();

        assert!(outcome.clamped.is_empty());
        assert_eq!(store.len(), 1);
        assert_eq!(store.normalised().total_duration, 10_000);
    }
}
