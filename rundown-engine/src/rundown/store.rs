//! Rundown store
//!
//! Owns the authoritative ordered collection of entries and its normalised
//! projection. The projection is rebuilt in one pass over `order` on every
//! structural change and swapped in as a whole, so readers holding the previous
//! `Arc<NormalisedRundown>` never observe a partially applied mutation.

use crate::error::{Error, Result};
use rundown_common::RundownEntry;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Cached, fully computed projection of the rundown
///
/// `order` and `entries` always have identical key sets. Entry times are the
/// computed values after all upstream durations, gaps and pending delays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalisedRundown {
    pub order: Vec<String>,
    pub entries: HashMap<String, RundownEntry>,
    /// End of the cumulative timeline, pending delays included, or the latest
    /// planned end if a span reaches further
    pub total_duration: i64,
    /// Bumped on every rebuild
    pub generation: u64,
}

/// One page of entries in playback order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RundownPage {
    pub entries: Vec<RundownEntry>,
    pub total: usize,
}

/// Running cursor over the cumulative timeline
///
/// Shared by the rebuild pass and by position lookups so both place entries
/// identically.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct Timeline {
    cursor: i64,
}

impl Timeline {
    /// Timeline resumed at an earlier `cursor`
    pub(super) fn starting_at(cursor: i64) -> Self {
        Self { cursor }
    }

    pub(super) fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Compute `(time_start, time_end)` for the entry and advance the cursor
    ///
    /// The cursor advances by the declared duration; `time_end` follows the
    /// caller's span when one was set, so spans may overlap the next entry.
    pub(super) fn place(&mut self, entry: &RundownEntry) -> (i64, i64) {
        if entry.skip {
            // Retained in order but excluded from the cumulative timeline
            let start = self.cursor;
            let end = if entry.is_event() { start + entry.planned_span() } else { start };
            return (start, end);
        }

        if entry.is_delay() {
            let at = self.cursor;
            self.cursor = (self.cursor + entry.duration).max(0);
            return (at, at);
        }

        let start = (self.cursor + entry.gap).max(0);
        if !entry.is_event() {
            self.cursor = start;
            return (start, start);
        }
        self.cursor = start + entry.duration;
        (start, start + entry.planned_span())
    }
}

/// Rebuild the projection from `(order, entries)`
///
/// Pure function of its inputs. Ids in `order` with no entry are dropped, as
/// are entries that `order` does not reference.
pub fn normalise(
    order: Vec<String>,
    mut entries: HashMap<String, RundownEntry>,
    generation: u64,
) -> NormalisedRundown {
    let mut timeline = Timeline::default();
    let mut show_end: i64 = 0;
    let mut normalised_order = Vec::with_capacity(order.len());
    let mut normalised_entries = HashMap::with_capacity(order.len());

    for id in order {
        let Some(mut entry) = entries.remove(&id) else {
            continue;
        };
        if normalised_entries.contains_key(&id) {
            continue;
        }

        let (start, end) = timeline.place(&entry);
        if !entry.skip {
            show_end = show_end.max(end);
        }
        entry.time_start = start;
        entry.time_end = end;

        normalised_order.push(id.clone());
        normalised_entries.insert(id, entry);
    }

    NormalisedRundown {
        order: normalised_order,
        entries: normalised_entries,
        total_duration: timeline.cursor.max(show_end),
        generation,
    }
}

impl NormalisedRundown {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RundownEntry> {
        self.entries.get(id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|candidate| candidate == id)
    }

    pub fn entry_at(&self, index: usize) -> Option<&RundownEntry> {
        self.order.get(index).and_then(|id| self.entries.get(id))
    }

    /// Entries in playback order
    pub fn iter(&self) -> impl Iterator<Item = &RundownEntry> + '_ {
        self.order.iter().filter_map(move |id| self.entries.get(id))
    }

    pub fn find_by_cue(&self, cue: &str) -> Option<&RundownEntry> {
        self.iter().find(|entry| entry.cue == cue)
    }

    pub fn first_playable(&self) -> Option<&RundownEntry> {
        self.iter().find(|entry| entry.is_playable())
    }

    /// First playable entry strictly after `index`
    pub fn next_playable_after(&self, index: usize) -> Option<&RundownEntry> {
        self.order
            .iter()
            .skip(index + 1)
            .filter_map(|id| self.entries.get(id))
            .find(|entry| entry.is_playable())
    }

    /// Last playable entry strictly before `index`
    pub fn previous_playable_before(&self, index: usize) -> Option<&RundownEntry> {
        self.order[..index.min(self.order.len())]
            .iter()
            .rev()
            .filter_map(|id| self.entries.get(id))
            .find(|entry| entry.is_playable())
    }

    /// Timeline cursor just before position `index` (clamped to the length)
    pub fn cursor_before(&self, index: usize) -> i64 {
        let mut timeline = Timeline::default();
        for entry in self.iter().take(index) {
            timeline.place(entry);
        }
        timeline.cursor
    }
}

/// Authoritative rundown state
#[derive(Debug, Clone, Default)]
pub struct RundownStore {
    current: Arc<NormalisedRundown>,
}

impl RundownStore {
    /// Create new empty store at generation 0
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Result<&RundownEntry> {
        self.current
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("Entry {}", id)))
    }

    pub fn order(&self) -> &[String] {
        &self.current.order
    }

    /// Cached projection, O(1)
    pub fn normalised(&self) -> Arc<NormalisedRundown> {
        Arc::clone(&self.current)
    }

    pub(crate) fn view(&self) -> &NormalisedRundown {
        &self.current
    }

    pub fn generation(&self) -> u64 {
        self.current.generation
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Entries `[offset, offset + limit)` in playback order
    ///
    /// `limit = None` reads to the end.
    pub fn paginate(&self, offset: usize, limit: Option<usize>) -> Result<RundownPage> {
        let total = self.len();
        if offset > total {
            return Err(Error::InvalidRange(format!(
                "Offset {} beyond rundown length {}",
                offset, total
            )));
        }

        let entries = self
            .current
            .iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(RundownPage { entries, total })
    }

    /// Working copy of `(order, entries)` for a mutation
    pub(crate) fn parts(&self) -> (Vec<String>, HashMap<String, RundownEntry>) {
        (self.current.order.clone(), self.current.entries.clone())
    }

    /// Replace the projection with a rebuild of the given parts
    ///
    /// Returns the new generation.
    pub(crate) fn commit(
        &mut self,
        order: Vec<String>,
        entries: HashMap<String, RundownEntry>,
    ) -> u64 {
        let generation = self.current.generation + 1;
        self.current = Arc::new(normalise(order, entries, generation));
        generation
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rundown_common::{CustomFields, EntryKind};

    pub(crate) fn event(id: &str, duration: i64) -> RundownEntry {
        RundownEntry {
            id: id.to_string(),
            kind: EntryKind::Event,
            cue: id.to_uppercase(),
            title: format!("Title {}", id),
            is_public: true,
            colour: String::new(),
            custom_fields: CustomFields::new(),
            skip: false,
            time_start: 0,
            time_end: duration,
            duration,
            gap: 0,
            span: None,
        }
    }

    pub(crate) fn delay(id: &str, magnitude: i64) -> RundownEntry {
        RundownEntry {
            kind: EntryKind::Delay,
            time_end: 0,
            duration: magnitude,
            ..event(id, 0)
        }
    }

    pub(crate) fn block(id: &str) -> RundownEntry {
        RundownEntry {
            kind: EntryKind::Block,
            ..event(id, 0)
        }
    }

    pub(crate) fn build(entries: Vec<RundownEntry>) -> NormalisedRundown {
        let order = entries.iter().map(|e| e.id.clone()).collect();
        let map = entries.into_iter().map(|e| (e.id.clone(), e)).collect();
        normalise(order, map, 1)
    }

    fn starts(rundown: &NormalisedRundown) -> Vec<i64> {
        rundown.iter().map(|e| e.time_start).collect()
    }

    #[test]
    fn test_cumulative_start_times() {
        let rundown = build(vec![
            event("e1", 300_000),
            event("e2", 600_000),
            event("e3", 300_000),
        ]);

        assert_eq!(starts(&rundown), vec![0, 300_000, 900_000]);
        assert_eq!(rundown.get("e3").unwrap().time_end, 1_200_000);
        assert_eq!(rundown.total_duration, 1_200_000);
    }

    #[test]
    fn test_pending_delay_shifts_downstream() {
        let rundown = build(vec![
            event("e1", 300_000),
            delay("d", 180_000),
            event("e2", 600_000),
        ]);

        assert_eq!(rundown.get("d").unwrap().time_start, 300_000);
        assert_eq!(rundown.get("e2").unwrap().time_start, 480_000);
        assert_eq!(rundown.total_duration, 1_080_000);
    }

    #[test]
    fn test_skipped_and_blocks_do_not_advance_timeline() {
        let mut skipped = event("e2", 600_000);
        skipped.skip = true;

        let rundown = build(vec![event("e1", 300_000), block("b"), skipped, event("e3", 60_000)]);

        assert_eq!(rundown.len(), 4);
        assert_eq!(rundown.get("b").unwrap().time_start, 300_000);
        assert_eq!(rundown.get("b").unwrap().time_end, 300_000);
        assert_eq!(rundown.get("e3").unwrap().time_start, 300_000);
        assert_eq!(rundown.total_duration, 360_000);
    }

    #[test]
    fn test_negative_delay_clamps_at_zero() {
        let rundown = build(vec![delay("d", -60_000), event("e1", 10_000)]);
        assert_eq!(rundown.get("e1").unwrap().time_start, 0);
    }

    #[test]
    fn test_gap_holds_entry_later() {
        let mut e2 = event("e2", 1_000);
        e2.gap = 5_000;
        let rundown = build(vec![event("e1", 1_000), e2]);
        assert_eq!(rundown.get("e2").unwrap().time_start, 6_000);
        assert_eq!(rundown.cursor_before(2), 7_000);
        assert_eq!(rundown.cursor_before(1), 1_000);
    }

    #[test]
    fn test_normalise_drops_dangling_and_duplicate_ids() {
        let map: HashMap<_, _> = vec![event("e1", 10), event("orphan", 10)]
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();
        let order = vec!["e1".to_string(), "missing".to_string(), "e1".to_string()];

        let rundown = normalise(order, map, 7);

        assert_eq!(rundown.order, vec!["e1".to_string()]);
        assert_eq!(rundown.entries.len(), 1);
        assert_eq!(rundown.generation, 7);
    }

    #[test]
    fn test_playable_navigation() {
        let mut skipped = event("e2", 10);
        skipped.skip = true;
        let rundown = build(vec![block("b"), event("e1", 10), skipped, delay("d", 5), event("e3", 10)]);

        assert_eq!(rundown.first_playable().unwrap().id, "e1");
        assert_eq!(rundown.next_playable_after(1).unwrap().id, "e3");
        assert!(rundown.next_playable_after(4).is_none());
        assert_eq!(rundown.previous_playable_before(4).unwrap().id, "e1");
        assert!(rundown.previous_playable_before(1).is_none());
        assert_eq!(rundown.find_by_cue("E3").unwrap().id, "e3");
    }

    #[test]
    fn test_paginate_bounds() {
        let mut store = RundownStore::new();
        let (mut order, mut entries) = store.parts();
        for i in 0..5 {
            let e = event(&format!("e{}", i), 1_000);
            order.push(e.id.clone());
            entries.insert(e.id.clone(), e);
        }
        store.commit(order, entries);

        let page = store.paginate(1, Some(2)).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(
            page.entries.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
            vec!["e1", "e2"]
        );

        assert_eq!(store.paginate(5, None).unwrap().entries.len(), 0);
        assert!(matches!(store.paginate(6, None), Err(Error::InvalidRange(_))));
    }
}
