//! Structural operations on the rundown
//!
//! Every operation works on a copy of `(order, entries)` and finishes with a
//! single `commit`, so a failed validation leaves the store untouched and a
//! successful one is observed as exactly one new generation.

use crate::error::{Error, Result};
use crate::rundown::store::RundownStore;
use rundown_common::{id_utils, EntryDraft, EntryKind, EntryPatch, RundownEntry};
use std::collections::{HashMap, HashSet};
use tracing::debug;

impl RundownStore {
    /// Seed the store from persisted state
    ///
    /// `order` and `entries` must describe the same set of ids. Stored times
    /// are ignored and recomputed from durations and gaps.
    pub fn load(&mut self, entries: Vec<RundownEntry>, order: Vec<String>) -> Result<u64> {
        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            validate_stored(&entry)?;
            if map.contains_key(&entry.id) {
                return Err(Error::Validation(format!("Duplicate entry id {}", entry.id)));
            }
            map.insert(entry.id.clone(), entry);
        }

        let mut seen = HashSet::with_capacity(order.len());
        for id in &order {
            if !seen.insert(id.as_str()) {
                return Err(Error::Validation(format!("Id {} appears twice in order", id)));
            }
            if !map.contains_key(id) {
                return Err(Error::Validation(format!("Ordered id {} has no entry", id)));
            }
        }
        if map.len() != order.len() {
            return Err(Error::Validation(format!(
                "{} entries are not referenced by order",
                map.len() - order.len()
            )));
        }

        Ok(self.commit(order, map))
    }

    /// Insert a new entry at `position` (clamped to `[0, len]`)
    ///
    /// Returns the stored entry with its computed times.
    pub fn insert(&mut self, draft: EntryDraft, position: usize) -> Result<RundownEntry> {
        let id = match draft.id.as_deref() {
            Some(id) if id_utils::is_valid(id) => id.to_string(),
            _ => id_utils::generate(),
        };
        if self.view().get(&id).is_some() {
            return Err(Error::Validation(format!("Entry {} already exists", id)));
        }

        let position = position.min(self.len());
        let cursor = self.view().cursor_before(position);
        let entry = entry_from_draft(draft, id.clone(), cursor)?;

        let (mut order, mut entries) = self.parts();
        order.insert(position, id.clone());
        entries.insert(id.clone(), entry);
        let generation = self.commit(order, entries);

        debug!(entry_id = %id, position, generation, "Inserted entry");
        self.get(&id).cloned()
    }

    /// Apply a partial update to one entry
    pub fn edit(&mut self, id: &str, patch: &EntryPatch) -> Result<RundownEntry> {
        let index = self
            .view()
            .index_of(id)
            .ok_or_else(|| Error::NotFound(format!("Entry {}", id)))?;

        let mut entry = self.get(id)?.clone();
        apply_patch(&mut entry, patch, self.view().cursor_before(index))?;

        let (order, mut entries) = self.parts();
        entries.insert(id.to_string(), entry);
        self.commit(order, entries);

        self.get(id).cloned()
    }

    /// Apply the same patch to several entries with a single rebuild
    ///
    /// All ids must exist; on any failure nothing is applied.
    pub fn batch_edit(&mut self, ids: &[String], patch: &EntryPatch) -> Result<Vec<RundownEntry>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let (order, mut entries) = self.parts();
        for id in ids {
            let index = self
                .view()
                .index_of(id)
                .ok_or_else(|| Error::NotFound(format!("Entry {}", id)))?;
            let cursor = self.view().cursor_before(index);
            let entry = entries
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(format!("Entry {}", id)))?;
            apply_patch(entry, patch, cursor)?;
        }
        self.commit(order, entries);

        ids.iter().map(|id| self.get(id).cloned()).collect()
    }

    /// Remove every listed id that exists
    ///
    /// Unknown ids are ignored. Returns the ids actually removed; when nothing
    /// matched the store is left at the same generation.
    pub fn delete(&mut self, ids: &[String]) -> Vec<String> {
        let doomed: HashSet<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| self.view().get(id).is_some())
            .collect();
        if doomed.is_empty() {
            return Vec::new();
        }

        let (mut order, mut entries) = self.parts();
        let removed: Vec<String> = order
            .iter()
            .filter(|id| doomed.contains(id.as_str()))
            .cloned()
            .collect();
        order.retain(|id| !doomed.contains(id.as_str()));
        entries.retain(|id, _| !doomed.contains(id.as_str()));
        self.commit(order, entries);

        removed
    }

    /// Remove everything, returning the ids that were present
    pub fn delete_all(&mut self) -> Vec<String> {
        let removed = self.order().to_vec();
        self.commit(Vec::new(), HashMap::new());
        removed
    }

    /// Move `id` from position `from` to position `to`
    ///
    /// `from` must still hold `id`, which guards against callers working from
    /// a stale view. `from == to` succeeds without a rebuild.
    pub fn reorder(&mut self, id: &str, from: usize, to: usize) -> Result<()> {
        let len = self.len();
        if from >= len || to >= len {
            return Err(Error::InvalidRange(format!(
                "Reorder {} -> {} outside rundown of length {}",
                from, to, len
            )));
        }
        if self.order()[from] != id {
            return Err(Error::InvalidRange(format!(
                "Entry {} is not at position {}",
                id, from
            )));
        }
        if from == to {
            return Ok(());
        }

        let (mut order, entries) = self.parts();
        let moved = order.remove(from);
        order.insert(to, moved);
        self.commit(order, entries);
        Ok(())
    }

    /// Exchange the positions of two entries
    pub fn swap(&mut self, id_a: &str, id_b: &str) -> Result<()> {
        let index_a = self
            .view()
            .index_of(id_a)
            .ok_or_else(|| Error::NotFound(format!("Entry {}", id_a)))?;
        let index_b = self
            .view()
            .index_of(id_b)
            .ok_or_else(|| Error::NotFound(format!("Entry {}", id_b)))?;
        if index_a == index_b {
            return Ok(());
        }

        let (mut order, entries) = self.parts();
        order.swap(index_a, index_b);
        self.commit(order, entries);
        Ok(())
    }
}

/// Build a stored entry from a draft placed after `cursor`
fn entry_from_draft(draft: EntryDraft, id: String, cursor: i64) -> Result<RundownEntry> {
    let (duration, gap, span) = match draft.kind {
        EntryKind::Event => {
            if let Some(start) = draft.time_start {
                if start < 0 {
                    return Err(Error::Validation("timeStart must not be negative".to_string()));
                }
            }
            let start = draft.time_start.unwrap_or(cursor);
            if let Some(end) = draft.time_end {
                if end < start {
                    return Err(Error::Validation(format!(
                        "timeEnd {} before timeStart {}",
                        end, start
                    )));
                }
            }
            let span = draft.time_end.map(|end| end - start);
            let duration = draft.duration.or(span).unwrap_or(0);
            if duration < 0 {
                return Err(Error::Validation(format!("Negative duration {}", duration)));
            }
            (
                duration,
                draft.time_start.map_or(0, |s| s - cursor),
                span.filter(|span| *span != duration),
            )
        }
        EntryKind::Delay => {
            if draft.time_start.is_some() || draft.time_end.is_some() {
                return Err(Error::Validation(
                    "Delay entries carry a magnitude only".to_string(),
                ));
            }
            (draft.duration.unwrap_or(0), 0, None)
        }
        EntryKind::Block => {
            if draft.time_start.is_some() || draft.time_end.is_some() {
                return Err(Error::Validation("Block entries have no times".to_string()));
            }
            if draft.duration.is_some_and(|d| d != 0) {
                return Err(Error::Validation("Block duration must be zero".to_string()));
            }
            (0, 0, None)
        }
    };

    Ok(RundownEntry {
        id,
        kind: draft.kind,
        cue: draft.cue,
        title: draft.title,
        is_public: draft.is_public,
        colour: draft.colour,
        custom_fields: draft.custom_fields,
        skip: draft.skip,
        time_start: 0,
        time_end: 0,
        duration,
        gap,
        span,
    })
}

/// Apply `patch` to a computed entry whose timeline position starts at `cursor`
fn apply_patch(entry: &mut RundownEntry, patch: &EntryPatch, cursor: i64) -> Result<()> {
    match entry.kind {
        EntryKind::Event => {
            let start = patch.time_start.unwrap_or(entry.time_start);
            if start < 0 {
                return Err(Error::Validation("timeStart must not be negative".to_string()));
            }
            if let Some(end) = patch.time_end {
                if end < start {
                    return Err(Error::Validation(format!(
                        "timeEnd {} before timeStart {}",
                        end, start
                    )));
                }
            }
            let span = patch.time_end.map(|end| end - start).or(entry.span);
            // A duration the caller declared apart from the times stays put
            let duration = match (patch.duration, patch.time_end) {
                (Some(duration), _) => duration,
                (None, Some(end)) if entry.span.is_none() => end - start,
                _ => entry.duration,
            };
            if duration < 0 {
                return Err(Error::Validation(format!("Negative duration {}", duration)));
            }

            entry.duration = duration;
            entry.span = span.filter(|span| *span != duration);
            if let Some(start) = patch.time_start {
                entry.gap = start - cursor;
            }
        }
        EntryKind::Delay => {
            if patch.time_start.is_some() || patch.time_end.is_some() {
                return Err(Error::Validation(
                    "Delay entries carry a magnitude only".to_string(),
                ));
            }
            if let Some(magnitude) = patch.duration {
                entry.duration = magnitude;
            }
        }
        EntryKind::Block => {
            if patch.time_start.is_some()
                || patch.time_end.is_some()
                || patch.duration.is_some_and(|d| d != 0)
            {
                return Err(Error::Validation("Block entries have no timing".to_string()));
            }
        }
    }

    if let Some(cue) = &patch.cue {
        entry.cue = cue.clone();
    }
    if let Some(title) = &patch.title {
        entry.title = title.clone();
    }
    if let Some(is_public) = patch.is_public {
        entry.is_public = is_public;
    }
    if let Some(colour) = &patch.colour {
        entry.colour = colour.clone();
    }
    if let Some(fields) = &patch.custom_fields {
        entry
            .custom_fields
            .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    if let Some(skip) = patch.skip {
        entry.skip = skip;
    }

    Ok(())
}

/// Kind constraints for entries coming from persistence
fn validate_stored(entry: &RundownEntry) -> Result<()> {
    if !id_utils::is_valid(&entry.id) {
        return Err(Error::Validation("Entry id must not be blank".to_string()));
    }
    match entry.kind {
        EntryKind::Event if entry.duration < 0 || entry.span.is_some_and(|s| s < 0) => {
            Err(Error::Validation(format!(
                "Event {} has negative duration or span",
                entry.id
            )))
        }
        EntryKind::Delay | EntryKind::Block if entry.span.is_some() => Err(Error::Validation(
            format!("{} {} cannot carry a span", entry.kind, entry.id),
        )),
        EntryKind::Block if entry.duration != 0 => Err(Error::Validation(format!(
            "Block {} has non-zero duration",
            entry.id
        ))),
        _ => Ok(()),
    }
}
