//! Rundown operations module
//!
//! **Responsibilities:**
//! - Structural mutations (load, insert, edit, batch edit, delete, reorder, swap)
//! - Delay application
//! - RundownChanged / DelayApplied event emission
//! - Playback reconciliation when the active entry disappears

use super::core::{EngineInner, RundownEngine};
use crate::error::Result;
use crate::rundown::{DelayOutcome, RundownStore};
use rundown_common::events::{PlaybackState, RundownChangeTrigger, RundownEvent};
use rundown_common::{EntryDraft, EntryPatch, RundownEntry};
use tracing::{info, warn};

impl RundownEngine {
    /// Seed the rundown from persisted state
    ///
    /// Playback stops if the active entry is not part of the new rundown.
    pub async fn load_rundown(&self, entries: Vec<RundownEntry>, order: Vec<String>) -> Result<u64> {
        let mut guard = self.inner.write().await;
        let previous = guard.store.generation();

        let generation = guard.store.load(entries, order)?;
        info!(generation, entries = guard.store.len(), "Loaded rundown");

        self.after_change(&mut guard, previous, RundownChangeTrigger::Load);
        Ok(generation)
    }

    /// Seed the rundown from drafts in playback order
    ///
    /// Drafts are placed one after another with the same rules as `insert`,
    /// then committed as a single load.
    pub async fn load_drafts(&self, drafts: Vec<EntryDraft>) -> Result<u64> {
        let mut scratch = RundownStore::new();
        for draft in drafts {
            let position = scratch.len();
            scratch.insert(draft, position)?;
        }

        let built = scratch.normalised();
        let entries = built.iter().cloned().collect();
        self.load_rundown(entries, built.order.clone()).await
    }

    /// Insert an entry at `position` (clamped)
    pub async fn insert(&self, draft: EntryDraft, position: usize) -> Result<RundownEntry> {
        let mut guard = self.inner.write().await;
        let previous = guard.store.generation();

        let entry = guard.store.insert(draft, position)?;
        info!(entry_id = %entry.id, kind = %entry.kind, position, "Inserted entry");

        self.after_change(&mut guard, previous, RundownChangeTrigger::Insert);
        Ok(entry)
    }

    pub async fn edit(&self, id: &str, patch: EntryPatch) -> Result<RundownEntry> {
        let mut guard = self.inner.write().await;
        let previous = guard.store.generation();

        let entry = guard.store.edit(id, &patch)?;
        info!(entry_id = id, timing = patch.touches_timing(), "Edited entry");

        self.after_change(&mut guard, previous, RundownChangeTrigger::Edit);
        Ok(entry)
    }

    /// Apply one patch to many entries with a single rebuild
    pub async fn batch_edit(&self, ids: &[String], patch: EntryPatch) -> Result<Vec<RundownEntry>> {
        let mut guard = self.inner.write().await;
        let previous = guard.store.generation();

        let entries = guard.store.batch_edit(ids, &patch)?;
        info!(count = entries.len(), "Batch edited entries");

        self.after_change(&mut guard, previous, RundownChangeTrigger::BatchEdit);
        Ok(entries)
    }

    /// Remove the given ids; unknown ids are ignored
    ///
    /// Returns the ids actually removed.
    pub async fn delete(&self, ids: &[String]) -> Vec<String> {
        let mut guard = self.inner.write().await;
        let previous = guard.store.generation();

        let removed = guard.store.delete(ids);
        if !removed.is_empty() {
            info!(count = removed.len(), "Deleted entries");
        }

        self.after_change(&mut guard, previous, RundownChangeTrigger::Delete);
        guard.report.remove(&removed);
        removed
    }

    /// Remove every entry and stop playback
    pub async fn delete_all(&self) -> Vec<String> {
        let mut guard = self.inner.write().await;
        let previous = guard.store.generation();

        let removed = guard.store.delete_all();
        info!(count = removed.len(), "Deleted all entries");

        // The active entry is gone, so this always lands in Stop
        self.after_change(&mut guard, previous, RundownChangeTrigger::DeleteAll);
        guard.report.remove(&removed);
        removed
    }

    /// Move `id` from `from` to `to`
    pub async fn reorder(&self, id: &str, from: usize, to: usize) -> Result<()> {
        let mut guard = self.inner.write().await;
        let previous = guard.store.generation();

        guard.store.reorder(id, from, to)?;
        info!(entry_id = id, from, to, "Reordered entry");

        self.after_change(&mut guard, previous, RundownChangeTrigger::Reorder);
        Ok(())
    }

    pub async fn swap(&self, id_a: &str, id_b: &str) -> Result<()> {
        let mut guard = self.inner.write().await;
        let previous = guard.store.generation();

        guard.store.swap(id_a, id_b)?;
        info!(first = id_a, second = id_b, "Swapped entries");

        self.after_change(&mut guard, previous, RundownChangeTrigger::Swap);
        Ok(())
    }

    /// Consume a delay marker into downstream timing
    pub async fn apply_delay(&self, delay_id: &str) -> Result<DelayOutcome> {
        let mut guard = self.inner.write().await;
        let previous = guard.store.generation();

        let outcome = guard.store.apply_delay(delay_id)?;

        self.after_change(&mut guard, previous, RundownChangeTrigger::ApplyDelay);
        self.events.emit_lossy(RundownEvent::DelayApplied {
            delay_id: outcome.delay_id.clone(),
            magnitude_ms: outcome.magnitude,
            clamped: outcome.clamped.clone(),
            generation: outcome.generation,
            timestamp: self.clock.now(),
        });
        Ok(outcome)
    }

    /// Publish the rebuild and bring playback in line with the new rundown
    fn after_change(&self, inner: &mut EngineInner, previous: u64, trigger: RundownChangeTrigger) {
        self.publish_rundown_change(&inner.store, previous, trigger);

        let EngineInner {
            store,
            session,
            report,
            ..
        } = inner;
        let now = self.clock.now();
        let rundown = store.view();

        let active_gone = session
            .active_entry_id
            .as_deref()
            .is_some_and(|id| rundown.get(id).is_none());
        if active_gone {
            warn!(
                entry_id = ?session.active_entry_id,
                "Active entry removed, stopping playback"
            );
            let transition = session.stop(rundown, now);
            self.publish_transition(report, &transition);
        } else if session.state == PlaybackState::Roll {
            let transition = session.settle_roll(rundown, now);
            self.publish_transition(report, &transition);
        }
    }
}
