//! Run report
//!
//! Actual start and end instants of every entry played in this session.

use crate::playback::session::SessionEvent;
use rundown_common::events::EntryReport;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    entries: HashMap<String, EntryReport>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from a session lifecycle event
    ///
    /// A restart of an entry overwrites its previous run.
    pub fn record(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Started { entry_id, at } => {
                self.entries.insert(
                    entry_id.clone(),
                    EntryReport {
                        started_at: Some(*at),
                        ended_at: None,
                    },
                );
            }
            SessionEvent::Finished { entry_id, at, .. } => {
                self.entries.entry(entry_id.clone()).or_default().ended_at = Some(*at);
            }
        }
    }

    pub fn get(&self, entry_id: &str) -> Option<&EntryReport> {
        self.entries.get(entry_id)
    }

    /// Drop entries that no longer exist
    pub fn remove(&mut self, entry_ids: &[String]) {
        for id in entry_ids {
            self.entries.remove(id);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn snapshot(&self) -> HashMap<String, EntryReport> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
