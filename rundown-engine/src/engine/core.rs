//! Engine core
//!
//! **Responsibilities:**
//! - Own the rundown store, playback session and run report behind one lock
//! - Read accessors that never observe a partially applied mutation
//! - Timer snapshot computation shared by polling and the clock task, including
//!   the offset reference and the auxiliary timer
//! - Event publishing for transitions and rundown changes
//!
//! All mutations take the write half of a fair `tokio::sync::RwLock`, so they
//! are applied one at a time in arrival order. Events are emitted while the
//! write lock is still held, which keeps their order identical to the order of
//! the mutations that produced them.

use crate::error::{Error, Result};
use crate::playback::roll::{self, RollPosition};
use crate::playback::{
    derive_timer, AuxTimer, OffsetTracker, PlaybackSession, RunReport, SessionEvent, Transition,
};
use crate::rundown::{NormalisedRundown, RundownPage, RundownStore};
use chrono::{DateTime, Utc};
use rundown_common::config::{EndAction, EngineConfig};
use rundown_common::events::{
    EntryReport, EventBus, PlaybackState, RundownChangeTrigger, RundownEvent, TimerSnapshot,
};
use rundown_common::human_time::format_millis;
use rundown_common::time::{millis_between, Clock, SystemClock};
use rundown_common::RundownEntry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

/// State guarded by the engine lock
#[derive(Debug, Default)]
pub(super) struct EngineInner {
    pub(super) store: RundownStore,
    pub(super) session: PlaybackSession,
    pub(super) report: RunReport,
    pub(super) offset: OffsetTracker,
    pub(super) aux: AuxTimer,
}

/// Single-instance rundown timing and playback service
///
/// Callers share it behind an `Arc`; there is no global instance.
pub struct RundownEngine {
    pub(super) inner: RwLock<EngineInner>,
    pub(super) events: EventBus,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) config: EngineConfig,
}

impl RundownEngine {
    /// Create an engine with an empty rundown
    ///
    /// Out-of-range tick period or channel capacity are clamped.
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let config = config.sanitised();
        info!(
            tick_interval_ms = config.tick_interval_ms,
            end_action = ?config.end_action,
            offset_mode = %config.offset_mode,
            "Creating rundown engine"
        );

        let inner = EngineInner {
            offset: OffsetTracker::new(config.offset_mode),
            ..Default::default()
        };
        Self {
            inner: RwLock::new(inner),
            events: EventBus::new(config.event_capacity),
            clock,
            config,
        }
    }

    /// Engine reading the system clock
    pub fn with_system_clock(config: EngineConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Subscribe to rundown, playback and timer events
    pub fn subscribe(&self) -> broadcast::Receiver<RundownEvent> {
        self.events.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ========================================
    // Rundown reads
    // ========================================

    /// Cached normalised projection
    pub async fn get_normalised(&self) -> Arc<NormalisedRundown> {
        self.inner.read().await.store.normalised()
    }

    pub async fn get_order(&self) -> Vec<String> {
        self.inner.read().await.store.order().to_vec()
    }

    pub async fn get_by_id(&self, id: &str) -> Result<RundownEntry> {
        self.inner.read().await.store.get(id).cloned()
    }

    pub async fn get_by_cue(&self, cue: &str) -> Result<RundownEntry> {
        self.inner
            .read()
            .await
            .store
            .view()
            .find_by_cue(cue)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Cue {}", cue)))
    }

    /// Position of `id` in the order
    pub async fn index_of(&self, id: &str) -> Result<usize> {
        self.inner
            .read()
            .await
            .store
            .view()
            .index_of(id)
            .ok_or_else(|| Error::NotFound(format!("Entry {}", id)))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.store.is_empty()
    }

    pub async fn get_paginated(&self, offset: usize, limit: Option<usize>) -> Result<RundownPage> {
        self.inner.read().await.store.paginate(offset, limit)
    }

    pub async fn generation(&self) -> u64 {
        self.inner.read().await.store.generation()
    }

    // ========================================
    // Playback reads
    // ========================================

    pub async fn session(&self) -> PlaybackSession {
        self.inner.read().await.session.clone()
    }

    pub async fn playback_state(&self) -> PlaybackState {
        self.inner.read().await.session.state
    }

    /// Actual start/end per entry played this session
    pub async fn get_report(&self) -> HashMap<String, EntryReport> {
        self.inner.read().await.report.snapshot()
    }

    /// Timer, active/next entries and offset at the current instant
    pub async fn poll_timer_snapshot(&self) -> TimerSnapshot {
        let inner = self.inner.read().await;
        self.snapshot_locked(&inner, self.clock.now())
    }

    /// One clock tick: snapshot, publish, then settle anything due
    ///
    /// Waits at most `lock_wait` for an in-flight mutation; returns `None` when
    /// the tick was skipped.
    pub async fn tick(&self, lock_wait: Duration) -> Option<TimerSnapshot> {
        let (snapshot, due) = {
            let inner = tokio::time::timeout(lock_wait, self.inner.read()).await.ok()?;
            let now = self.clock.now();
            (self.snapshot_locked(&inner, now), self.settle_due(&inner, now))
        };

        self.events
            .emit_lossy(RundownEvent::TimerTick(snapshot.clone()));

        if due {
            self.settle().await;
        }
        Some(snapshot)
    }

    /// Pure snapshot of `inner` at `now`
    ///
    /// In roll the active entry is resolved from the wall clock here as well,
    /// so a snapshot taken between ticks never lags the planned windows.
    pub(super) fn snapshot_locked(&self, inner: &EngineInner, now: DateTime<Utc>) -> TimerSnapshot {
        let rundown = inner.store.view();
        let mut view = inner.session.clone();
        view.settle_roll(rundown, now);

        let active = view
            .active_entry_id
            .as_deref()
            .and_then(|id| rundown.get(id));
        let next = match active.and_then(|entry| rundown.index_of(&entry.id)) {
            Some(index) => rundown.next_playable_after(index),
            None => self.roll_upcoming(&view, rundown, now),
        };

        TimerSnapshot {
            timestamp: now,
            generation: rundown.generation,
            timer: derive_timer(&view, active, &self.config.thresholds, now),
            active_entry: active.cloned(),
            next_entry: next.cloned(),
            offset: inner.offset.compute(&view, active, rundown.total_duration, now),
            on_air: view.on_air,
            aux: inner.aux.state_at(now, &self.config.thresholds),
        }
    }

    /// Next entry to activate while rolling between windows
    fn roll_upcoming<'a>(
        &self,
        session: &PlaybackSession,
        rundown: &'a NormalisedRundown,
        now: DateTime<Utc>,
    ) -> Option<&'a RundownEntry> {
        let epoch = session
            .show_started_at
            .filter(|_| session.state == PlaybackState::Roll)?;
        match roll::resolve(rundown, millis_between(epoch, now)) {
            RollPosition::Waiting(id) => rundown.get(&id),
            _ => None,
        }
    }

    /// Whether a clock-driven transition is due at `now`
    pub(super) fn settle_due(&self, inner: &EngineInner, now: DateTime<Utc>) -> bool {
        let rundown = inner.store.view();
        match inner.session.state {
            PlaybackState::Roll => inner.session.clone().settle_roll(rundown, now).is_change(),
            PlaybackState::Play if self.config.end_action != EndAction::None => {
                let active = inner
                    .session
                    .active_entry_id
                    .as_deref()
                    .and_then(|id| rundown.get(id));
                let timer = derive_timer(&inner.session, active, &self.config.thresholds, now);
                timer.current.is_some_and(|current| current <= 0)
            }
            _ => false,
        }
    }

    // ========================================
    // Event publishing
    // ========================================

    /// Record a transition in the report and publish its events
    pub(super) fn publish_transition(&self, report: &mut RunReport, transition: &Transition) {
        let now = self.clock.now();

        for event in &transition.events {
            report.record(event);
            match event {
                SessionEvent::Started { entry_id, at } => {
                    debug!(entry_id = %entry_id, "Entry started");
                    self.events.emit_lossy(RundownEvent::EntryStarted {
                        entry_id: entry_id.clone(),
                        timestamp: *at,
                    });
                }
                SessionEvent::Finished {
                    entry_id,
                    elapsed,
                    completed,
                    at,
                } => {
                    info!(
                        entry_id = %entry_id,
                        completed,
                        "Entry finished after {}",
                        format_millis(*elapsed)
                    );
                    self.events.emit_lossy(RundownEvent::EntryFinished {
                        entry_id: entry_id.clone(),
                        elapsed_ms: *elapsed,
                        completed: *completed,
                        timestamp: *at,
                    });
                }
            }
        }

        if transition.is_change() {
            info!(
                "Playback {} -> {} (entry {:?})",
                transition.old_state, transition.new_state, transition.entry_id
            );
            self.events.emit_lossy(RundownEvent::PlaybackStateChanged {
                old_state: transition.old_state,
                new_state: transition.new_state,
                entry_id: transition.entry_id.clone(),
                timestamp: now,
            });
        }
    }

    /// Hold the write lock for `hold`, standing in for a slow mutation
    #[doc(hidden)]
    pub async fn test_hold_write_lock(&self, hold: Duration) {
        let _guard = self.inner.write().await;
        tokio::time::sleep(hold).await;
    }

    /// Publish a rebuild if the generation moved
    pub(super) fn publish_rundown_change(
        &self,
        store: &RundownStore,
        previous_generation: u64,
        trigger: RundownChangeTrigger,
    ) {
        let generation = store.generation();
        if generation == previous_generation {
            return;
        }

        debug!(
            generation,
            entries = store.len(),
            "Rundown rebuilt ({}), total {}",
            trigger,
            format_millis(store.view().total_duration)
        );
        self.events.emit_lossy(RundownEvent::RundownChanged {
            generation,
            trigger,
            entry_count: store.len(),
            timestamp: self.clock.now(),
        });
    }
}

impl std::fmt::Debug for RundownEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RundownEngine")
            .field("config", &self.config)
            .field("events", &self.events)
            .finish()
    }
}
