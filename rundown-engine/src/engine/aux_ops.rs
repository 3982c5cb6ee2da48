//! Auxiliary operations module
//!
//! **Responsibilities:**
//! - Offset reference mode and planned show start
//! - Auxiliary timer commands
//! - OffsetModeChanged / AuxTimerChanged event emission

use super::core::{EngineInner, RundownEngine};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rundown_common::events::{AuxDirection, AuxTimerState, OffsetMode, RundownEvent};
use tracing::{debug, info};

impl RundownEngine {
    pub async fn offset_mode(&self) -> OffsetMode {
        self.inner.read().await.offset.mode
    }

    /// Switch how the offset is measured; a no-op when unchanged
    pub async fn set_offset_mode(&self, mode: OffsetMode) {
        let mut guard = self.inner.write().await;
        if guard.offset.mode == mode {
            return;
        }
        guard.offset.mode = mode;
        info!(%mode, "Offset mode changed");
        self.events.emit_lossy(RundownEvent::OffsetModeChanged {
            mode,
            timestamp: self.clock.now(),
        });
    }

    /// Wall-clock instant the show is scheduled to begin
    ///
    /// Only absolute mode reads it.
    pub async fn set_planned_start(&self, planned_start: Option<DateTime<Utc>>) {
        let mut guard = self.inner.write().await;
        debug!(?planned_start, "Planned start set");
        guard.offset.planned_start = planned_start;
    }

    pub async fn aux_timer(&self) -> AuxTimerState {
        let inner = self.inner.read().await;
        inner.aux.state_at(self.clock.now(), &self.config.thresholds)
    }

    /// Start the aux timer, or resume it from pause
    pub async fn aux_start(&self) {
        self.aux_command("start", |inner, now| inner.aux.start(now))
            .await;
    }

    pub async fn aux_pause(&self) {
        self.aux_command("pause", |inner, now| inner.aux.pause(now))
            .await;
    }

    pub async fn aux_stop(&self) {
        self.aux_command("stop", |inner, _| inner.aux.stop()).await;
    }

    pub async fn aux_set_direction(&self, direction: AuxDirection) {
        self.aux_command("direction", |inner, _| inner.aux.set_direction(direction))
            .await;
    }

    /// Replace the countdown length
    pub async fn aux_set_duration(&self, duration: i64) -> Result<()> {
        let mut guard = self.inner.write().await;
        guard.aux.set_duration(duration)?;
        self.publish_aux(&guard, "duration");
        Ok(())
    }

    /// Lengthen or shorten the countdown by `delta`
    pub async fn aux_add_time(&self, delta: i64) {
        self.aux_command("add_time", |inner, _| {
            inner.aux.add_time(delta);
            true
        })
        .await;
    }

    async fn aux_command<F>(&self, command: &'static str, apply: F)
    where
        F: FnOnce(&mut EngineInner, DateTime<Utc>) -> bool,
    {
        let mut guard = self.inner.write().await;
        if apply(&mut *guard, self.clock.now()) {
            self.publish_aux(&guard, command);
        }
    }

    fn publish_aux(&self, inner: &EngineInner, command: &'static str) {
        let now = self.clock.now();
        let state = inner.aux.state_at(now, &self.config.thresholds);
        debug!(command, playback = ?state.playback, duration = state.duration, "Aux timer changed");
        self.events.emit_lossy(RundownEvent::AuxTimerChanged {
            state,
            timestamp: now,
        });
    }
}
