//! Playback operations module
//!
//! **Responsibilities:**
//! - Playback transitions (arm, start, play, pause, stop, advance, reload, roll)
//! - Added time and on-air flag
//! - Settling transitions the clock task found due (end action, roll windows)
//! - Run report access

use super::core::{EngineInner, RundownEngine};
use crate::error::{Error, Result};
use crate::playback::{derive_timer, PlaybackTarget, Transition};
use chrono::{DateTime, Utc};
use rundown_common::config::EndAction;
use rundown_common::events::{PlaybackState, RundownEvent};
use rundown_common::human_time::format_millis;
use tracing::{debug, info};

impl RundownEngine {
    /// Select an entry without starting it
    pub async fn arm(&self, target: impl Into<PlaybackTarget>) -> Result<()> {
        let target = target.into();
        self.transition(|inner, now| {
            let rundown = inner.store.view();
            let entry = target.resolve(rundown, inner.session.active_entry_id.as_deref())?;
            info!(entry_id = %entry.id, "Arming {}", target);
            inner.session.arm(rundown, &entry.id, now).map(|t| vec![t])
        })
        .await
    }

    /// Arm and immediately play
    pub async fn start(&self, target: impl Into<PlaybackTarget>) -> Result<()> {
        let target = target.into();
        self.transition(|inner, now| {
            let rundown = inner.store.view();
            let entry = target.resolve(rundown, inner.session.active_entry_id.as_deref())?;
            info!(entry_id = %entry.id, "Starting {}", target);
            let armed = inner.session.arm(rundown, &entry.id, now)?;
            let played = inner.session.play(rundown, now)?;
            Ok(vec![armed, played])
        })
        .await
    }

    /// Play the armed entry, resume from pause, or start the show from the top
    pub async fn play(&self) -> Result<()> {
        self.transition(|inner, now| {
            let rundown = inner.store.view();
            if inner.session.state != PlaybackState::Stop {
                return inner.session.play(rundown, now).map(|t| vec![t]);
            }

            if rundown.is_empty() {
                return Err(Error::InvalidState("Rundown is empty".to_string()));
            }
            let first = rundown
                .first_playable()
                .ok_or_else(|| Error::InvalidState("No playable entries".to_string()))?;
            let armed = inner.session.arm(rundown, &first.id, now)?;
            let played = inner.session.play(rundown, now)?;
            Ok(vec![armed, played])
        })
        .await
    }

    pub async fn pause(&self) -> Result<()> {
        self.transition(|inner, now| inner.session.pause(now).map(|t| vec![t]))
            .await
    }

    /// Stop playback from any state
    pub async fn stop(&self) -> Result<()> {
        self.transition(|inner, now| Ok(vec![inner.session.stop(inner.store.view(), now)]))
            .await
    }

    /// Close out the active entry and play the next playable one
    pub async fn advance(&self) -> Result<()> {
        self.transition(|inner, now| {
            inner
                .session
                .advance(inner.store.view(), now)
                .map(|t| vec![t])
        })
        .await
    }

    /// Restart the active entry from zero, armed
    pub async fn reload(&self) -> Result<()> {
        self.transition(|inner, now| {
            inner
                .session
                .reload(inner.store.view(), now)
                .map(|t| vec![t])
        })
        .await
    }

    /// Enter roll mode with the show epoch at `epoch` (default: now)
    pub async fn roll(&self, epoch: Option<DateTime<Utc>>) -> Result<()> {
        self.transition(|inner, now| {
            let epoch = epoch.unwrap_or(now);
            info!("Rolling with show epoch {}", epoch);
            let entered = inner.session.roll(epoch)?;
            let settled = inner.session.settle_roll(inner.store.view(), now);
            Ok(vec![entered, settled])
        })
        .await
    }

    /// Shift the active countdown by `delta` ms
    pub async fn adjust_added_time(&self, delta: i64) -> Result<()> {
        let mut guard = self.inner.write().await;
        if guard
            .session
            .adjust_added_time(delta, self.config.max_added_time_ms)?
        {
            debug!(
                "Added time now {} ({:+}ms)",
                format_millis(guard.session.added_time),
                delta
            );
        }
        Ok(())
    }

    /// Toggle the on-air flag; independent of playback state
    pub async fn set_on_air(&self, on_air: bool) {
        let mut guard = self.inner.write().await;
        if guard.session.set_on_air(on_air) {
            info!(on_air, "On-air changed");
            self.events.emit_lossy(RundownEvent::OnAirChanged {
                on_air,
                timestamp: self.clock.now(),
            });
        }
    }

    pub async fn clear_report(&self) {
        self.inner.write().await.report.clear();
    }

    /// Apply clock-driven transitions due at the current instant
    ///
    /// Submitted by the clock task as an ordinary mutation. Re-checks under the
    /// write lock, so a stale request is harmless. Returns true when playback
    /// changed.
    pub async fn settle(&self) -> bool {
        let mut guard = self.inner.write().await;
        let now = self.clock.now();
        let EngineInner {
            store,
            session,
            report,
            ..
        } = &mut *guard;
        let rundown = store.view();

        let transition = match session.state {
            PlaybackState::Roll => session.settle_roll(rundown, now),
            PlaybackState::Play => {
                let active = session.active_entry_id.as_deref().and_then(|id| rundown.get(id));
                let timer = derive_timer(session, active, &self.config.thresholds, now);
                if !timer.current.is_some_and(|current| current <= 0) {
                    return false;
                }

                match self.config.end_action {
                    EndAction::None => return false,
                    EndAction::Stop => {
                        info!("Entry reached zero, stopping");
                        session.stop(rundown, now)
                    }
                    EndAction::PlayNext => {
                        info!("Entry reached zero, playing next");
                        match session.advance(rundown, now) {
                            Ok(transition) => transition,
                            Err(_) => return false,
                        }
                    }
                }
            }
            _ => return false,
        };

        self.publish_transition(report, &transition);
        transition.is_change() || !transition.events.is_empty()
    }

    /// Run `step` under the write lock and publish the resulting transitions
    ///
    /// A failing step leaves the session as it was.
    async fn transition<F>(&self, step: F) -> Result<()>
    where
        F: FnOnce(&mut EngineInner, DateTime<Utc>) -> Result<Vec<Transition>>,
    {
        let mut guard = self.inner.write().await;
        let now = self.clock.now();
        let saved = guard.session.clone();

        match step(&mut *guard, now) {
            Ok(transitions) => {
                for transition in &transitions {
                    self.publish_transition(&mut guard.report, transition);
                }
                Ok(())
            }
            Err(e) => {
                guard.session = saved;
                Err(e)
            }
        }
    }
}
