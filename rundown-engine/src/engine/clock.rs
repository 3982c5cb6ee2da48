//! Clock task
//!
//! Publishes a `TimerTick` snapshot at a fixed sub-second interval. The task
//! only reads engine state. When a tick finds a transition due (countdown
//! reached zero, roll window crossed) it submits `settle` as an ordinary
//! mutation behind any writer already queued.

use super::core::RundownEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Handle to a running clock task
#[derive(Debug)]
pub struct ClockTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ClockTask {
    /// Stop the task and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            debug!("Clock task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawn the periodic clock task for `engine`
pub fn spawn_clock_task(engine: Arc<RundownEngine>) -> ClockTask {
    let (shutdown, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(run(engine, shutdown_rx));
    ClockTask { shutdown, handle }
}

async fn run(engine: Arc<RundownEngine>, mut shutdown_rx: watch::Receiver<bool>) {
    let period = Duration::from_millis(engine.config().tick_interval_ms);
    let lock_wait = Duration::from_millis(engine.config().tick_lock_wait_ms);

    info!("Clock task started ({}ms interval)", period.as_millis());

    let mut tick = interval(period);
    // A late tick is dropped, never queued behind the next one
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
        }

        if engine.tick(lock_wait).await.is_none() {
            debug!("Writer busy, skipping tick");
        }
    }

    info!("Clock task stopping");
}
