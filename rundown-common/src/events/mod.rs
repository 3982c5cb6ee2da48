//! Event types for the rundown event system
//!
//! Provides the shared event definitions and the EventBus used to publish
//! changes to external collaborators (persistence, realtime publishing).

mod playback_types;
mod rundown_types;
mod shared_types;

pub use playback_types::{AuxDirection, AuxPlayback, OffsetMode, PlaybackState, TimerPhase};
pub use rundown_types::RundownChangeTrigger;
pub use shared_types::{AuxTimerState, EntryReport, OffsetSnapshot, TimerSnapshot, TimerState};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Rundown event types
///
/// Events are broadcast via EventBus and can be serialized for any transport
/// the collaborators choose. The engine never depends on who is listening.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RundownEvent {
    /// The rundown was rebuilt
    ///
    /// Triggers:
    /// - Persistence: mirror the new order/entries, keyed by generation
    /// - Publishing: refresh rundown views
    RundownChanged {
        /// Generation of the rebuilt projection
        generation: u64,
        /// Why the rundown changed
        trigger: RundownChangeTrigger,
        /// Number of entries after the change
        entry_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Playback state changed
    PlaybackStateChanged {
        old_state: PlaybackState,
        new_state: PlaybackState,
        /// Active entry after the change
        entry_id: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// An entry's timer started running
    EntryStarted {
        entry_id: String,
        timestamp: DateTime<Utc>,
    },

    /// An entry was closed out
    EntryFinished {
        entry_id: String,
        /// Running time excluding pauses
        elapsed_ms: i64,
        /// False when stopped or replaced before its countdown reached zero
        completed: bool,
        timestamp: DateTime<Utc>,
    },

    /// A delay marker was consumed into downstream timing
    DelayApplied {
        delay_id: String,
        magnitude_ms: i64,
        /// Entries whose start would have gone below zero
        clamped: Vec<String>,
        generation: u64,
        timestamp: DateTime<Utc>,
    },

    /// On-air flag toggled
    OnAirChanged {
        on_air: bool,
        timestamp: DateTime<Utc>,
    },

    /// Offset reference switched
    OffsetModeChanged {
        mode: OffsetMode,
        timestamp: DateTime<Utc>,
    },

    /// Auxiliary timer command applied
    AuxTimerChanged {
        state: AuxTimerState,
        timestamp: DateTime<Utc>,
    },

    /// Periodic timer snapshot from the clock task
    TimerTick(TimerSnapshot),
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use rundown_common::events::{EventBus, RundownEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(RundownEvent::OnAirChanged {
///     on_air: true,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(RundownEvent::OnAirChanged { on_air: true, .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RundownEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before lagging subscribers lose old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RundownEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: RundownEvent,
    ) -> Result<usize, broadcast::error::SendError<RundownEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: RundownEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
