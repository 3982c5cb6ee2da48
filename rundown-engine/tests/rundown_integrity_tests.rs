//! Rundown integrity through the engine API
//!
//! Covers structural mutations, their notifications, and how playback reacts
//! when the rundown changes underneath it.

use rundown_common::config::EngineConfig;
use rundown_common::events::{PlaybackState, RundownChangeTrigger, RundownEvent};
use rundown_common::{Clock, EntryDraft, EntryPatch, ManualClock};
use rundown_engine::{Error, RundownEngine};
use std::sync::Arc;
use tokio::sync::broadcast;

fn engine() -> (Arc<RundownEngine>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at_epoch());
    let engine = Arc::new(RundownEngine::new(EngineConfig::default(), clock.clone()));
    (engine, clock)
}

async fn seeded() -> (Arc<RundownEngine>, Arc<ManualClock>) {
    let (engine, clock) = engine();
    engine
        .load_drafts(vec![
            EntryDraft::event("One", 300_000).with_id("e1").with_cue("1"),
            EntryDraft::event("Two", 600_000).with_id("e2").with_cue("2"),
            EntryDraft::event("Three", 300_000).with_id("e3").with_cue("3"),
        ])
        .await
        .unwrap();
    (engine, clock)
}

fn drain(rx: &mut broadcast::Receiver<RundownEvent>) -> Vec<RundownEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn rundown_changes(events: &[RundownEvent]) -> Vec<(u64, RundownChangeTrigger)> {
    events
        .iter()
        .filter_map(|event| match event {
            RundownEvent::RundownChanged {
                generation,
                trigger,
                ..
            } => Some((*generation, *trigger)),
            _ => None,
        })
        .collect()
}

async fn assert_consistent(engine: &RundownEngine) {
    let rundown = engine.get_normalised().await;
    assert_eq!(rundown.order.len(), rundown.entries.len());
    for id in &rundown.order {
        assert!(rundown.entries.contains_key(id), "dangling id {}", id);
    }
}

#[tokio::test]
async fn test_each_mutation_publishes_its_generation() {
    let (engine, _clock) = engine();
    let mut rx = engine.subscribe();

    engine.insert(EntryDraft::event("A", 1_000).with_id("a"), 0).await.unwrap();
    engine.insert(EntryDraft::event("B", 1_000).with_id("b"), 1).await.unwrap();
    engine.swap("a", "b").await.unwrap();
    engine.reorder("a", 0, 1).await.unwrap();

    assert_eq!(
        rundown_changes(&drain(&mut rx)),
        vec![
            (1, RundownChangeTrigger::Insert),
            (2, RundownChangeTrigger::Insert),
            (3, RundownChangeTrigger::Swap),
            (4, RundownChangeTrigger::Reorder),
        ]
    );
    assert_eq!(engine.get_order().await, vec!["b".to_string(), "a".to_string()]);
}

#[tokio::test]
async fn test_batch_edit_bumps_generation_once() {
    let (engine, _clock) = seeded().await;
    let before = engine.generation().await;
    let mut rx = engine.subscribe();

    let ids = vec!["e1".to_string(), "e2".to_string(), "e3".to_string()];
    let patch = EntryPatch {
        is_public: Some(true),
        ..Default::default()
    };
    engine.batch_edit(&ids, patch).await.unwrap();

    assert_eq!(engine.generation().await, before + 1);
    assert_eq!(
        rundown_changes(&drain(&mut rx)),
        vec![(before + 1, RundownChangeTrigger::BatchEdit)]
    );
}

#[tokio::test]
async fn test_delete_unknown_id_is_silent_noop() {
    let (engine, _clock) = seeded().await;
    let before = engine.generation().await;
    let mut rx = engine.subscribe();

    let removed = engine.delete(&["ghost".to_string()]).await;

    assert!(removed.is_empty());
    assert_eq!(engine.generation().await, before);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_deleting_active_entry_forces_stop() {
    let (engine, clock) = seeded().await;
    engine.start("e2").await.unwrap();
    clock.advance(5_000);
    let mut rx = engine.subscribe();

    engine.delete(&["e2".to_string()]).await;

    assert_eq!(engine.playback_state().await, PlaybackState::Stop);
    assert!(engine.get_report().await.get("e2").is_none());

    let events = drain(&mut rx);
    assert!(matches!(events[0], RundownEvent::RundownChanged { .. }));
    assert!(events.iter().any(|event| matches!(
        event,
        RundownEvent::EntryFinished { entry_id, completed: false, .. } if entry_id == "e2"
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        RundownEvent::PlaybackStateChanged { new_state: PlaybackState::Stop, .. }
    )));
}

#[tokio::test]
async fn test_deleting_other_entries_keeps_playing() {
    let (engine, _clock) = seeded().await;
    engine.start("e2").await.unwrap();

    engine.delete(&["e3".to_string()]).await;

    let session = engine.session().await;
    assert_eq!(session.state, PlaybackState::Play);
    assert_eq!(session.active_entry_id.as_deref(), Some("e2"));
}

#[tokio::test]
async fn test_delete_all_forces_stop() {
    let (engine, _clock) = seeded().await;
    engine.arm("e1").await.unwrap();

    let removed = engine.delete_all().await;

    assert_eq!(removed.len(), 3);
    assert!(engine.is_empty().await);
    assert_eq!(engine.playback_state().await, PlaybackState::Stop);
    assert_eq!(engine.get_normalised().await.total_duration, 0);
}

#[tokio::test]
async fn test_apply_delay_scenario() {
    let (engine, _clock) = seeded().await;
    let delay = engine.insert(EntryDraft::delay(180_000).with_id("d"), 1).await.unwrap();
    assert_eq!(delay.time_start, 300_000);
    let mut rx = engine.subscribe();

    let outcome = engine.apply_delay("d").await.unwrap();

    let rundown = engine.get_normalised().await;
    assert!(rundown.get("d").is_none());
    assert_eq!(rundown.get("e2").unwrap().time_start, 480_000);
    assert_eq!(rundown.get("e3").unwrap().time_start, 1_080_000);
    assert_eq!(rundown.total_duration, 1_380_000);

    let events = drain(&mut rx);
    assert_eq!(
        rundown_changes(&events),
        vec![(outcome.generation, RundownChangeTrigger::ApplyDelay)]
    );
    assert!(matches!(
        events.last(),
        Some(RundownEvent::DelayApplied { magnitude_ms: 180_000, clamped, .. }) if clamped.is_empty()
    ));
}

#[tokio::test]
async fn test_negative_delay_pulls_entries_forward() {
    let (engine, _clock) = seeded().await;
    engine.insert(EntryDraft::delay(-400_000).with_id("d"), 1).await.unwrap();
    let mut rx = engine.subscribe();

    // Planned starts before the delay: e2=300000, e3=900000
    let outcome = engine.apply_delay("d").await.unwrap();
    assert_eq!(outcome.clamped, vec!["e2".to_string()]);

    let rundown = engine.get_normalised().await;
    assert_eq!(rundown.get("e1").unwrap().time_start, 0);
    assert_eq!(rundown.get("e2").unwrap().time_start, 0);
    assert_eq!(rundown.get("e3").unwrap().time_start, 500_000);
    assert_eq!(rundown.total_duration, 800_000);

    assert!(matches!(
        drain(&mut rx).last(),
        Some(RundownEvent::DelayApplied { magnitude_ms: -400_000, clamped, .. })
            if clamped == &vec!["e2".to_string()]
    ));
    assert_consistent(&engine).await;
}

#[tokio::test]
async fn test_apply_delay_errors() {
    let (engine, _clock) = seeded().await;
    assert!(matches!(engine.apply_delay("e1").await, Err(Error::NotFound(_))));
    assert!(matches!(engine.apply_delay("").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_pagination_and_lookups() {
    let (engine, _clock) = seeded().await;

    let page = engine.get_paginated(1, Some(1)).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.entries[0].id, "e2");

    let tail = engine.get_paginated(2, None).await.unwrap();
    assert_eq!(tail.entries.len(), 1);
    assert!(matches!(
        engine.get_paginated(4, None).await,
        Err(Error::InvalidRange(_))
    ));

    assert_eq!(engine.get_by_cue("3").await.unwrap().id, "e3");
    assert_eq!(engine.index_of("e2").await.unwrap(), 1);
    assert_eq!(engine.len().await, 3);
    assert!(matches!(engine.get_by_id("zz").await, Err(Error::NotFound(_))));
    assert!(matches!(engine.get_by_cue("9").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_edit_upstream_updates_offset_immediately() {
    let (engine, clock) = seeded().await;
    engine.start("e1").await.unwrap();
    clock.advance(300_000);
    engine.advance().await.unwrap();
    assert_eq!(engine.poll_timer_snapshot().await.offset.offset, 0);

    let patch = EntryPatch {
        duration: Some(240_000),
        ..Default::default()
    };
    engine.edit("e1", patch).await.unwrap();

    let snapshot = engine.poll_timer_snapshot().await;
    assert_eq!(snapshot.active_entry.unwrap().time_start, 240_000);
    assert_eq!(snapshot.offset.offset, 60_000);
}

#[tokio::test]
async fn test_concurrent_inserts_all_applied() {
    let (engine, _clock) = engine();

    let mut handles = Vec::new();
    for i in 0..20 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .insert(EntryDraft::event(format!("E{}", i), 1_000), 0)
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(engine.len().await, 20);
    assert_eq!(engine.generation().await, 20);
    assert_eq!(engine.get_normalised().await.total_duration, 20_000);
    assert_consistent(&engine).await;
}

#[tokio::test]
async fn test_load_rundown_from_persisted_state() {
    let (source, _clock) = seeded().await;
    let persisted = source.get_normalised().await;

    let (engine, _clock) = engine();
    let mut rx = engine.subscribe();
    let generation = engine
        .load_rundown(persisted.iter().cloned().collect(), persisted.order.clone())
        .await
        .unwrap();

    assert_eq!(generation, 1);
    assert_eq!(engine.get_by_id("e3").await.unwrap().time_start, 900_000);
    assert_eq!(
        rundown_changes(&drain(&mut rx)),
        vec![(1, RundownChangeTrigger::Load)]
    );

    let mut bad_order = persisted.order.clone();
    bad_order.push("missing".to_string());
    assert!(matches!(
        engine
            .load_rundown(persisted.iter().cloned().collect(), bad_order)
            .await,
        Err(Error::Validation(_))
    ));
}

#[tokio::test]
async fn test_snapshot_generation_tracks_store() {
    let (engine, clock) = seeded().await;
    let before = engine.poll_timer_snapshot().await;
    engine.insert(EntryDraft::block("Act 2"), 2).await.unwrap();
    let after = engine.poll_timer_snapshot().await;

    assert_eq!(after.generation, before.generation + 1);
    assert_eq!(after.timestamp, clock.now());
}
