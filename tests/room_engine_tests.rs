// SPDX-License-Identifier: MIT

//! Room engine lifecycle tests.
//!
//! Timer-driven paths run under a paused tokio clock so the countdown
//! and the challenge window elapse instantly.

use challenge_rooms::models::event::{EventFilter, RawEvent};
use challenge_rooms::models::room::{ParticipantStatus, Phase};
use challenge_rooms::services::room::{EngineConfig, RoomEngine};
use challenge_rooms::services::source::{
    EventPublisher, EventSource, MemoryEventPublisher, MemoryEventSource, SourceError,
};
use std::sync::Arc;
use std::time::Duration;

mod common;

fn fast_config() -> EngineConfig {
    EngineConfig {
        countdown: Duration::from_secs(2),
        challenge_window: Duration::from_secs(3600),
        poll_interval: Duration::from_secs(5),
        ..EngineConfig::default()
    }
}

fn engine_with_pool(
    authors: &[&str],
) -> (Arc<RoomEngine>, Arc<MemoryEventSource>, Arc<MemoryEventPublisher>) {
    let events = authors
        .iter()
        .enumerate()
        .map(|(i, a)| common::workout_event(a, 1_000 + i as i64, common::running_tags("0.5")))
        .collect();
    let source = Arc::new(MemoryEventSource::new(events));
    let publisher = Arc::new(MemoryEventPublisher::default());
    let engine = Arc::new(RoomEngine::new(
        source.clone() as Arc<dyn EventSource>,
        publisher.clone() as Arc<dyn EventPublisher>,
        fast_config(),
    ));
    (engine, source, publisher)
}

/// An in-window qualifying event for the room's current level 1.
fn completion_now(author: &str) -> RawEvent {
    common::workout_event(
        author,
        chrono::Utc::now().timestamp() + 1,
        common::running_tags("1.5"),
    )
}

#[tokio::test(start_paused = true)]
async fn test_countdown_opens_challenge_window() {
    let (engine, _, _) = engine_with_pool(&["a", "b", "c", "d"]);

    assert!(engine.form_room().await.unwrap());
    assert_eq!(engine.snapshot().await.phase, Phase::Formed);

    // Let the armed countdown fire.
    tokio::time::sleep(Duration::from_secs(3)).await;

    let state = engine.snapshot().await;
    assert_eq!(state.phase, Phase::Challenge);
    assert!(state.challenge_started_at.is_some());
    engine.cancel_timer();
}

#[tokio::test(start_paused = true)]
async fn test_partial_sweep_advances_survivors() {
    let (engine, source, _) = engine_with_pool(&["a", "b", "c", "d"]);
    engine.form_room().await.unwrap();
    engine.start_challenge().await.unwrap();

    let roster = engine.snapshot().await.participants.clone();
    source.push(completion_now(&roster[0]));
    source.push(completion_now(&roster[1]));

    let outcome = engine.run_sweep().await.unwrap();
    assert_eq!(
        outcome,
        challenge_rooms::models::room::SweepOutcome::Advanced {
            survivors: 2,
            eliminated: 2,
        }
    );

    let state = engine.snapshot().await;
    assert_eq!(state.phase, Phase::Formed);
    assert_eq!(state.current_level, 2);
    assert_eq!(state.participants.len(), 2);
    assert!(state.participants.contains(&roster[0]));
    assert!(state.participants.contains(&roster[1]));
    engine.cancel_timer();
}

#[tokio::test(start_paused = true)]
async fn test_empty_sweep_collapses_and_reforms() {
    let (engine, _, _) = engine_with_pool(&["a", "b", "c", "d"]);
    engine.form_room().await.unwrap();
    let first_room = engine.snapshot().await.room_id.clone();
    engine.start_challenge().await.unwrap();

    // Nobody completed anything in the window.
    let outcome = engine.run_sweep().await.unwrap();
    assert_eq!(outcome, challenge_rooms::models::room::SweepOutcome::Collapsed);

    // Re-formation runs on its own task; give it a beat.
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The pool is still populated, so a fresh room forms at level 1.
    let state = engine.snapshot().await;
    assert_eq!(state.phase, Phase::Formed);
    assert_eq!(state.current_level, 1);
    assert_ne!(state.room_id, first_room);
    engine.cancel_timer();
}

#[tokio::test(start_paused = true)]
async fn test_publisher_failure_is_not_fatal() {
    let source = Arc::new(MemoryEventSource::new(vec![
        common::workout_event("a", 1_000, common::running_tags("0.5")),
        common::workout_event("b", 1_001, common::running_tags("0.5")),
        common::workout_event("c", 1_002, common::running_tags("0.5")),
        common::workout_event("d", 1_003, common::running_tags("0.5")),
    ]));
    let publisher = Arc::new(MemoryEventPublisher::failing());
    let engine = Arc::new(RoomEngine::new(
        source.clone() as Arc<dyn EventSource>,
        publisher.clone() as Arc<dyn EventPublisher>,
        fast_config(),
    ));

    assert!(engine.form_room().await.unwrap());
    assert_eq!(engine.snapshot().await.phase, Phase::Formed);
    // The formation announcement draft was attempted and failed.
    assert_eq!(publisher.drafts.lock().unwrap().len(), 1);
    engine.cancel_timer();
}

#[tokio::test(start_paused = true)]
async fn test_manual_elimination_keeps_large_room_running() {
    let (engine, _, _) = engine_with_pool(&["a", "b", "c", "d"]);
    engine.form_room().await.unwrap();
    engine.start_challenge().await.unwrap();

    let target = engine.snapshot().await.participants[0].clone();
    engine.remove_participant(&target).await.unwrap();

    let state = engine.snapshot().await;
    assert_eq!(state.phase, Phase::Challenge);
    assert_eq!(
        state.participant_status[&target].status,
        ParticipantStatus::Eliminated
    );
    engine.cancel_timer();
}

#[tokio::test(start_paused = true)]
async fn test_elimination_below_minimum_reforms() {
    let (engine, _, _) = engine_with_pool(&["a", "b"]);
    engine.form_room().await.unwrap();
    let first_room = engine.snapshot().await.room_id.clone();
    engine.start_challenge().await.unwrap();

    let target = engine.snapshot().await.participants[0].clone();
    engine.remove_participant(&target).await.unwrap();

    // Below two active participants the room dissolves and a new one
    // forms from the pool.
    let state = engine.snapshot().await;
    assert_eq!(state.phase, Phase::Formed);
    assert_eq!(state.current_level, 1);
    assert_ne!(state.room_id, first_room);

    // The superseded room's challenge timer must never fire: only the
    // new room's countdown does, opening its own window.
    tokio::time::sleep(Duration::from_secs(3)).await;
    let state = engine.snapshot().await;
    assert_eq!(state.phase, Phase::Challenge);
    assert_eq!(state.current_level, 1);
    engine.cancel_timer();
}

/// Wraps the memory source with a suspension point, the way any real
/// network fetch has one.
struct SuspendingSource(MemoryEventSource);

#[async_trait::async_trait]
impl EventSource for SuspendingSource {
    async fn fetch_events(&self, filter: EventFilter) -> Result<Vec<RawEvent>, SourceError> {
        tokio::task::yield_now().await;
        self.0.fetch_events(filter).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_timer_driven_collapse_survives_fetch_suspension() {
    let events = ["a", "b", "c", "d"]
        .iter()
        .enumerate()
        .map(|(i, a)| common::workout_event(a, 1_000 + i as i64, common::running_tags("0.5")))
        .collect();
    let source = Arc::new(SuspendingSource(MemoryEventSource::new(events)));
    let publisher = Arc::new(MemoryEventPublisher::default());
    let engine = Arc::new(RoomEngine::new(
        source as Arc<dyn EventSource>,
        publisher as Arc<dyn EventPublisher>,
        fast_config(),
    ));

    engine.form_room().await.unwrap();
    let first_room = engine.snapshot().await.room_id.clone();

    // Countdown fires, the window times out with no completions, the
    // room collapses, and the timer-driven re-formation must still
    // land even though the fetch suspends mid-flight. By the end of
    // this sleep the fresh room's own countdown has fired too.
    let config = fast_config();
    tokio::time::sleep(config.countdown + config.challenge_window + config.countdown * 2).await;

    let state = engine.snapshot().await;
    assert_ne!(state.room_id, first_room);
    assert_eq!(state.current_level, 1);
    assert_eq!(state.phase, Phase::Challenge);
    engine.cancel_timer();
}

#[tokio::test(start_paused = true)]
async fn test_sweep_twice_needs_new_window() {
    let (engine, source, _) = engine_with_pool(&["a", "b", "c", "d"]);
    engine.form_room().await.unwrap();
    engine.start_challenge().await.unwrap();

    let roster = engine.snapshot().await.participants.clone();
    source.push(completion_now(&roster[0]));
    engine.run_sweep().await.unwrap();

    // The room is back in Formed; a second sweep without a new window
    // is rejected instead of double-eliminating.
    let err = engine.run_sweep().await.unwrap_err();
    assert!(matches!(
        err,
        challenge_rooms::services::room::EngineError::WrongPhase(Phase::Challenge)
    ));
    engine.cancel_timer();
}
