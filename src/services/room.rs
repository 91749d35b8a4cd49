// SPDX-License-Identifier: MIT

//! Room progression engine.
//!
//! Owns one room's state behind a single-writer lock and drives the
//! Waiting -> Formed -> Challenge cycle: formation from the candidate
//! pool, the pre-challenge countdown, the 24-hour window, and the
//! timeout verification sweep.
//!
//! Timers are abortable tasks owned by the engine. Every transition
//! cancels the previous timer before scheduling the next, and each
//! scheduled callback carries the room generation it was armed for:
//! a callback that fires after its room was superseded is a no-op.

use crate::models::event::{EventFilter, RawEvent, KIND_WORKOUT};
use crate::models::room::{Phase, RoomState, SweepOutcome, MIN_ACTIVE_PARTICIPANTS, ROOM_SIZE};
use crate::services::completion::{find_completions, window_start_seconds};
use crate::services::publisher;
use crate::services::source::{EventPublisher, EventSource, SourceError};
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Engine errors. Timer-driven paths log these; API-driven paths
/// surface them to the caller.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("event source error: {0}")]
    Source(#[from] SourceError),

    #[error("room is not in the {0:?} phase")]
    WrongPhase(Phase),
}

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Target roster size.
    pub room_size: usize,
    /// How many recent workout events to scan for the candidate pool.
    pub pool_fetch_limit: u32,
    /// Pre-challenge preparation countdown.
    pub countdown: Duration,
    /// Challenge window length.
    pub challenge_window: Duration,
    /// How often the background poller retries formation while Waiting.
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            room_size: ROOM_SIZE,
            pool_fetch_limit: 100,
            countdown: Duration::from_secs(120),
            challenge_window: Duration::from_secs(24 * 60 * 60),
            poll_interval: Duration::from_secs(60),
        }
    }
}

/// The room progression engine. One instance per room slot; state
/// transitions are strictly serialized through the internal lock.
pub struct RoomEngine {
    state: Mutex<RoomState>,
    /// Bumped on every formation and sweep; stale timer callbacks
    /// compare against it and bail out.
    generation: AtomicU64,
    timer: StdMutex<Option<JoinHandle<()>>>,
    source: Arc<dyn EventSource>,
    publisher: Arc<dyn EventPublisher>,
    config: EngineConfig,
}

impl RoomEngine {
    pub fn new(
        source: Arc<dyn EventSource>,
        publisher: Arc<dyn EventPublisher>,
        config: EngineConfig,
    ) -> Self {
        Self {
            state: Mutex::new(RoomState::waiting()),
            generation: AtomicU64::new(0),
            timer: StdMutex::new(None),
            source,
            publisher,
            config,
        }
    }

    /// Current room state, cloned. Never blocks on network I/O.
    pub async fn snapshot(&self) -> RoomState {
        self.state.lock().await.clone()
    }

    /// Attempt the Waiting -> Formed transition: build a candidate pool
    /// from recent workout authors and sample a roster.
    ///
    /// Returns `true` if a room formed. An empty pool leaves the room
    /// Waiting; a pool smaller than the target size forms a degraded
    /// but functional room.
    pub async fn form_room(self: &Arc<Self>) -> Result<bool, EngineError> {
        let events = self
            .source
            .fetch_events(EventFilter {
                kinds: vec![KIND_WORKOUT],
                limit: Some(self.config.pool_fetch_limit),
                ..Default::default()
            })
            .await?;

        let mut pool: Vec<String> = Vec::new();
        for event in &events {
            if !pool.contains(&event.author) {
                pool.push(event.author.clone());
            }
        }
        if pool.is_empty() {
            tracing::debug!("Candidate pool empty; staying in Waiting");
            return Ok(false);
        }

        let roster: Vec<String> = {
            let mut rng = rand::thread_rng();
            pool.choose_multiple(&mut rng, self.config.room_size)
                .cloned()
                .collect()
        };
        if roster.len() < self.config.room_size {
            tracing::warn!(
                pool = pool.len(),
                target = self.config.room_size,
                "Candidate pool smaller than room size; forming degraded room"
            );
        }

        let room_id = publisher::generate_room_id();
        let level;
        {
            let mut state = self.state.lock().await;
            state.form(room_id.clone(), roster.clone(), 1);
            level = state.current_level;
        }
        let generation = self.bump_generation();

        tracing::info!(
            room_id = %room_id,
            participants = roster.len(),
            level,
            "Room formed"
        );

        let draft = publisher::room_formation_draft(
            &room_id,
            &roster,
            level,
            chrono::Utc::now().timestamp(),
        );
        publisher::publish_optimistic(&self.publisher, draft).await;

        self.schedule(self.config.countdown, generation, TimerKind::Countdown);
        Ok(true)
    }

    /// Formed -> Challenge: open the window and arm the timeout sweep.
    pub async fn start_challenge(self: &Arc<Self>) -> Result<(), EngineError> {
        {
            let mut state = self.state.lock().await;
            if state.phase != Phase::Formed {
                return Err(EngineError::WrongPhase(Phase::Formed));
            }
            state.start_challenge(chrono::Utc::now().timestamp_millis());
            tracing::info!(
                room_id = %state.room_id,
                level = state.current_level,
                "Challenge window opened"
            );
        }
        let generation = self.bump_generation();
        self.schedule(
            self.config.challenge_window,
            generation,
            TimerKind::ChallengeTimeout,
        );
        Ok(())
    }

    /// The authoritative timeout sweep: re-fetch every participant's
    /// in-window events, verify them, and advance/eliminate/collapse.
    ///
    /// Idempotent over the same event snapshot; self-reported claims
    /// never reach this path.
    pub async fn run_sweep(self: &Arc<Self>) -> Result<SweepOutcome, EngineError> {
        let (room_id, participants, level, started_at, generation) = {
            let state = self.state.lock().await;
            if state.phase != Phase::Challenge {
                return Err(EngineError::WrongPhase(Phase::Challenge));
            }
            let Some(started_at) = state.challenge_started_at else {
                return Err(EngineError::WrongPhase(Phase::Challenge));
            };
            (
                state.room_id.clone(),
                state.participants.clone(),
                state.current_level,
                started_at,
                self.generation.load(Ordering::SeqCst),
            )
        };

        // Snapshot fetch happens outside the state lock.
        let events = self
            .source
            .fetch_events(EventFilter {
                kinds: vec![KIND_WORKOUT],
                authors: Some(participants.clone()),
                since: Some(window_start_seconds(started_at)),
                limit: None,
            })
            .await?;

        let mut verified: Vec<String> = Vec::new();
        let mut latest_facts = std::collections::HashMap::new();
        let mut last_seen: Vec<(String, i64)> = Vec::new();
        for participant in &participants {
            let scan = find_completions(&events, participant, level, started_at);
            if let Some(at) = latest_event_at(&events, participant) {
                last_seen.push((participant.clone(), at));
            }
            if scan.has_completed {
                verified.push(participant.clone());
                if let Some(facts) = scan.latest_completion.and_then(|c| c.facts) {
                    latest_facts.insert(participant.clone(), facts);
                }
            }
        }

        let outcome = {
            let mut state = self.state.lock().await;
            // A re-form may have superseded this room while we fetched.
            if self.generation.load(Ordering::SeqCst) != generation {
                tracing::debug!(room_id = %room_id, "Sweep superseded by newer room; dropping");
                return Err(EngineError::WrongPhase(Phase::Challenge));
            }
            for (participant, at) in last_seen {
                state.touch_activity(&participant, at);
            }
            state.apply_sweep(&verified)
        };
        let generation = self.bump_generation();

        tracing::info!(
            room_id = %room_id,
            level,
            verified = verified.len(),
            total = participants.len(),
            ?outcome,
            "Verification sweep complete"
        );

        // Optimistic result announcements; failures are non-fatal.
        let now = chrono::Utc::now().timestamp();
        for participant in &participants {
            let completed = verified.contains(participant);
            let draft = publisher::challenge_result_draft(
                &room_id,
                participant,
                level,
                completed,
                latest_facts.get(participant),
                now,
            );
            publisher::publish_optimistic(&self.publisher, draft).await;
        }

        match outcome {
            SweepOutcome::Advanced { .. } => {
                self.schedule(self.config.countdown, generation, TimerKind::Countdown);
            }
            SweepOutcome::LadderComplete { survivors } => {
                // Top of the ladder: hold the room, schedule nothing.
                tracing::info!(room_id = %room_id, survivors, "Ladder complete; room holds at level 10");
                self.cancel_timer();
            }
            SweepOutcome::Collapsed => {
                // This may be running on the timer task whose handle
                // still occupies the slot; cancelling and re-forming
                // inline would abort our own fetch. Hand the
                // re-formation to a fresh task.
                let engine = Arc::clone(self);
                tokio::spawn(async move {
                    engine.cancel_timer();
                    if let Err(e) = engine.form_room().await {
                        tracing::warn!(error = %e, "Re-formation after collapse failed; poller will retry");
                    }
                });
            }
        }

        Ok(outcome)
    }

    /// Manually remove a participant. If the room drops below
    /// [`MIN_ACTIVE_PARTICIPANTS`] it returns to Waiting and a fresh
    /// formation is attempted.
    pub async fn remove_participant(self: &Arc<Self>, participant: &str) -> Result<(), EngineError> {
        let can_continue = {
            let mut state = self.state.lock().await;
            state.eliminate(participant)
        };
        if !can_continue {
            tracing::info!(
                participant = %participant,
                min = MIN_ACTIVE_PARTICIPANTS,
                "Room too small to continue; re-forming"
            );
            self.bump_generation();
            self.cancel_timer();
            self.form_room().await?;
        }
        Ok(())
    }

    /// Background poller: while the room is Waiting, periodically retry
    /// formation. The returned handle must be aborted on shutdown.
    pub fn spawn_poller(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(engine.config.poll_interval).await;
                let waiting = engine.state.lock().await.phase == Phase::Waiting;
                if waiting {
                    if let Err(e) = engine.form_room().await {
                        tracing::warn!(error = %e, "Room formation attempt failed");
                    }
                }
            }
        })
    }

    /// Cancel any pending timer. Called on every transition and on
    /// teardown so no stale callback fires against a superseded room.
    pub fn cancel_timer(&self) {
        if let Some(handle) = self.timer.lock().expect("timer lock").take() {
            handle.abort();
        }
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn schedule(self: &Arc<Self>, delay: Duration, generation: u64, kind: TimerKind) {
        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if engine.generation.load(Ordering::SeqCst) != generation {
                return; // superseded while sleeping
            }
            let result = match kind {
                TimerKind::Countdown => engine.start_challenge().await,
                TimerKind::ChallengeTimeout => engine.run_sweep().await.map(|_| ()),
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, ?kind, "Timer-driven transition failed");
            }
        });

        let mut slot = self.timer.lock().expect("timer lock");
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for RoomEngine {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.lock().expect("timer lock").take() {
            handle.abort();
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TimerKind {
    Countdown,
    ChallengeTimeout,
}

/// Most recent in-window event timestamp for one author.
fn latest_event_at(events: &[RawEvent], author: &str) -> Option<i64> {
    events
        .iter()
        .filter(|e| e.author == author)
        .map(|e| e.created_at)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::source::{MemoryEventPublisher, MemoryEventSource};

    fn workout(author: &str, created_at: i64, distance_miles: &str) -> RawEvent {
        RawEvent {
            id: format!("{}-{}", author, created_at),
            kind: KIND_WORKOUT,
            content: String::new(),
            tags: vec![
                vec!["t".into(), "running".into()],
                vec!["distance".into(), distance_miles.into(), "mi".into()],
            ],
            created_at,
            author: author.into(),
        }
    }

    fn engine_with(
        events: Vec<RawEvent>,
        config: EngineConfig,
    ) -> (Arc<RoomEngine>, Arc<MemoryEventSource>) {
        let source = Arc::new(MemoryEventSource::new(events));
        let publisher = Arc::new(MemoryEventPublisher::default());
        let engine = Arc::new(RoomEngine::new(
            source.clone() as Arc<dyn EventSource>,
            publisher as Arc<dyn EventPublisher>,
            config,
        ));
        (engine, source)
    }

    fn pool_events(authors: &[&str]) -> Vec<RawEvent> {
        authors
            .iter()
            .enumerate()
            .map(|(i, a)| workout(a, 1_000 + i as i64, "0.1"))
            .collect()
    }

    #[tokio::test]
    async fn test_formation_samples_four_distinct_from_six() {
        let (engine, _) = engine_with(
            pool_events(&["a", "b", "c", "d", "e", "f"]),
            EngineConfig::default(),
        );

        assert!(engine.form_room().await.unwrap());
        let state = engine.snapshot().await;
        assert_eq!(state.phase, Phase::Formed);
        assert_eq!(state.participants.len(), 4);
        let unique: std::collections::HashSet<_> = state.participants.iter().collect();
        assert_eq!(unique.len(), 4);
        engine.cancel_timer();
    }

    #[tokio::test]
    async fn test_formation_degrades_with_small_pool() {
        let (engine, _) = engine_with(pool_events(&["a", "b"]), EngineConfig::default());

        assert!(engine.form_room().await.unwrap());
        let state = engine.snapshot().await;
        assert_eq!(state.phase, Phase::Formed);
        assert_eq!(state.participants.len(), 2);
        engine.cancel_timer();
    }

    #[tokio::test]
    async fn test_empty_pool_stays_waiting() {
        let (engine, _) = engine_with(vec![], EngineConfig::default());
        assert!(!engine.form_room().await.unwrap());
        assert_eq!(engine.snapshot().await.phase, Phase::Waiting);
    }

    #[tokio::test]
    async fn test_sweep_requires_challenge_phase() {
        let (engine, _) = engine_with(pool_events(&["a", "b", "c", "d"]), EngineConfig::default());
        engine.form_room().await.unwrap();
        engine.cancel_timer();

        let err = engine.run_sweep().await.unwrap_err();
        assert!(matches!(err, EngineError::WrongPhase(Phase::Challenge)));
    }
}
