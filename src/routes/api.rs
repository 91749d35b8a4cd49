// SPDX-License-Identifier: MIT

//! Public API routes: room snapshot, challenge feed, level catalog.

use crate::error::{AppError, Result};
use crate::models::challenge::{challenge_level, next_level, ChallengeDefinition, CHALLENGE_LEVELS};
use crate::models::event::{EventFilter, KIND_WORKOUT};
use crate::models::room::{Phase, RoomState};
use crate::services::feed::{self, BadgeTier, FeedSummary};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/room", get(get_room))
        .route("/api/room/feed", get(get_room_feed))
        .route("/api/room/reform", post(reform_room))
        .route("/api/levels", get(get_levels))
        .route("/api/levels/{level}", get(get_level))
}

// ─── Room Snapshot ───────────────────────────────────────────

#[derive(Serialize)]
pub struct RoomResponse {
    #[serde(flatten)]
    pub room: RoomState,
    /// Catalog entry for the room's current level.
    pub challenge: Option<&'static ChallengeDefinition>,
    /// What survivors will face next; `None` at the top of the ladder.
    pub next_challenge: Option<&'static ChallengeDefinition>,
}

/// Current room state plus the active level's catalog entry.
async fn get_room(State(state): State<Arc<AppState>>) -> Json<RoomResponse> {
    let room = state.engine.snapshot().await;
    let challenge = challenge_level(room.current_level);
    let next_challenge = next_level(room.current_level);
    Json(RoomResponse {
        room,
        challenge,
        next_challenge,
    })
}

// ─── Challenge Feed ──────────────────────────────────────────

#[derive(Serialize)]
pub struct FeedEntryResponse {
    pub event_id: String,
    pub author: String,
    pub created_at: i64,
    pub is_valid: bool,
    pub badge: BadgeTier,
    pub workout_summary: String,
    /// Average pace, when distance and duration were both recovered.
    pub pace: Option<String>,
    pub seconds_since_start: i64,
    /// Requirement failures for parsed-but-unqualifying events.
    pub errors: Vec<String>,
}

#[derive(Serialize)]
pub struct ParticipantFeedResponse {
    pub has_completed: bool,
    pub event_count: usize,
}

#[derive(Serialize)]
pub struct FeedResponse {
    pub room_id: String,
    pub level: u8,
    pub entries: Vec<FeedEntryResponse>,
    pub participants: HashMap<String, ParticipantFeedResponse>,
    pub summary: FeedSummary,
}

/// Live aggregated feed for the active challenge.
///
/// Event snapshots are served from a short-lived cache so a burst of
/// feed requests does not hammer the relay bridge.
async fn get_room_feed(State(state): State<Arc<AppState>>) -> Result<Json<FeedResponse>> {
    let room = state.engine.snapshot().await;
    if room.phase != Phase::Challenge {
        return Err(AppError::BadRequest(
            "No active challenge window".to_string(),
        ));
    }
    let started_at = room
        .challenge_started_at
        .ok_or_else(|| AppError::BadRequest("No active challenge window".to_string()))?;

    let cache_key = format!("feed:{}:{}", room.room_id, room.current_level);
    let events = match state.feed_cache.get(&cache_key) {
        Some(cached) => cached,
        None => {
            let fetched = state
                .source
                .fetch_events(EventFilter {
                    kinds: vec![KIND_WORKOUT],
                    authors: Some(room.participants.clone()),
                    since: Some(crate::services::completion::window_start_seconds(started_at)),
                    limit: None,
                })
                .await?;
            state.feed_cache.put(
                cache_key,
                fetched.clone(),
                Duration::from_secs(state.config.feed_cache_ttl_secs),
            );
            fetched
        }
    };

    let feed = feed::challenge_feed(
        &events,
        &room.participants,
        room.current_level,
        started_at,
        Some(&room.room_id),
    );

    let entries = feed
        .entries
        .iter()
        .map(|entry| FeedEntryResponse {
            event_id: entry.event.id.clone(),
            author: entry.event.author.clone(),
            created_at: entry.event.created_at,
            is_valid: entry.is_valid,
            badge: entry.badge,
            workout_summary: entry.workout_summary.clone(),
            pace: entry.verification.facts.as_ref().and_then(|f| {
                crate::units::format_pace(f.distance_miles, f.duration_minutes)
            }),
            seconds_since_start: entry.seconds_since_start,
            errors: entry
                .verification
                .verdict
                .as_ref()
                .map(|v| v.errors.clone())
                .unwrap_or_default(),
        })
        .collect();

    let participants = feed
        .participants
        .iter()
        .map(|(id, p)| {
            (
                id.clone(),
                ParticipantFeedResponse {
                    has_completed: p.has_completed,
                    event_count: p.event_count,
                },
            )
        })
        .collect();

    Ok(Json(FeedResponse {
        room_id: room.room_id,
        level: room.current_level,
        entries,
        participants,
        summary: feed.summary,
    }))
}

// ─── Level Catalog ───────────────────────────────────────────

/// The full 10-level catalog.
async fn get_levels() -> Json<&'static [ChallengeDefinition]> {
    Json(&CHALLENGE_LEVELS)
}

/// One catalog entry by level number.
async fn get_level(Path(level): Path<u8>) -> Result<Json<&'static ChallengeDefinition>> {
    challenge_level(level)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No challenge at level {}", level)))
}

// ─── Operator Controls ───────────────────────────────────────

#[derive(Serialize)]
pub struct ReformResponse {
    pub formed: bool,
}

/// Discard the current room and attempt a fresh formation.
async fn reform_room(State(state): State<Arc<AppState>>) -> Result<Json<ReformResponse>> {
    state.engine.cancel_timer();
    let formed = state.engine.form_room().await?;
    Ok(Json(ReformResponse { formed }))
}
