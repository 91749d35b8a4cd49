// SPDX-License-Identifier: MIT

//! Optimistic announcement drafts.
//!
//! Room formations and per-participant results are announced as plain
//! notes on the network. These posts are informational only: the
//! authoritative room state comes from the verification sweep, never
//! from a self-reported claim, and a failed publish is non-fatal.

use crate::models::challenge::challenge_level;
use crate::models::event::{EventDraft, KIND_NOTE};
use crate::models::workout::WorkoutFacts;
use crate::services::source::{EventPublisher, PublishOutcome};
use std::sync::Arc;

/// Generate a fresh opaque room identifier.
pub fn generate_room_id() -> String {
    format!("room-{}", uuid::Uuid::new_v4())
}

/// Build the announcement draft for a newly formed room.
pub fn room_formation_draft(
    room_id: &str,
    participants: &[String],
    level: u8,
    now_unix: i64,
) -> EventDraft {
    let title = challenge_level(level).map_or("", |c| c.title);
    let roster = participants
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {}", i + 1, shorten(p)))
        .collect::<Vec<_>>()
        .join("\n");
    let content = format!(
        "Challenge room formed at level {} ({}). {} participants selected:\n{}\n\
         The window opens shortly; participants have 24 hours to complete the level.",
        level,
        title,
        participants.len(),
        roster
    );

    let mut tags = vec![
        vec!["t".to_string(), "ChallengeRoom".to_string()],
        vec!["room_id".to_string(), room_id.to_string()],
        vec!["challenge_level".to_string(), level.to_string()],
        vec![
            "participant_count".to_string(),
            participants.len().to_string(),
        ],
    ];
    for participant in participants {
        tags.push(vec!["p".to_string(), participant.clone()]);
    }

    EventDraft {
        kind: KIND_NOTE,
        content,
        tags,
        created_at: now_unix,
    }
}

/// Build the result draft for one participant after a sweep.
pub fn challenge_result_draft(
    room_id: &str,
    participant: &str,
    level: u8,
    completed: bool,
    facts: Option<&WorkoutFacts>,
    now_unix: i64,
) -> EventDraft {
    let content = if completed {
        let detail = facts
            .map(|f| format!("\nVerified workout: {}", f.summary()))
            .unwrap_or_default();
        format!(
            "Challenge level {} completed by {}.{}",
            level,
            shorten(participant),
            detail
        )
    } else {
        format!(
            "Challenge level {} not completed in time by {}. Eliminated from the room.",
            level,
            shorten(participant)
        )
    };

    EventDraft {
        kind: KIND_NOTE,
        content,
        tags: vec![
            vec!["t".to_string(), "ChallengeResult".to_string()],
            vec!["p".to_string(), participant.to_string()],
            vec!["room_id".to_string(), room_id.to_string()],
            vec!["challenge_level".to_string(), level.to_string()],
            vec![
                "challenge_result".to_string(),
                if completed { "completed" } else { "eliminated" }.to_string(),
            ],
        ],
        created_at: now_unix,
    }
}

/// Publish a draft, logging but never propagating failure.
pub async fn publish_optimistic(
    publisher: &Arc<dyn EventPublisher>,
    draft: EventDraft,
) -> PublishOutcome {
    let outcome = publisher.publish(draft).await;
    if let Some(error) = &outcome.error {
        tracing::warn!(error = %error, "Optimistic publish failed (non-fatal)");
    }
    outcome
}

/// Ellipsize an author id to its first 12 characters. Author ids come
/// from the outside; truncation must land on a char boundary.
fn shorten(pubkey: &str) -> String {
    match pubkey.char_indices().nth(12) {
        Some((boundary, _)) => format!("{}...", &pubkey[..boundary]),
        None => pubkey.to_string(),
    }
}
