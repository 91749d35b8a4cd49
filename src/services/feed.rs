// SPDX-License-Identifier: MIT

//! Challenge feed aggregation for a whole room.
//!
//! Scans an event snapshot, attaches verification metadata to each
//! surviving event, derives per-participant completion status and
//! room-level summary counters. Pure and idempotent: re-running over
//! the same snapshot yields identical output.

use crate::models::event::{RawEvent, KIND_WORKOUT};
use crate::services::completion::window_start_seconds;
use crate::services::validator::{self, EventVerification};
use serde::Serialize;
use std::collections::HashMap;

/// Verification badge tier for one feed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    /// Parsed and meeting every level requirement.
    Verified,
    /// Parsed but not qualifying.
    Unverified,
    /// Unparseable event.
    Error,
}

impl BadgeTier {
    fn of(verification: &EventVerification) -> Self {
        if verification.is_valid() {
            BadgeTier::Verified
        } else if verification.is_parsed() {
            BadgeTier::Unverified
        } else {
            BadgeTier::Error
        }
    }

    /// Verified entries sort ahead of everything else.
    fn sort_priority(self) -> u8 {
        match self {
            BadgeTier::Verified => 1,
            BadgeTier::Unverified | BadgeTier::Error => 2,
        }
    }
}

/// One event in the aggregated feed, with verification metadata.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub event: RawEvent,
    pub verification: EventVerification,
    pub is_valid: bool,
    /// One-line human summary for display.
    pub workout_summary: String,
    pub badge: BadgeTier,
    pub sort_priority: u8,
    /// Seconds between challenge start and the event.
    pub seconds_since_start: i64,
}

/// Completion status for one participant, derived from the feed.
#[derive(Debug)]
pub struct ParticipantFeed {
    pub has_completed: bool,
    pub event_count: usize,
    /// The participant's top-sorted entry: latest qualifying event, or
    /// their most recent event when none qualify.
    pub latest_entry: Option<FeedEntry>,
}

/// Room-wide counters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeedSummary {
    pub total_events: usize,
    pub valid_events: usize,
    pub completed_participants: usize,
    pub total_participants: usize,
}

/// The aggregated challenge feed for one room and level.
#[derive(Debug)]
pub struct ChallengeFeed {
    /// Sorted: verified first, then newest first within each tier.
    pub entries: Vec<FeedEntry>,
    pub participants: HashMap<String, ParticipantFeed>,
    pub summary: FeedSummary,
}

/// Aggregate a room's challenge feed from an event snapshot.
///
/// Filter conditions are AND-ed: participant author, in-window
/// (second-truncated start, inclusive), kind 1301, and, whenever
/// `room_id` is given, a matching room-correlation tag. Events
/// lacking the tag are excluded so concurrent rooms sharing the
/// network stay isolated.
pub fn challenge_feed(
    events: &[RawEvent],
    participant_ids: &[String],
    level: u8,
    challenge_started_at_millis: i64,
    room_id: Option<&str>,
) -> ChallengeFeed {
    let since = window_start_seconds(challenge_started_at_millis);

    let mut entries: Vec<FeedEntry> = events
        .iter()
        .filter(|e| {
            participant_ids.contains(&e.author)
                && e.created_at >= since
                && e.kind == KIND_WORKOUT
                && room_id.is_none_or(|room| e.has_room_tag(room))
        })
        .map(|event| {
            let verification = validator::verify_event(level, event);
            let badge = BadgeTier::of(&verification);
            let workout_summary = verification
                .facts
                .as_ref()
                .map_or_else(|| "Workout completed".to_string(), |f| f.summary());
            FeedEntry {
                is_valid: verification.is_valid(),
                workout_summary,
                badge,
                sort_priority: badge.sort_priority(),
                seconds_since_start: event.created_at - since,
                event: event.clone(),
                verification,
            }
        })
        .collect();

    // Verified first, newest first within each tier.
    entries.sort_by(|a, b| {
        a.sort_priority
            .cmp(&b.sort_priority)
            .then(b.event.created_at.cmp(&a.event.created_at))
    });

    let mut participants = HashMap::new();
    for participant in participant_ids {
        let own: Vec<&FeedEntry> = entries
            .iter()
            .filter(|e| &e.event.author == participant)
            .collect();
        participants.insert(
            participant.clone(),
            ParticipantFeed {
                has_completed: own.iter().any(|e| e.is_valid),
                event_count: own.len(),
                latest_entry: own.first().map(|e| (*e).clone()),
            },
        );
    }

    let summary = FeedSummary {
        total_events: entries.len(),
        valid_events: entries.iter().filter(|e| e.is_valid).count(),
        completed_participants: participants.values().filter(|p| p.has_completed).count(),
        total_participants: participant_ids.len(),
    };

    ChallengeFeed {
        entries,
        participants,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workout(author: &str, created_at: i64, mut tags: Vec<Vec<String>>, room: Option<&str>) -> RawEvent {
        if let Some(room) = room {
            tags.push(vec!["challenge_id".into(), room.into()]);
        }
        RawEvent {
            id: format!("{}-{}", author, created_at),
            kind: KIND_WORKOUT,
            content: String::new(),
            tags,
            created_at,
            author: author.into(),
        }
    }

    fn qualifying_tags() -> Vec<Vec<String>> {
        vec![
            vec!["t".into(), "running".into()],
            vec!["distance".into(), "1.5".into(), "mi".into()],
        ]
    }

    fn roster(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    const START: i64 = 1_700_000_000_000;

    #[test]
    fn test_room_filter_excludes_untagged_events() {
        let events = vec![
            workout("pk1", 1_700_000_100, qualifying_tags(), Some("room-a")),
            // In-window, by a participant, but missing the room tag.
            workout("pk2", 1_700_000_100, qualifying_tags(), None),
            // Tagged for a different room.
            workout("pk3", 1_700_000_100, qualifying_tags(), Some("room-b")),
        ];
        let feed = challenge_feed(
            &events,
            &roster(&["pk1", "pk2", "pk3", "pk4"]),
            1,
            START,
            Some("room-a"),
        );

        assert_eq!(feed.summary.total_events, 1);
        assert_eq!(feed.entries[0].event.author, "pk1");
        assert!(!feed.participants["pk2"].has_completed);
    }

    #[test]
    fn test_no_room_filter_admits_untagged_events() {
        let events = vec![workout("pk1", 1_700_000_100, qualifying_tags(), None)];
        let feed = challenge_feed(&events, &roster(&["pk1"]), 1, START, None);
        assert_eq!(feed.summary.total_events, 1);
    }

    #[test]
    fn test_sort_verified_first_then_newest() {
        let events = vec![
            workout("pk1", 1_700_000_300, vec![], None), // unqualifying, newest
            workout("pk1", 1_700_000_100, qualifying_tags(), None),
            workout("pk2", 1_700_000_200, qualifying_tags(), None),
        ];
        let feed = challenge_feed(&events, &roster(&["pk1", "pk2"]), 1, START, None);

        let order: Vec<(i64, BadgeTier)> = feed
            .entries
            .iter()
            .map(|e| (e.event.created_at, e.badge))
            .collect();
        assert_eq!(
            order,
            vec![
                (1_700_000_200, BadgeTier::Verified),
                (1_700_000_100, BadgeTier::Verified),
                (1_700_000_300, BadgeTier::Unverified),
            ]
        );
    }

    #[test]
    fn test_participant_status_and_summary() {
        let events = vec![
            workout("pk1", 1_700_000_100, qualifying_tags(), None),
            workout("pk1", 1_700_000_200, vec![], None),
            workout("pk2", 1_700_000_150, vec![], None),
        ];
        let feed = challenge_feed(&events, &roster(&["pk1", "pk2", "pk3"]), 1, START, None);

        assert!(feed.participants["pk1"].has_completed);
        assert_eq!(feed.participants["pk1"].event_count, 2);
        // Top-sorted entry for pk1 is the qualifying one, not the newest.
        assert!(feed.participants["pk1"].latest_entry.as_ref().unwrap().is_valid);

        assert!(!feed.participants["pk2"].has_completed);
        assert_eq!(feed.participants["pk3"].event_count, 0);

        assert_eq!(feed.summary.total_events, 3);
        assert_eq!(feed.summary.valid_events, 1);
        assert_eq!(feed.summary.completed_participants, 1);
        assert_eq!(feed.summary.total_participants, 3);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let events = vec![
            workout("pk1", 1_700_000_100, qualifying_tags(), None),
            workout("pk2", 1_700_000_200, vec![], None),
        ];
        let ids = roster(&["pk1", "pk2"]);
        let first = challenge_feed(&events, &ids, 1, START, None);
        let second = challenge_feed(&events, &ids, 1, START, None);

        assert_eq!(first.summary.total_events, second.summary.total_events);
        assert_eq!(first.summary.valid_events, second.summary.valid_events);
        let first_ids: Vec<&str> = first.entries.iter().map(|e| e.event.id.as_str()).collect();
        let second_ids: Vec<&str> = second.entries.iter().map(|e| e.event.id.as_str()).collect();
        assert_eq!(first_ids, second_ids);
    }
}
