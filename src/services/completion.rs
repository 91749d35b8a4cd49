// SPDX-License-Identifier: MIT

//! Completion finder: did a given author satisfy a given level within
//! the challenge window?

use crate::models::event::{RawEvent, KIND_WORKOUT};
use crate::services::validator::{self, EventVerification};

/// Result of scanning one author's events for a level completion.
#[derive(Debug)]
pub struct CompletionScan {
    /// In-window kind-1301 events authored by the participant.
    pub total_events: usize,
    pub valid_completions: usize,
    pub has_completed: bool,
    /// Last valid completion by input order (callers pass events in
    /// chronological fetch order).
    pub latest_completion: Option<EventVerification>,
    pub all_results: Vec<EventVerification>,
}

/// Truncate a millisecond challenge start to whole seconds.
///
/// Events timestamped exactly at the start second are inside the
/// window (inclusive lower bound).
pub fn window_start_seconds(challenge_started_at_millis: i64) -> i64 {
    challenge_started_at_millis.div_euclid(1000)
}

/// Scan `events` for valid completions of `level` by `author` since the
/// challenge started. Pure; safe to re-run over the same snapshot.
pub fn find_completions(
    events: &[RawEvent],
    author: &str,
    level: u8,
    challenge_started_at_millis: i64,
) -> CompletionScan {
    let since = window_start_seconds(challenge_started_at_millis);

    let candidates: Vec<&RawEvent> = events
        .iter()
        .filter(|e| e.author == author && e.kind == KIND_WORKOUT && e.created_at >= since)
        .collect();

    let all_results: Vec<EventVerification> = candidates
        .iter()
        .map(|e| validator::verify_event(level, e))
        .collect();

    let valid_completions = all_results.iter().filter(|r| r.is_valid()).count();
    let latest_completion = all_results.iter().rev().find(|r| r.is_valid()).cloned();

    CompletionScan {
        total_events: candidates.len(),
        valid_completions,
        has_completed: valid_completions > 0,
        latest_completion,
        all_results,
    }
}
