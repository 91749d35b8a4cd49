// SPDX-License-Identifier: MIT

//! Shared builders for integration tests.

use challenge_rooms::models::event::{RawEvent, KIND_WORKOUT};

/// A kind-1301 workout event with the given tags.
#[allow(dead_code)]
pub fn workout_event(author: &str, created_at: i64, tags: Vec<Vec<String>>) -> RawEvent {
    RawEvent {
        id: format!("{}-{}", author, created_at),
        kind: KIND_WORKOUT,
        content: String::new(),
        tags,
        created_at,
        author: author.to_string(),
    }
}

/// A workout event carrying free-text content and no tags.
#[allow(dead_code)]
pub fn free_text_event(author: &str, created_at: i64, content: &str) -> RawEvent {
    RawEvent {
        content: content.to_string(),
        ..workout_event(author, created_at, vec![])
    }
}

#[allow(dead_code)]
pub fn tag(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Tags for a running workout with a distance in miles.
#[allow(dead_code)]
pub fn running_tags(distance_miles: &str) -> Vec<Vec<String>> {
    vec![
        tag(&["t", "running"]),
        tag(&["distance", distance_miles, "mi"]),
    ]
}

#[allow(dead_code)]
pub fn roster(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}
