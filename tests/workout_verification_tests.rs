// SPDX-License-Identifier: MIT

//! End-to-end workout verification tests.
//!
//! These run the full parse -> validate pipeline over realistic events
//! the way the sweep and the feed do, covering both structured tags and
//! free-text content.

use challenge_rooms::models::workout::ActivityType;
use challenge_rooms::services::validator::verify_event;

mod common;

#[test]
fn test_tagged_5k_passes_speed_challenge() {
    let event = common::workout_event(
        "pk1",
        1_700_000_100,
        vec![
            common::tag(&["t", "running"]),
            common::tag(&["distance", "3.1", "mi"]),
            common::tag(&["duration", "00:28:30"]),
        ],
    );

    let result = verify_event(4, &event);
    assert!(result.is_valid(), "verdict: {:?}", result.verdict);

    let facts = result.facts.unwrap();
    assert_eq!(facts.activity_type, Some(ActivityType::Running));
    assert_eq!(facts.distance_miles, Some(3.1));
    assert_eq!(facts.duration_minutes, Some(28.5));
}

#[test]
fn test_free_text_event_passes_speed_challenge() {
    let event = common::free_text_event(
        "pk1",
        1_700_000_100,
        "Went for a run this morning, 3.1 miles in 28:30. Legs felt heavy!",
    );

    let result = verify_event(4, &event);
    assert!(result.is_valid(), "verdict: {:?}", result.verdict);
}

#[test]
fn test_metric_tags_convert_before_validation() {
    // 5 km is about 3.11 miles, inside the 0.1-mile tolerance of 3.1.
    let event = common::workout_event(
        "pk1",
        1_700_000_100,
        vec![
            common::tag(&["t", "running"]),
            common::tag(&["distance", "5", "km"]),
            common::tag(&["duration", "35", "min"]),
        ],
    );

    let result = verify_event(4, &event);
    assert!(result.is_valid(), "verdict: {:?}", result.verdict);
}

#[test]
fn test_wrong_kind_is_unparseable_not_invalid() {
    let mut event = common::workout_event("pk1", 1_700_000_100, common::running_tags("3.1"));
    event.kind = 1;

    let result = verify_event(4, &event);
    assert!(!result.is_valid());
    assert!(!result.is_parsed());
    assert!(result.parse_error.unwrap().contains("1301"));
}

#[test]
fn test_unqualifying_event_reports_every_deficiency() {
    // A strength session offered against the ultimate challenge: wrong
    // activity, no distance, no duration, not enough reps.
    let event = common::workout_event(
        "pk1",
        1_700_000_100,
        vec![
            common::tag(&["t", "strength"]),
            common::tag(&["pushups", "50"]),
        ],
    );

    let result = verify_event(10, &event);
    assert!(!result.is_valid());
    assert!(result.is_parsed());

    let verdict = result.verdict.unwrap();
    // exact distance, max duration, pushups, sit-ups, activity
    assert_eq!(verdict.errors.len(), 5);
}

#[test]
fn test_reps_only_event_passes_upper_body_level() {
    let event = common::free_text_event("pk1", 1_700_000_100, "Crushed 150 pushups before lunch");

    let result = verify_event(6, &event);
    assert!(result.is_valid(), "verdict: {:?}", result.verdict);
    assert_eq!(result.facts.unwrap().pushups, Some(150));
}

#[test]
fn test_verification_is_deterministic() {
    let event = common::workout_event("pk1", 1_700_000_100, common::running_tags("2.5"));

    let first = verify_event(4, &event);
    let second = verify_event(4, &event);
    assert_eq!(first.verdict, second.verdict);
}
