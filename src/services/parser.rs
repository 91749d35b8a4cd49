// SPDX-License-Identifier: MIT

//! Workout event parser.
//!
//! Turns one kind-1301 event into a normalized [`WorkoutFacts`] record.
//! Two-stage pipeline: structured tags first, free-text content scan
//! second for whatever the tags left unfilled. Malformed data never
//! errors; the affected field degrades to `None`. The only hard error
//! is being handed an event of the wrong kind, which is caller misuse.

use crate::models::event::{RawEvent, KIND_WORKOUT};
use crate::models::workout::{ActivityType, WorkoutFacts};
use crate::units;
use once_cell::sync::Lazy;
use regex::Regex;

/// Parser errors. Everything except the wrong event kind degrades
/// silently instead of surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid workout event: expected kind {KIND_WORKOUT}, got {0}")]
    InvalidEventKind(u32),
}

/// Content keywords mapped to activity types, checked in order.
/// Substring match, case-insensitive (the content is lowercased first).
const ACTIVITY_KEYWORDS: &[(&str, ActivityType)] = &[
    ("run", ActivityType::Running),
    ("jog", ActivityType::Running),
    ("bike", ActivityType::Cycling),
    ("cycl", ActivityType::Cycling),
    ("walk", ActivityType::Walking),
    ("swim", ActivityType::Swimming),
    ("hik", ActivityType::Hiking),
    ("lift", ActivityType::Strength),
    ("weight", ActivityType::Strength),
];

static MILES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:miles?|mi)\b").unwrap());
static KM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:kilometers?|km)\b").unwrap());
static METERS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:meters?|m)\b").unwrap());
static CLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+:\d+(?::\d+)?)").unwrap());
static MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:minutes?|mins?|min)\b").unwrap());
static HOURS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:hours?|hrs?|hr)\b").unwrap());
static PUSHUPS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:(\d+)\s*push-?ups?|push-?ups?:?\s*(\d+))").unwrap()
});
static SITUPS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:(\d+)\s*(?:sit-?ups?|crunches?)|(?:sit-?ups?|crunches?):?\s*(\d+))")
        .unwrap()
});

/// Parse a kind-1301 workout event into structured facts.
///
/// Fails fast on a wrong event kind; every other malformed input
/// degrades the affected field to `None`.
pub fn parse_workout_event(event: &RawEvent) -> Result<WorkoutFacts, ParseError> {
    if event.kind != KIND_WORKOUT {
        return Err(ParseError::InvalidEventKind(event.kind));
    }

    let mut facts = WorkoutFacts {
        event_id: event.id.clone(),
        author: event.author.clone(),
        timestamp: event.created_at,
        raw_content: event.content.clone(),
        activity_type: extract_activity_type(event),
        distance_miles: extract_distance(event),
        duration_minutes: extract_duration(event),
        pushups: extract_pushups(event),
        situps: extract_situps(event),
        calories_kcal: parse_count(event.tag_value("calories")),
        heart_rate_bpm: event
            .tag_value("heart_rate")
            .or_else(|| event.tag_value("heartrate"))
            .and_then(|v| parse_count(Some(v))),
    };

    // Free-text fallback for whatever the tags left unfilled.
    if facts.activity_type.is_none()
        || facts.distance_miles.is_none()
        || facts.duration_minutes.is_none()
        || facts.pushups.is_none()
        || facts.situps.is_none()
    {
        let scanned = scan_content(&event.content);
        facts.activity_type = facts.activity_type.or(scanned.activity_type);
        facts.distance_miles = facts.distance_miles.or(scanned.distance_miles);
        facts.duration_minutes = facts.duration_minutes.or(scanned.duration_minutes);
        facts.pushups = facts.pushups.or(scanned.pushups);
        facts.situps = facts.situps.or(scanned.situps);
    }

    Ok(facts)
}

/// Metrics recovered from free text alone. Kept separate from the
/// tag-based path so both stages are independently testable.
#[derive(Debug, Default, PartialEq)]
pub struct ContentFacts {
    pub activity_type: Option<ActivityType>,
    pub distance_miles: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub pushups: Option<u32>,
    pub situps: Option<u32>,
}

/// Scan free-text content for workout metrics. Pure.
pub fn scan_content(content: &str) -> ContentFacts {
    let mut facts = ContentFacts::default();
    if content.is_empty() {
        return facts;
    }
    let lower = content.to_lowercase();

    facts.activity_type = ACTIVITY_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, activity)| *activity);

    // Distance: miles, then kilometers, then meters. First hit wins.
    facts.distance_miles = MILES_RE
        .captures(content)
        .and_then(|c| c[1].parse().ok())
        .and_then(|v| units::distance_to_miles(v, None))
        .or_else(|| {
            KM_RE
                .captures(content)
                .and_then(|c| c[1].parse().ok())
                .and_then(|v| units::distance_to_miles(v, Some("km")))
        })
        .or_else(|| {
            METERS_RE
                .captures(content)
                .and_then(|c| c[1].parse().ok())
                .and_then(|v| units::distance_to_miles(v, Some("m")))
        });

    // Duration: clock form first, then "N minutes", then "N hours".
    facts.duration_minutes = CLOCK_RE
        .captures(content)
        .and_then(|c| units::parse_duration_minutes(&c[1]))
        .or_else(|| {
            MINUTES_RE
                .captures(content)
                .and_then(|c| c[1].parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
        })
        .or_else(|| {
            HOURS_RE
                .captures(content)
                .and_then(|c| c[1].parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|hours| hours * 60.0)
        });

    facts.pushups = capture_count(&PUSHUPS_RE, content);
    facts.situps = capture_count(&SITUPS_RE, content);

    facts
}

fn capture_count(re: &Regex, content: &str) -> Option<u32> {
    re.captures(content).and_then(|c| {
        c.get(1)
            .or_else(|| c.get(2))
            .and_then(|m| m.as_str().parse().ok())
    })
}

fn extract_activity_type(event: &RawEvent) -> Option<ActivityType> {
    if let Some(declared) = event
        .tag_value("activity_type")
        .or_else(|| event.tag_value("t"))
        .and_then(ActivityType::from_tag)
    {
        return Some(declared);
    }

    // Structured exercise identifier: colon-delimited triplet whose
    // third segment embeds an activity keyword, e.g.
    // "33401:pubkey:uuid-running".
    let exercise = event.tag_value("exercise")?;
    let identifier = exercise.split(':').nth(2)?.to_lowercase();
    ACTIVITY_KEYWORDS
        .iter()
        .find(|(keyword, _)| identifier.contains(keyword))
        .map(|(_, activity)| *activity)
}

fn extract_distance(event: &RawEvent) -> Option<f64> {
    let (value, unit) = event.tag_value_with_unit("distance")?;
    units::distance_to_miles(value.trim().parse().ok()?, unit)
}

fn extract_duration(event: &RawEvent) -> Option<f64> {
    let (value, unit) = event.tag_value_with_unit("duration")?;
    units::duration_to_minutes(value, unit)
}

fn extract_pushups(event: &RawEvent) -> Option<u32> {
    if let Some(count) = event
        .tag_value("pushups")
        .or_else(|| event.tag_value("push-ups"))
        .and_then(|v| parse_count(Some(v)))
    {
        return Some(count);
    }

    // A bare "reps" tag only counts as pushups when the content says so.
    let lower = event.content.to_lowercase();
    if lower.contains("pushup") || lower.contains("push-up") {
        return parse_count(event.tag_value("reps"));
    }
    None
}

fn extract_situps(event: &RawEvent) -> Option<u32> {
    event
        .tag_value("situps")
        .or_else(|| event.tag_value("sit-ups"))
        .or_else(|| event.tag_value("crunches"))
        .and_then(|v| parse_count(Some(v)))
}

fn parse_count(value: Option<&str>) -> Option<u32> {
    value.and_then(|v| v.trim().parse().ok())
}
