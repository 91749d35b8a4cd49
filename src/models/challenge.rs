// SPDX-License-Identifier: MIT

//! Static challenge catalog: ten levels of escalating difficulty.

use crate::models::workout::ActivityType;
use serde::Serialize;

/// Tolerance applied to exact-distance constraints, in miles.
pub const EXACT_DISTANCE_TOLERANCE_MILES: f64 = 0.1;

/// Every challenge window is 24 hours.
pub const TIME_LIMIT_HOURS: u32 = 24;

/// One challenge level definition. Immutable at runtime.
///
/// A level may combine several constraint kinds; level 10 combines
/// reps, distance and duration.
#[derive(Debug, Clone, Serialize)]
pub struct ChallengeDefinition {
    pub level: u8,
    pub title: &'static str,
    pub description: &'static str,
    pub difficulty: &'static str,
    pub requirements: &'static [&'static str],
    pub min_distance_miles: Option<f64>,
    /// Satisfied within [`EXACT_DISTANCE_TOLERANCE_MILES`].
    pub exact_distance_miles: Option<f64>,
    /// Inclusive upper bound, minutes.
    pub max_duration_minutes: Option<f64>,
    pub min_pushups: Option<u32>,
    pub min_situps: Option<u32>,
    pub required_activity: Option<ActivityType>,
    pub accepted_activities: Option<&'static [ActivityType]>,
    pub time_limit_hours: u32,
}

const ENDURANCE_ACTIVITIES: &[ActivityType] = &[
    ActivityType::Walking,
    ActivityType::Running,
    ActivityType::Cycling,
];

/// Base definition with no constraints; each catalog entry overrides
/// the fields it needs via struct update syntax.
const UNCONSTRAINED: ChallengeDefinition = ChallengeDefinition {
    level: 0,
    title: "",
    description: "",
    difficulty: "",
    requirements: &[],
    min_distance_miles: None,
    exact_distance_miles: None,
    max_duration_minutes: None,
    min_pushups: None,
    min_situps: None,
    required_activity: None,
    accepted_activities: None,
    time_limit_hours: TIME_LIMIT_HOURS,
};

macro_rules! level {
    ($level:expr, $title:expr, $description:expr, $difficulty:expr,
     $requirements:expr, { $($field:ident : $value:expr),* $(,)? }) => {
        ChallengeDefinition {
            level: $level,
            title: $title,
            description: $description,
            difficulty: $difficulty,
            requirements: $requirements,
            $($field: $value,)*
            ..UNCONSTRAINED
        }
    };
}

/// The full catalog, indexed by `level - 1`.
pub static CHALLENGE_LEVELS: [ChallengeDefinition; 10] = [
    level!(1, "Endurance Foundation", "Walk, run, or cycle 1 mile", "Beginner",
        &["Complete 1 mile distance", "Choose: walking, running, or cycling", "Any pace acceptable"],
        { min_distance_miles: Some(1.0), accepted_activities: Some(ENDURANCE_ACTIVITIES) }),
    level!(2, "Distance Builder", "Walk, run, or cycle 2 miles", "Beginner+",
        &["Complete 2 miles distance", "Choose: walking, running, or cycling", "Any pace acceptable"],
        { min_distance_miles: Some(2.0), accepted_activities: Some(ENDURANCE_ACTIVITIES) }),
    level!(3, "Strength & Cardio", "Walk, run, or cycle 1 mile AND do 100 pushups", "Intermediate",
        &["Complete 1 mile distance (walk/run/cycle)", "Complete 100 pushups", "Both within 24 hours"],
        { min_distance_miles: Some(1.0), min_pushups: Some(100),
          accepted_activities: Some(ENDURANCE_ACTIVITIES) }),
    level!(4, "Speed Challenge I", "Run a 5K in under 40 minutes", "Intermediate",
        &["Complete 5K (3.1 miles) running distance", "Finish in under 40:00", "Running only"],
        { exact_distance_miles: Some(3.1), max_duration_minutes: Some(40.0),
          required_activity: Some(ActivityType::Running) }),
    level!(5, "Speed Challenge II", "Run a 5K in under 39 minutes", "Intermediate+",
        &["Complete 5K (3.1 miles) running distance", "Finish in under 39:00", "Running only"],
        { exact_distance_miles: Some(3.1), max_duration_minutes: Some(39.0),
          required_activity: Some(ActivityType::Running) }),
    level!(6, "Upper Body Power", "Do 150 pushups", "Advanced",
        &["Complete 150 pushups total", "Sets throughout the day are fine", "All reps within 24 hours"],
        { min_pushups: Some(150) }),
    level!(7, "Core Endurance", "100 sit-ups in one hour", "Advanced",
        &["Complete 100 sit-ups", "Within 1 hour", "Sets within the hour are fine"],
        { min_situps: Some(100), max_duration_minutes: Some(60.0) }),
    level!(8, "Long Distance", "Run a 10K", "Advanced",
        &["Complete 10K (6.2 miles) running distance", "Any finishing time", "Running only"],
        { exact_distance_miles: Some(6.2), required_activity: Some(ActivityType::Running) }),
    level!(9, "Elite Speed", "1 mile in under 8 minutes", "Elite",
        &["Complete 1 mile running distance", "Finish in under 8:00", "Running only"],
        { exact_distance_miles: Some(1.0), max_duration_minutes: Some(8.0),
          required_activity: Some(ActivityType::Running) }),
    level!(10, "Ultimate Challenge", "100 pushups, 100 sit-ups, and 10K run in under 80 minutes", "Extreme",
        &["Complete 100 pushups", "Complete 100 sit-ups", "Complete 10K (6.2 miles) run",
          "All exercises within 80 minutes total", "Order is your choice"],
        { min_pushups: Some(100), min_situps: Some(100), exact_distance_miles: Some(6.2),
          max_duration_minutes: Some(80.0), required_activity: Some(ActivityType::Running) }),
];

/// Look up a level definition; `None` for levels outside 1..=10.
pub fn challenge_level(level: u8) -> Option<&'static ChallengeDefinition> {
    if (1..=10).contains(&level) {
        Some(&CHALLENGE_LEVELS[level as usize - 1])
    } else {
        None
    }
}

/// The definition after `current`, or `None` at the top of the ladder.
pub fn next_level(current: u8) -> Option<&'static ChallengeDefinition> {
    challenge_level(current.saturating_add(1))
}

/// Pass/fail verdict for one (facts, level) pair. Never mutated after
/// creation; errors list every violated constraint, not just the first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationVerdict {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub level: u8,
}
