// SPDX-License-Identifier: MIT

//! Normalized workout facts derived from a kind-1301 event.

use serde::{Deserialize, Serialize};

/// Known activity vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Running,
    Walking,
    Cycling,
    Swimming,
    Hiking,
    Strength,
    Unknown,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Running => "running",
            ActivityType::Walking => "walking",
            ActivityType::Cycling => "cycling",
            ActivityType::Swimming => "swimming",
            ActivityType::Hiking => "hiking",
            ActivityType::Strength => "strength",
            ActivityType::Unknown => "unknown",
        }
    }

    /// Parse a declared activity name (from an `activity_type` or `t` tag).
    pub fn from_tag(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "running" | "run" => Some(ActivityType::Running),
            "walking" | "walk" => Some(ActivityType::Walking),
            "cycling" | "biking" | "bike" => Some(ActivityType::Cycling),
            "swimming" | "swim" => Some(ActivityType::Swimming),
            "hiking" | "hike" => Some(ActivityType::Hiking),
            "strength" | "weightlifting" | "weights" => Some(ActivityType::Strength),
            "" => None,
            _ => Some(ActivityType::Unknown),
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured facts extracted from one workout event.
///
/// Derived and ephemeral: recomputed per event, never persisted.
/// Every numeric field is either `None` or finite and non-negative;
/// distance and duration are normalized to miles and minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutFacts {
    pub event_id: String,
    pub author: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub raw_content: String,
    pub activity_type: Option<ActivityType>,
    pub distance_miles: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub pushups: Option<u32>,
    pub situps: Option<u32>,
    pub calories_kcal: Option<u32>,
    pub heart_rate_bpm: Option<u32>,
}

impl WorkoutFacts {
    /// One-line human summary for feed display, e.g.
    /// `"running, 3.1 miles, 28:30, 50 pushups"`. Absent fields are omitted.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(activity) = self.activity_type {
            parts.push(activity.to_string());
        }
        if let Some(distance) = self.distance_miles {
            parts.push(format!("{:.1} miles", distance));
        }
        if let Some(duration) = self.duration_minutes {
            parts.push(crate::units::format_minutes(duration));
        }
        if let Some(pushups) = self.pushups {
            parts.push(format!("{} pushups", pushups));
        }
        if let Some(situps) = self.situps {
            parts.push(format!("{} situps", situps));
        }

        if parts.is_empty() {
            "Workout completed".to_string()
        } else {
            parts.join(", ")
        }
    }
}
