// SPDX-License-Identifier: MIT

//! Challenge validation: evaluates workout facts against a level's
//! rule set.
//!
//! Every applicable constraint is checked independently and all
//! violations are accumulated, so a consumer always sees the full
//! deficiency list. Error ordering follows constraint declaration
//! order for reproducible output.

use crate::models::challenge::{
    challenge_level, VerificationVerdict, EXACT_DISTANCE_TOLERANCE_MILES,
};
use crate::models::event::RawEvent;
use crate::models::workout::WorkoutFacts;
use crate::services::parser::{self, ParseError};

/// Validate parsed facts against one challenge level.
///
/// Deterministic and idempotent: identical inputs produce identical
/// verdicts. An unknown level yields a failed verdict, not an error,
/// so batch verification over mixed levels never aborts.
pub fn validate_completion(level: u8, facts: &WorkoutFacts) -> VerificationVerdict {
    let Some(challenge) = challenge_level(level) else {
        return VerificationVerdict {
            is_valid: false,
            errors: vec![format!("Unknown challenge level {}", level)],
            level,
        };
    };

    let mut errors = Vec::new();

    if let Some(min) = challenge.min_distance_miles {
        if !facts.distance_miles.is_some_and(|d| d >= min) {
            errors.push(format!("Distance must be at least {} miles", min));
        }
    }

    if let Some(exact) = challenge.exact_distance_miles {
        if !facts
            .distance_miles
            .is_some_and(|d| (d - exact).abs() <= EXACT_DISTANCE_TOLERANCE_MILES)
        {
            errors.push(format!("Distance must be approximately {} miles", exact));
        }
    }

    if let Some(max) = challenge.max_duration_minutes {
        if !facts.duration_minutes.is_some_and(|d| d <= max) {
            errors.push(format!("Must be completed in under {} minutes", max));
        }
    }

    if let Some(min) = challenge.min_pushups {
        if !facts.pushups.is_some_and(|p| p >= min) {
            errors.push(format!("Must complete at least {} pushups", min));
        }
    }

    if let Some(min) = challenge.min_situps {
        if !facts.situps.is_some_and(|s| s >= min) {
            errors.push(format!("Must complete at least {} sit-ups", min));
        }
    }

    if let Some(required) = challenge.required_activity {
        if facts.activity_type != Some(required) {
            errors.push(format!("Activity must be {}", required));
        }
    }

    if let Some(accepted) = challenge.accepted_activities {
        if !facts
            .activity_type
            .is_some_and(|a| accepted.contains(&a))
        {
            let names: Vec<&str> = accepted.iter().map(|a| a.as_str()).collect();
            errors.push(format!("Activity must be one of: {}", names.join(", ")));
        }
    }

    VerificationVerdict {
        is_valid: errors.is_empty(),
        errors,
        level,
    }
}

/// Result of verifying one raw event against one level.
///
/// `verdict` is present whenever the event parsed; `parse_error` is set
/// only for unparseable events (wrong kind).
#[derive(Debug, Clone)]
pub struct EventVerification {
    pub verdict: Option<VerificationVerdict>,
    pub facts: Option<WorkoutFacts>,
    pub parse_error: Option<String>,
}

impl EventVerification {
    /// Parsed and meeting every requirement.
    pub fn is_valid(&self) -> bool {
        self.verdict.as_ref().is_some_and(|v| v.is_valid)
    }

    /// Parsed at all, valid or not.
    pub fn is_parsed(&self) -> bool {
        self.facts.is_some()
    }
}

/// Parse and validate one raw event. Parse failures are captured in
/// the result rather than propagated, so batch scans keep going.
pub fn verify_event(level: u8, event: &RawEvent) -> EventVerification {
    match parser::parse_workout_event(event) {
        Ok(facts) => {
            let verdict = validate_completion(level, &facts);
            EventVerification {
                verdict: Some(verdict),
                facts: Some(facts),
                parse_error: None,
            }
        }
        Err(err @ ParseError::InvalidEventKind(_)) => EventVerification {
            verdict: None,
            facts: None,
            parse_error: Some(err.to_string()),
        },
    }
}
