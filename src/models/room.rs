// SPDX-License-Identifier: MIT

//! Room state: a fixed roster of participants progressing through
//! challenge levels together.
//!
//! Pure state transitions live here so they can be tested without
//! timers or an event source; the engine in `services::room` drives
//! them and owns scheduling.

use serde::Serialize;
use std::collections::HashMap;

/// Target roster size for a freshly formed room.
pub const ROOM_SIZE: usize = 4;
/// A room with fewer active participants than this cannot continue.
pub const MIN_ACTIVE_PARTICIPANTS: usize = 2;

const MIN_LEVEL: u8 = 1;
const MAX_LEVEL: u8 = 10;

/// Room lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    /// Selecting participants from the candidate pool.
    Waiting,
    /// Roster fixed, pre-challenge countdown running.
    Formed,
    /// 24-hour window open, evidence accumulating.
    Challenge,
}

/// Per-room lifecycle marker for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Active,
    Completed,
    Eliminated,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantState {
    pub status: ParticipantStatus,
    pub completed_levels: Vec<u8>,
    /// Unix seconds of the participant's most recent in-window event.
    pub last_activity_at: Option<i64>,
}

impl ParticipantState {
    fn active() -> Self {
        Self {
            status: ParticipantStatus::Active,
            completed_levels: Vec::new(),
            last_activity_at: None,
        }
    }
}

/// Outcome of a timeout verification sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// At least one participant verified; the roster shrank to the
    /// survivors and the level advanced.
    Advanced { survivors: usize, eliminated: usize },
    /// Everyone verified the final level; the room holds at level 10.
    LadderComplete { survivors: usize },
    /// Nobody verified; the room collapsed back to Waiting.
    Collapsed,
}

/// The unit of orchestration. Created on formation, mutated in place
/// across phase transitions, replaced wholesale when a new room forms.
#[derive(Debug, Clone, Serialize)]
pub struct RoomState {
    /// Opaque, unique per formation.
    pub room_id: String,
    pub participants: Vec<String>,
    /// Clamped to 1..=10.
    pub current_level: u8,
    pub phase: Phase,
    /// Unix milliseconds; set on Formed -> Challenge.
    pub challenge_started_at: Option<i64>,
    pub participant_status: HashMap<String, ParticipantState>,
}

impl RoomState {
    /// Empty room in the Waiting phase.
    pub fn waiting() -> Self {
        Self {
            room_id: String::new(),
            participants: Vec::new(),
            current_level: MIN_LEVEL,
            phase: Phase::Waiting,
            challenge_started_at: None,
            participant_status: HashMap::new(),
        }
    }

    /// Waiting -> Formed: fix the roster and reset every participant
    /// to active with no completed levels. The level carries over from
    /// the previous room only via `level`; callers pass 1 for a fresh
    /// ladder.
    pub fn form(&mut self, room_id: String, participants: Vec<String>, level: u8) {
        self.room_id = room_id;
        self.participant_status = participants
            .iter()
            .map(|p| (p.clone(), ParticipantState::active()))
            .collect();
        self.participants = participants;
        self.current_level = level.clamp(MIN_LEVEL, MAX_LEVEL);
        self.phase = Phase::Formed;
        self.challenge_started_at = None;
    }

    /// Formed -> Challenge: open the 24-hour window.
    pub fn start_challenge(&mut self, now_millis: i64) {
        debug_assert_eq!(self.phase, Phase::Formed);
        self.phase = Phase::Challenge;
        self.challenge_started_at = Some(now_millis);
    }

    /// Apply the authoritative verification sweep at challenge timeout.
    ///
    /// `verified` is the set of participants whose published evidence
    /// satisfied the current level. Self-reported claims never reach
    /// this method; only sweep results do.
    pub fn apply_sweep(&mut self, verified: &[String]) -> SweepOutcome {
        let level = self.current_level;
        let survivors: Vec<String> = self
            .participants
            .iter()
            .filter(|p| verified.contains(p))
            .cloned()
            .collect();
        let eliminated = self.participants.len() - survivors.len();

        if survivors.is_empty() {
            // Total collapse: everyone out, back to forming a new room.
            for state in self.participant_status.values_mut() {
                state.status = ParticipantStatus::Eliminated;
            }
            self.phase = Phase::Waiting;
            self.challenge_started_at = None;
            return SweepOutcome::Collapsed;
        }

        for participant in &self.participants {
            let Some(state) = self.participant_status.get_mut(participant) else {
                continue;
            };
            if survivors.contains(participant) {
                state.completed_levels.push(level);
            } else {
                state.status = ParticipantStatus::Eliminated;
            }
        }
        self.participants = survivors;
        self.challenge_started_at = None;

        if level >= MAX_LEVEL {
            // No level 11 exists. Survivors are marked completed and the
            // room holds at the top of the ladder (terminal until a
            // product decision defines what comes next).
            for participant in &self.participants {
                if let Some(state) = self.participant_status.get_mut(participant) {
                    state.status = ParticipantStatus::Completed;
                }
            }
            self.phase = Phase::Formed;
            return SweepOutcome::LadderComplete {
                survivors: self.participants.len(),
            };
        }

        self.current_level = (level + 1).clamp(MIN_LEVEL, MAX_LEVEL);
        self.phase = Phase::Formed;
        SweepOutcome::Advanced {
            survivors: self.participants.len(),
            eliminated,
        }
    }

    /// Mark one participant eliminated (manual removal). Returns `true`
    /// if the room can continue; `false` means the roster fell below
    /// [`MIN_ACTIVE_PARTICIPANTS`] and the room dropped back to Waiting.
    pub fn eliminate(&mut self, participant: &str) -> bool {
        if let Some(state) = self.participant_status.get_mut(participant) {
            state.status = ParticipantStatus::Eliminated;
        }
        self.participants.retain(|p| p != participant);

        if self.active_count() < MIN_ACTIVE_PARTICIPANTS {
            self.phase = Phase::Waiting;
            self.challenge_started_at = None;
            return false;
        }
        true
    }

    /// Participants currently marked active.
    pub fn active_count(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| {
                self.participant_status
                    .get(*p)
                    .is_some_and(|s| s.status == ParticipantStatus::Active)
            })
            .count()
    }

    /// Record that a participant published an in-window event.
    pub fn touch_activity(&mut self, participant: &str, at_unix_seconds: i64) {
        if let Some(state) = self.participant_status.get_mut(participant) {
            state.last_activity_at = Some(
                state
                    .last_activity_at
                    .map_or(at_unix_seconds, |prev| prev.max(at_unix_seconds)),
            );
        }
    }
}
