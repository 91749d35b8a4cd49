// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod challenge;
pub mod event;
pub mod room;
pub mod workout;

pub use challenge::{ChallengeDefinition, VerificationVerdict};
pub use event::{EventDraft, EventFilter, RawEvent};
pub use room::{Phase, RoomState};
pub use workout::{ActivityType, WorkoutFacts};
