// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod cache;
pub mod completion;
pub mod feed;
pub mod parser;
pub mod publisher;
pub mod room;
pub mod source;
pub mod validator;

pub use cache::{EventCache, NoopEventCache, TtlEventCache};
pub use completion::{find_completions, CompletionScan};
pub use feed::{challenge_feed, ChallengeFeed};
pub use parser::{parse_workout_event, ParseError};
pub use room::{EngineConfig, RoomEngine};
pub use source::{EventPublisher, EventSource, HttpEventPublisher, HttpEventSource};
pub use validator::{validate_completion, verify_event, EventVerification};
