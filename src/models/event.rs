// SPDX-License-Identifier: MIT

//! Raw social-network event model and tag access helpers.
//!
//! Events arrive from the relay bridge as loosely-typed JSON authored by
//! many independent clients. The tag vocabulary read here
//! (`activity_type`/`t`, `exercise`, `distance`, `duration`, `pushups`,
//! `situps`, `calories`, `heart_rate`, `challenge_id`/`room_id`) is an
//! external contract and must be preserved exactly.

use serde::{Deserialize, Serialize};

/// Event kind for structured workout records.
pub const KIND_WORKOUT: u32 = 1301;
/// Event kind for plain notes (used for optimistic result announcements).
pub const KIND_NOTE: u32 = 1;

/// An event as received from the network layer. Immutable once received.
///
/// `author` is a bare public-key identifier: upstream clients sometimes
/// nest it inside an author object, but the relay bridge normalizes the
/// shape before events reach this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: String,
    pub kind: u32,
    pub content: String,
    /// Ordered list of ordered string lists, e.g. `["distance", "5", "km"]`.
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
    /// Unix seconds.
    pub created_at: i64,
    pub author: String,
}

impl RawEvent {
    /// First value of the named tag, or `None`.
    ///
    /// Tags with fewer than two elements are treated as absent.
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        tag_value(&self.tags, name)
    }

    /// First value of the named tag together with its unit suffix
    /// (the optional third tag element).
    pub fn tag_value_with_unit(&self, name: &str) -> Option<(&str, Option<&str>)> {
        tag_value_with_unit(&self.tags, name)
    }

    /// Whether the event carries a room-correlation tag matching `room_id`.
    ///
    /// Both `challenge_id` and `room_id` tag names are accepted; clients
    /// disagree on which one they write.
    pub fn has_room_tag(&self, room_id: &str) -> bool {
        self.tags.iter().any(|tag| {
            tag.len() >= 2
                && (tag[0] == "challenge_id" || tag[0] == "room_id")
                && tag[1] == room_id
        })
    }
}

/// First value of the named tag in a tag list, or `None`.
pub fn tag_value<'a>(tags: &'a [Vec<String>], name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|tag| tag.len() >= 2 && tag[0] == name)
        .map(|tag| tag[1].as_str())
}

/// Like [`tag_value`], but also returns the optional unit element.
pub fn tag_value_with_unit<'a>(
    tags: &'a [Vec<String>],
    name: &str,
) -> Option<(&'a str, Option<&'a str>)> {
    tags.iter()
        .find(|tag| tag.len() >= 2 && tag[0] == name)
        .map(|tag| (tag[1].as_str(), tag.get(2).map(|unit| unit.as_str())))
}

/// An unsigned event draft handed to the external publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub kind: u32,
    pub content: String,
    pub tags: Vec<Vec<String>>,
    /// Unix seconds.
    pub created_at: i64,
}

/// Query filter understood by the external event source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub kinds: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    /// Inclusive lower bound, unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}
