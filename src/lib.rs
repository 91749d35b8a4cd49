// SPDX-License-Identifier: MIT

//! Challenge Rooms: fitness challenges on a social event network.
//!
//! Participants are grouped into rooms, assigned escalating fitness
//! challenges, and must prove completion by publishing kind-1301
//! workout events within a 24-hour window. This crate parses those
//! events, verifies them against the level catalog, and drives the
//! room progression state machine.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod units;

use config::Config;
use services::cache::EventCache;
use services::source::EventSource;
use services::RoomEngine;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub engine: Arc<RoomEngine>,
    pub source: Arc<dyn EventSource>,
    pub feed_cache: Arc<dyn EventCache>,
}
