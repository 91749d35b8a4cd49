// SPDX-License-Identifier: MIT

//! Opportunistic TTL cache for fetched event snapshots.
//!
//! Used by the API layer to avoid hammering the relay bridge on every
//! feed request. The engine's correctness never depends on a hit; a
//! cache that always misses is valid.

use crate::models::event::RawEvent;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Cache of event snapshots keyed by an opaque string, with a per-key
/// expiry.
pub trait EventCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<RawEvent>>;
    fn put(&self, key: String, events: Vec<RawEvent>, ttl: Duration);
}

/// In-process TTL cache. Expired entries are dropped lazily on access.
#[derive(Default)]
pub struct TtlEventCache {
    entries: DashMap<String, (Instant, Vec<RawEvent>)>,
}

impl EventCache for TtlEventCache {
    fn get(&self, key: &str) -> Option<Vec<RawEvent>> {
        if let Some(entry) = self.entries.get(key) {
            let (expires, events) = entry.value();
            if Instant::now() < *expires {
                return Some(events.clone());
            }
        }
        self.entries.remove(key);
        None
    }

    fn put(&self, key: String, events: Vec<RawEvent>, ttl: Duration) {
        self.entries.insert(key, (Instant::now() + ttl, events));
    }
}

/// A cache that never hits.
pub struct NoopEventCache;

impl EventCache for NoopEventCache {
    fn get(&self, _key: &str) -> Option<Vec<RawEvent>> {
        None
    }

    fn put(&self, _key: String, _events: Vec<RawEvent>, _ttl: Duration) {}
}
