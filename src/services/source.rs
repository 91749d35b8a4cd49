// SPDX-License-Identifier: MIT

//! External collaborator interfaces: event source and publisher.
//!
//! The core never talks to the relay network directly. Fetching and
//! publishing go through these traits; production wires the HTTP relay
//! bridge, tests wire the in-memory implementations.

use crate::models::event::{EventDraft, EventFilter, RawEvent};
use async_trait::async_trait;
use std::sync::Mutex;

/// Errors from the external event collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("event source request failed: {0}")]
    Request(String),

    #[error("event source returned malformed data: {0}")]
    Malformed(String),
}

/// Read side of the social event network.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch events matching `filter`, in chronological order.
    async fn fetch_events(&self, filter: EventFilter) -> Result<Vec<RawEvent>, SourceError>;
}

/// Outcome of an optimistic publish. Failures are surfaced here, never
/// raised: the state machine treats a failed publish as non-fatal.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub success: bool,
    pub event_id: Option<String>,
    pub error: Option<String>,
}

impl PublishOutcome {
    pub fn ok(event_id: String) -> Self {
        Self {
            success: true,
            event_id: Some(event_id),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            event_id: None,
            error: Some(error),
        }
    }
}

/// Write side of the social event network (signing and relay fan-out
/// happen on the other side of this boundary).
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, draft: EventDraft) -> PublishOutcome;
}

/// Event source backed by the HTTP relay bridge: POSTs the filter as
/// JSON, receives a JSON array of events.
pub struct HttpEventSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEventSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn fetch_events(&self, filter: EventFilter) -> Result<Vec<RawEvent>, SourceError> {
        let url = format!("{}/events/query", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&filter)
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| SourceError::Request(e.to_string()))?;

        response
            .json::<Vec<RawEvent>>()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

/// Publisher backed by the HTTP relay bridge.
pub struct HttpEventPublisher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEventPublisher {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[derive(serde::Deserialize)]
struct PublishResponse {
    event_id: String,
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn publish(&self, draft: EventDraft) -> PublishOutcome {
        let url = format!("{}/events/publish", self.base_url.trim_end_matches('/'));
        let response = self.client.post(&url).json(&draft).send().await;

        match response.and_then(|r| r.error_for_status()) {
            Ok(response) => match response.json::<PublishResponse>().await {
                Ok(body) => PublishOutcome::ok(body.event_id),
                Err(e) => PublishOutcome::failed(format!("malformed publish response: {}", e)),
            },
            Err(e) => PublishOutcome::failed(e.to_string()),
        }
    }
}

/// In-memory event source for tests and offline runs. Applies the same
/// filter semantics the bridge promises.
#[derive(Default)]
pub struct MemoryEventSource {
    events: Mutex<Vec<RawEvent>>,
}

impl MemoryEventSource {
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }

    pub fn push(&self, event: RawEvent) {
        self.events.lock().expect("source lock").push(event);
    }
}

#[async_trait]
impl EventSource for MemoryEventSource {
    async fn fetch_events(&self, filter: EventFilter) -> Result<Vec<RawEvent>, SourceError> {
        let events = self.events.lock().expect("source lock");
        let mut matched: Vec<RawEvent> = events
            .iter()
            .filter(|e| {
                (filter.kinds.is_empty() || filter.kinds.contains(&e.kind))
                    && filter
                        .authors
                        .as_ref()
                        .is_none_or(|authors| authors.contains(&e.author))
                    && filter.since.is_none_or(|since| e.created_at >= since)
            })
            .cloned()
            .collect();
        matched.sort_by_key(|e| e.created_at);
        if let Some(limit) = filter.limit {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }
}

/// Publisher that records drafts without sending them anywhere.
#[derive(Default)]
pub struct MemoryEventPublisher {
    pub drafts: Mutex<Vec<EventDraft>>,
    /// When set, every publish reports failure (for error-path tests).
    pub fail: bool,
}

impl MemoryEventPublisher {
    pub fn failing() -> Self {
        Self {
            drafts: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl EventPublisher for MemoryEventPublisher {
    async fn publish(&self, draft: EventDraft) -> PublishOutcome {
        self.drafts.lock().expect("publisher lock").push(draft);
        if self.fail {
            PublishOutcome::failed("publisher offline".to_string())
        } else {
            PublishOutcome::ok(format!("draft-{}", uuid::Uuid::new_v4()))
        }
    }
}
