// SPDX-License-Identifier: MIT

//! Challenge Rooms API Server
//!
//! Forms rooms of participants from the workout event stream, runs the
//! escalating challenge ladder, and serves the room and feed API.

use challenge_rooms::{
    config::Config,
    services::cache::TtlEventCache,
    services::source::{EventPublisher, EventSource, HttpEventPublisher, HttpEventSource},
    services::RoomEngine,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Challenge Rooms API");

    // Relay bridge client: event source and optimistic publisher
    let source: Arc<dyn EventSource> =
        Arc::new(HttpEventSource::new(config.relay_bridge_url.clone()));
    let publisher: Arc<dyn EventPublisher> =
        Arc::new(HttpEventPublisher::new(config.relay_bridge_url.clone()));
    tracing::info!(url = %config.relay_bridge_url, "Relay bridge client initialized");

    // Room engine: one room slot, timer-driven progression
    let engine = Arc::new(RoomEngine::new(
        source.clone(),
        publisher,
        config.engine_config(),
    ));
    match engine.form_room().await {
        Ok(true) => tracing::info!("Initial room formed"),
        Ok(false) => tracing::info!("Candidate pool empty; waiting for workout events"),
        Err(e) => tracing::warn!(error = %e, "Initial room formation failed; poller will retry"),
    }
    let _poller = engine.spawn_poller();

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        engine,
        source,
        feed_cache: Arc::new(TtlEventCache::default()),
    });

    // Build router
    let app = challenge_rooms::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("challenge_rooms=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
