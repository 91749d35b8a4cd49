//! Application configuration loaded from environment variables.
//!
//! Every tunable has a sensible default so local development needs no
//! .env at all; only the relay bridge URL is required for a real run.

use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the HTTP relay bridge (event source + publisher).
    pub relay_bridge_url: String,
    /// Frontend URL allowed by CORS.
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Target roster size for a room.
    pub room_size: usize,
    /// How many recent workout events feed the candidate pool.
    pub pool_fetch_limit: u32,
    /// Pre-challenge preparation countdown, seconds.
    pub countdown_secs: u64,
    /// Challenge window length, seconds.
    pub challenge_window_secs: u64,
    /// Formation retry interval while the room is Waiting, seconds.
    pub poll_interval_secs: u64,
    /// TTL for cached event snapshots, seconds.
    pub feed_cache_ttl_secs: u64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            relay_bridge_url: "http://localhost:7000".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            room_size: 4,
            pool_fetch_limit: 100,
            countdown_secs: 120,
            challenge_window_secs: 24 * 60 * 60,
            poll_interval_secs: 60,
            feed_cache_ttl_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();
        Ok(Self {
            relay_bridge_url: env::var("RELAY_BRIDGE_URL")
                .map_err(|_| ConfigError::Missing("RELAY_BRIDGE_URL"))?,
            frontend_url: env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            port: parse_env("PORT", defaults.port),
            room_size: parse_env("ROOM_SIZE", defaults.room_size),
            pool_fetch_limit: parse_env("POOL_FETCH_LIMIT", defaults.pool_fetch_limit),
            countdown_secs: parse_env("COUNTDOWN_SECS", defaults.countdown_secs),
            challenge_window_secs: parse_env(
                "CHALLENGE_WINDOW_SECS",
                defaults.challenge_window_secs,
            ),
            poll_interval_secs: parse_env("POLL_INTERVAL_SECS", defaults.poll_interval_secs),
            feed_cache_ttl_secs: parse_env("FEED_CACHE_TTL_SECS", defaults.feed_cache_ttl_secs),
        })
    }

    /// Engine tunables derived from this config.
    pub fn engine_config(&self) -> crate::services::room::EngineConfig {
        crate::services::room::EngineConfig {
            room_size: self.room_size,
            pool_fetch_limit: self.pool_fetch_limit,
            countdown: Duration::from_secs(self.countdown_secs),
            challenge_window: Duration::from_secs(self.challenge_window_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
