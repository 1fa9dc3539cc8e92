use std::time::Duration;

use crate::modules::graph::{model::SyncConfig, wait::LongPollConfig};

pub struct Env {
    pub database_url: String,
    pub database_max_connections: u32,
    pub frontend_url: String,
    pub ip: String,
    pub port: u16,
    pub sync_buffer_ms: i64,
    pub long_poll_timeout_secs: u64,
    pub long_poll_fast_attempts: u32,
    pub long_poll_fast_interval_ms: u64,
    pub long_poll_slow_interval_ms: u64,
}

fn parse_or<T: std::str::FromStr>(key: &str, default: &str) -> T {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>()))
}

impl Env {
    fn new() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set in .env file or environment variable");
        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", "10");

        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let ip = std::env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("PORT", "8080");

        let sync_buffer_ms = parse_or("SYNC_BUFFER_MS", "2000");
        let long_poll_timeout_secs = parse_or("LONG_POLL_TIMEOUT_SECS", "20");
        let long_poll_fast_attempts = parse_or("LONG_POLL_FAST_ATTEMPTS", "5");
        let long_poll_fast_interval_ms = parse_or("LONG_POLL_FAST_INTERVAL_MS", "500");
        let long_poll_slow_interval_ms = parse_or("LONG_POLL_SLOW_INTERVAL_MS", "1000");

        Env {
            database_url,
            database_max_connections,
            frontend_url,
            ip,
            port,
            sync_buffer_ms,
            long_poll_timeout_secs,
            long_poll_fast_attempts,
            long_poll_fast_interval_ms,
            long_poll_slow_interval_ms,
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig { buffer_window: chrono::Duration::milliseconds(self.sync_buffer_ms) }
    }

    pub fn long_poll_config(&self) -> LongPollConfig {
        LongPollConfig {
            timeout: Duration::from_secs(self.long_poll_timeout_secs),
            fast_attempts: self.long_poll_fast_attempts,
            fast_interval: Duration::from_millis(self.long_poll_fast_interval_ms),
            slow_interval: Duration::from_millis(self.long_poll_slow_interval_ms),
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
