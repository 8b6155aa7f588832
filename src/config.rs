//! Environment-driven configuration for the stream client and session.
//!
//! Defaults mirror the upstream feed's observed behavior (heartbeat pacing,
//! liveness threshold, handshake spacing, backoff curve). Every knob can be
//! overridden through the environment for operational tuning.

use std::env;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use url::Url;

use crate::error::StreamError;
use crate::models::market::DEFAULT_WINDOW_CAPACITY;
use crate::signals::ScoringPolicy;

/// Deployment environment name, used to pick the log format.
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Candidate feed endpoints, tried round-robin when an attempt fails.
pub const DEFAULT_ENDPOINTS: [&str; 7] = [
    "wss://ws2.qxbroker.com/socket.io/?EIO=3&transport=websocket",
    "wss://ws.qxbroker.com/socket.io/?EIO=3&transport=websocket",
    "wss://quotex.io/socket.io/?EIO=3&transport=websocket",
    "wss://ws3.qxbroker.com/socket.io/?EIO=3&transport=websocket",
    "wss://ws2.qxbroker.com/socket.io/?EIO=4&transport=websocket",
    "wss://ws.qxbroker.com/socket.io/?EIO=4&transport=websocket",
    "wss://qxbroker.com/socket.io/?EIO=3&transport=websocket",
];

/// Connection-level configuration owned by the stream client.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub endpoints: Vec<String>,
    pub connect_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub liveness_check_interval: Duration,
    pub liveness_timeout: Duration,
    pub handshake_settle: Duration,
    pub handshake_spacing: Duration,
    pub resubscribe_settle: Duration,
    pub resubscribe_spacing: Duration,
    pub subscribe_spacing: Duration,
    pub backoff_base: Duration,
    pub backoff_growth: f32,
    pub backoff_cap: Duration,
    pub max_reconnect_attempts: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            connect_timeout: Duration::from_secs(15),
            heartbeat_interval: Duration::from_secs(8),
            liveness_check_interval: Duration::from_secs(3),
            liveness_timeout: Duration::from_secs(20),
            handshake_settle: Duration::from_secs(1),
            handshake_spacing: Duration::from_millis(300),
            resubscribe_settle: Duration::from_millis(500),
            resubscribe_spacing: Duration::from_millis(100),
            subscribe_spacing: Duration::from_millis(150),
            backoff_base: Duration::from_secs(2),
            backoff_growth: 1.1,
            backoff_cap: Duration::from_secs(15),
            max_reconnect_attempts: 100,
        }
    }
}

impl StreamConfig {
    /// Build a config from the environment, falling back to the defaults.
    ///
    /// `STREAM_ENDPOINTS` takes a comma-separated endpoint list; the timing
    /// knobs are whole seconds.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = env::var("STREAM_ENDPOINTS") {
            let endpoints: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if !endpoints.is_empty() {
                config.endpoints = endpoints;
            }
        }
        config.connect_timeout = Duration::from_secs(env_u64("STREAM_CONNECT_TIMEOUT_SECS", 15));
        config.heartbeat_interval = Duration::from_secs(env_u64("STREAM_HEARTBEAT_SECS", 8));
        config.liveness_timeout = Duration::from_secs(env_u64("STREAM_LIVENESS_TIMEOUT_SECS", 20));
        config.max_reconnect_attempts =
            env_u64("STREAM_MAX_RECONNECT_ATTEMPTS", 100) as usize;
        config
    }

    /// Append a candidate endpoint unless it is already listed.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        if !self.endpoints.contains(&endpoint) {
            self.endpoints.push(endpoint);
        }
        self
    }

    /// Reject empty or unparseable endpoint lists before any dialing starts.
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.endpoints.is_empty() {
            return Err(StreamError::NoEndpoints);
        }
        for endpoint in &self.endpoints {
            Url::parse(endpoint).map_err(|e| StreamError::InvalidEndpoint {
                url: endpoint.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Reconnect delay sequence: base * growth^n capped, at most
    /// `max_reconnect_attempts` delays before the sequence runs dry.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBuilder::default()
            .with_min_delay(self.backoff_base)
            .with_factor(self.backoff_growth)
            .with_max_delay(self.backoff_cap)
            .with_max_times(self.max_reconnect_attempts)
            .build()
    }
}

/// Session-level configuration: evaluation cadence and scoring policy.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub signal_interval: Duration,
    pub window_capacity: usize,
    pub policy: ScoringPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            signal_interval: Duration::from_secs(60),
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            policy: ScoringPolicy::primary(),
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.signal_interval = Duration::from_secs(env_u64("SIGNAL_INTERVAL_SECS", 60));
        if let Ok(name) = env::var("SIGNAL_POLICY") {
            if name.trim().eq_ignore_ascii_case("lightweight") {
                config.policy = ScoringPolicy::lightweight();
            }
        }
        config
    }
}
