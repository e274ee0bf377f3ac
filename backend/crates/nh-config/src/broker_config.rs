use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

/// Selects the single-node in-memory broker instead of Redis
pub const MEMORY_BROKER_URL: &str = "memory://";
pub const DEFAULT_BROKER_URL: &str = "redis://127.0.0.1:6379";

pub const MIN_SUBSCRIBE_TIMEOUT_MS: u64 = 100;
pub const MAX_SUBSCRIBE_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_SUBSCRIBE_TIMEOUT_MS: u64 = 5000;

pub const MIN_HEALTH_CHECK_INTERVAL_SECS: u64 = 1;
pub const MAX_HEALTH_CHECK_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 15;

/// Upstream pub/sub backend settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// `redis://...`, `rediss://...` or `memory://`
    pub url: String,
    /// How long a subscribe waits for a disconnected link to come back
    pub subscribe_timeout_ms: u64,
    /// Interval between upstream PINGs
    pub health_check_interval_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: String::from(DEFAULT_BROKER_URL),
            subscribe_timeout_ms: DEFAULT_SUBSCRIBE_TIMEOUT_MS,
            health_check_interval_secs: DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
        }
    }
}

impl BrokerConfig {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_BROKER_URL
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        let known_scheme = self.is_memory()
            || self.url.starts_with("redis://")
            || self.url.starts_with("rediss://")
            || self.url.starts_with("redis+unix://");

        if !known_scheme {
            return Err(ConfigError::invalid(
                "broker.url",
                format!(
                    "must start with redis://, rediss://, redis+unix:// or be {}",
                    MEMORY_BROKER_URL
                ),
            ));
        }

        if self.subscribe_timeout_ms < MIN_SUBSCRIBE_TIMEOUT_MS
            || self.subscribe_timeout_ms > MAX_SUBSCRIBE_TIMEOUT_MS
        {
            return Err(ConfigError::out_of_range(
                "broker.subscribe_timeout_ms",
                MIN_SUBSCRIBE_TIMEOUT_MS,
                MAX_SUBSCRIBE_TIMEOUT_MS,
                self.subscribe_timeout_ms,
            ));
        }

        if self.health_check_interval_secs < MIN_HEALTH_CHECK_INTERVAL_SECS
            || self.health_check_interval_secs > MAX_HEALTH_CHECK_INTERVAL_SECS
        {
            return Err(ConfigError::out_of_range(
                "broker.health_check_interval_secs",
                MIN_HEALTH_CHECK_INTERVAL_SECS,
                MAX_HEALTH_CHECK_INTERVAL_SECS,
                self.health_check_interval_secs,
            ));
        }

        Ok(())
    }
}
