use crate::BackoffConfig;

use std::time::Duration;

const DEFAULT_SUBSCRIBE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 15;

/// Runtime settings shared by every broker link implementation.
#[derive(Debug, Clone)]
pub struct BrokerOptions {
    /// How long `subscribe` waits for a disconnected link to come back
    pub subscribe_timeout: Duration,
    /// Interval between upstream health checks
    pub health_check_interval: Duration,
    pub reconnect: BackoffConfig,
}

impl Default for BrokerOptions {
    fn default() -> Self {
        Self {
            subscribe_timeout: Duration::from_millis(DEFAULT_SUBSCRIBE_TIMEOUT_MS),
            health_check_interval: Duration::from_secs(DEFAULT_HEALTH_CHECK_INTERVAL_SECS),
            reconnect: BackoffConfig::default(),
        }
    }
}
