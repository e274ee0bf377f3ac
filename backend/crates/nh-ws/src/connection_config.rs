use nh_config::{
    DEFAULT_HANDLER_TIMEOUT_SECS, DEFAULT_HEARTBEAT_INTERVAL_SECS, DEFAULT_HEARTBEAT_TIMEOUT_SECS,
    DEFAULT_MAX_FRAME_BYTES, DEFAULT_SEND_BUFFER_SIZE, WebSocketConfig,
};

use std::time::Duration;

/// Per-connection runtime settings
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Outbound buffer size; a full buffer disconnects the client
    pub send_buffer_size: usize,
    pub heartbeat_interval: Duration,
    /// Close a connection that has sent nothing for this long
    pub heartbeat_timeout: Duration,
    /// Largest accepted inbound text frame
    pub max_frame_bytes: usize,
    /// Upper bound for handling one inbound command
    pub handler_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            send_buffer_size: DEFAULT_SEND_BUFFER_SIZE,
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_INTERVAL_SECS),
            heartbeat_timeout: Duration::from_secs(DEFAULT_HEARTBEAT_TIMEOUT_SECS),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            handler_timeout: Duration::from_secs(DEFAULT_HANDLER_TIMEOUT_SECS),
        }
    }
}

impl From<&WebSocketConfig> for ConnectionConfig {
    fn from(config: &WebSocketConfig) -> Self {
        Self {
            send_buffer_size: config.send_buffer_size,
            heartbeat_interval: Duration::from_secs(config.heartbeat_interval_secs),
            heartbeat_timeout: Duration::from_secs(config.heartbeat_timeout_secs),
            max_frame_bytes: config.max_frame_bytes,
            handler_timeout: Duration::from_secs(config.handler_timeout_secs),
        }
    }
}
