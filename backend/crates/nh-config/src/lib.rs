mod broker_config;
mod config;
mod database_config;
mod error;
mod gateway_config;
mod log_level;
mod logging_config;
mod reconnect_config;
mod server_config;
mod websocket_config;

pub use broker_config::{
    BrokerConfig, DEFAULT_BROKER_URL, DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
    DEFAULT_SUBSCRIBE_TIMEOUT_MS, MEMORY_BROKER_URL,
};
pub use config::Config;
pub use database_config::DatabaseConfig;
pub use error::{ConfigError, ConfigErrorResult};
pub use gateway_config::GatewayConfig;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use reconnect_config::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS, DEFAULT_JITTER, DEFAULT_MAX_DELAY_SECS,
    ReconnectConfig,
};
pub use server_config::ServerConfig;
pub use websocket_config::{
    DEFAULT_HANDLER_TIMEOUT_SECS, DEFAULT_HEARTBEAT_INTERVAL_SECS, DEFAULT_HEARTBEAT_TIMEOUT_SECS,
    DEFAULT_MAX_FRAME_BYTES, DEFAULT_SEND_BUFFER_SIZE, WebSocketConfig,
};

const CONFIG_DIR_ENV: &str = "NH_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".nh";
const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const MIN_PORT: u16 = 1024;
const DEFAULT_MAX_CONNECTIONS: usize = 10000;
const MIN_MAX_CONNECTIONS: usize = 1;
const MAX_MAX_CONNECTIONS: usize = 100_000;

const DEFAULT_DATABASE_FILENAME: &str = "tenants.db";

const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "log";
const DEFAULT_LOG_COLORED: bool = true;

#[cfg(test)]
mod tests;
