use crate::{
    BrokerConfig, CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult,
    DEFAULT_CONFIG_DIR, DatabaseConfig, GatewayConfig, LoggingConfig, ReconnectConfig,
    ServerConfig, WebSocketConfig,
};

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub websocket: WebSocketConfig,
    pub broker: BrokerConfig,
    pub reconnect: ReconnectConfig,
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load config.
    ///
    /// Loading order:
    /// 1. Check for NH_CONFIG_DIR env var, else use ./.nh/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply NH_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)
                .map_err(|e| ConfigError::io(&config_dir, e))?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;

        toml::from_str(&contents).map_err(|e| ConfigError::parse(path, e))
    }

    /// Get the config directory.
    /// Priority: NH_CONFIG_DIR env var > ./.nh/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(ConfigError::working_dir)?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.websocket.validate()?;
        self.broker.validate()?;
        self.reconnect.validate()?;

        // A subscribe must give up before the handler running it does
        let handler_timeout_ms = self.websocket.handler_timeout_secs.saturating_mul(1000);
        if self.broker.subscribe_timeout_ms >= handler_timeout_ms {
            return Err(ConfigError::invalid(
                "broker.subscribe_timeout_ms",
                format!(
                    "must be below websocket.handler_timeout_secs ({}ms), got {}",
                    handler_timeout_ms, self.broker.subscribe_timeout_ms
                ),
            ));
        }

        // Database path must stay inside the config dir
        let db_path = Path::new(&self.database.path);
        if db_path.is_absolute() || self.database.path.contains("..") {
            return Err(ConfigError::invalid(
                "database.path",
                "must be relative and cannot contain '..'",
            ));
        }

        if let Some(file) = &self.logging.file
            && (Path::new(file).is_absolute() || file.contains(".."))
        {
            return Err(ConfigError::invalid(
                "logging.file",
                "must be relative and cannot contain '..'",
            ));
        }

        Ok(())
    }

    /// Get absolute path to database file.
    pub fn database_path(&self) -> ConfigErrorResult<PathBuf> {
        Ok(Self::config_dir()?.join(&self.database.path))
    }

    /// Get absolute path to the log file, if logging to a file.
    pub fn log_file_path(&self) -> ConfigErrorResult<Option<PathBuf>> {
        match &self.logging.file {
            Some(file) => Ok(Some(
                Self::config_dir()?.join(&self.logging.dir).join(file),
            )),
            None => Ok(None),
        }
    }

    /// Get bind address as string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Log configuration summary (NEVER logs secrets).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  server: {}:{} (max {} connections)",
            self.server.host, self.server.port, self.server.max_connections
        );

        if self.server.allowed_origins.is_empty() {
            info!("  origins: any");
        } else {
            info!("  origins: {}", self.server.allowed_origins.join(", "));
        }

        info!("  database: {}", self.database.path);

        info!(
            "  logging: {} (colored: {}, file: {})",
            *self.logging.level,
            self.logging.colored,
            self.logging.file.as_deref().unwrap_or("stdout")
        );

        info!(
            "  websocket: buffer={}, heartbeat={}s/{}s, max_frame={}B, handler_timeout={}s",
            self.websocket.send_buffer_size,
            self.websocket.heartbeat_interval_secs,
            self.websocket.heartbeat_timeout_secs,
            self.websocket.max_frame_bytes,
            self.websocket.handler_timeout_secs
        );

        info!(
            "  broker: {} (subscribe_timeout={}ms, health_check={}s)",
            redact_url(&self.broker.url),
            self.broker.subscribe_timeout_ms,
            self.broker.health_check_interval_secs
        );

        info!(
            "  reconnect: initial={}ms, max={}s, backoff={}x, jitter={}",
            self.reconnect.initial_delay_ms,
            self.reconnect.max_delay_secs,
            self.reconnect.backoff_multiplier,
            self.reconnect.jitter
        );

        info!(
            "  gateway: client_publish={}, channel_key={}, tenants_per_owner={}",
            self.gateway.allow_client_publish,
            self.gateway.require_channel_key,
            self.gateway.max_tenants_per_owner
        );

        if self.gateway.allow_client_publish {
            warn!("Client publish is enabled: publishes from connected clients bypass quota checks");
        }
    }

    fn apply_env_overrides(&mut self) {
        // Server
        Self::apply_env_string("NH_SERVER_HOST", &mut self.server.host);
        Self::apply_env_parse("NH_SERVER_PORT", &mut self.server.port);
        Self::apply_env_parse(
            "NH_SERVER_MAX_CONNECTIONS",
            &mut self.server.max_connections,
        );
        Self::apply_env_list(
            "NH_SERVER_ALLOWED_ORIGINS",
            &mut self.server.allowed_origins,
        );

        // Database
        Self::apply_env_string("NH_DATABASE_PATH", &mut self.database.path);

        // Logging
        Self::apply_env_parse("NH_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("NH_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("NH_LOG_FILE", &mut self.logging.file);

        // WebSocket
        Self::apply_env_parse(
            "NH_WS_SEND_BUFFER_SIZE",
            &mut self.websocket.send_buffer_size,
        );
        Self::apply_env_parse(
            "NH_WS_HEARTBEAT_INTERVAL_SECS",
            &mut self.websocket.heartbeat_interval_secs,
        );
        Self::apply_env_parse(
            "NH_WS_HEARTBEAT_TIMEOUT_SECS",
            &mut self.websocket.heartbeat_timeout_secs,
        );
        Self::apply_env_parse("NH_WS_MAX_FRAME_BYTES", &mut self.websocket.max_frame_bytes);
        Self::apply_env_parse(
            "NH_WS_HANDLER_TIMEOUT_SECS",
            &mut self.websocket.handler_timeout_secs,
        );

        // Broker
        Self::apply_env_string("NH_BROKER_URL", &mut self.broker.url);
        Self::apply_env_parse(
            "NH_BROKER_SUBSCRIBE_TIMEOUT_MS",
            &mut self.broker.subscribe_timeout_ms,
        );
        Self::apply_env_parse(
            "NH_BROKER_HEALTH_CHECK_INTERVAL_SECS",
            &mut self.broker.health_check_interval_secs,
        );

        // Reconnect
        Self::apply_env_parse(
            "NH_RECONNECT_INITIAL_DELAY_MS",
            &mut self.reconnect.initial_delay_ms,
        );
        Self::apply_env_parse(
            "NH_RECONNECT_MAX_DELAY_SECS",
            &mut self.reconnect.max_delay_secs,
        );
        Self::apply_env_parse(
            "NH_RECONNECT_BACKOFF_MULTIPLIER",
            &mut self.reconnect.backoff_multiplier,
        );
        Self::apply_env_bool("NH_RECONNECT_JITTER", &mut self.reconnect.jitter);

        // Gateway
        Self::apply_env_bool(
            "NH_GATEWAY_ALLOW_CLIENT_PUBLISH",
            &mut self.gateway.allow_client_publish,
        );
        Self::apply_env_bool(
            "NH_GATEWAY_REQUIRE_CHANNEL_KEY",
            &mut self.gateway.require_channel_key,
        );
        Self::apply_env_parse(
            "NH_GATEWAY_MAX_TENANTS_PER_OWNER",
            &mut self.gateway.max_tenants_per_owner,
        );
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }

    /// Helper: Apply environment variable override for comma separated lists
    fn apply_env_list(var_name: &str, target: &mut Vec<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
    }
}

/// Strip credentials from a broker URL before logging it.
pub(crate) fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
