use nh_config::Config;

/// Admission and command policy applied by the gateway
#[derive(Debug, Clone)]
pub struct GatewayPolicy {
    /// Maximum live connections across all channels
    pub max_connections: usize,
    /// Accepted `Origin` values; empty accepts every origin
    pub allowed_origins: Vec<String>,
    /// Accept `publish` frames from clients
    pub allow_client_publish: bool,
    /// `subscribe` must carry the tenant's secret key
    pub require_channel_key: bool,
}

impl GatewayPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_connections: config.server.max_connections,
            allowed_origins: config.server.allowed_origins.clone(),
            allow_client_publish: config.gateway.allow_client_publish,
            require_channel_key: config.gateway.require_channel_key,
        }
    }

    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }

        match origin {
            Some(origin) => self.allowed_origins.iter().any(|allowed| allowed == origin),
            None => false,
        }
    }
}

impl Default for GatewayPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
