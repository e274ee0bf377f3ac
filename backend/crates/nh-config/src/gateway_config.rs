use serde::Deserialize;

pub const DEFAULT_ALLOW_CLIENT_PUBLISH: bool = true;
pub const DEFAULT_REQUIRE_CHANNEL_KEY: bool = false;
pub const DEFAULT_MAX_TENANTS_PER_OWNER: u32 = 0;

/// Command policy for connected clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Accept `publish` frames from clients. These skip quota enforcement.
    pub allow_client_publish: bool,
    /// `subscribe` must carry the tenant's secret key
    pub require_channel_key: bool,
    /// Tenants one owner may create through `create_channel` (0 = unlimited)
    pub max_tenants_per_owner: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            allow_client_publish: DEFAULT_ALLOW_CLIENT_PUBLISH,
            require_channel_key: DEFAULT_REQUIRE_CHANNEL_KEY,
            max_tenants_per_owner: DEFAULT_MAX_TENANTS_PER_OWNER,
        }
    }
}
