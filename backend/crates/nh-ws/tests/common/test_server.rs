#![allow(dead_code)]

use nh_broker::{BrokerLink, InMemoryBrokerLink, NotificationPublisher};
use nh_core::Tenant;
use nh_db::{InMemoryTenantDirectory, Result as DbErrorResult, TenantDirectory};
use nh_ws::{
    AppState, ChannelRegistry, ConnectionConfig, ConnectionRegistry, GatewayPolicy, Metrics,
    ShutdownCoordinator,
};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{Router, routing::get};
use axum_test::TestServer;

/// Tenants every default test server knows about
pub const TEST_TENANTS: [&str; 3] = ["acme", "beta", "other"];

/// Configuration for test server instances
#[derive(Debug, Clone)]
pub struct TestServerConfig {
    pub tenants: Vec<String>,
    pub max_connections: usize,
    pub allowed_origins: Vec<String>,
    pub allow_client_publish: bool,
    pub require_channel_key: bool,
    pub max_frame_bytes: usize,
    pub send_buffer_size: usize,
    /// Directory lookups of this channel panic inside the handler
    pub faulty_channel: Option<String>,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            tenants: TEST_TENANTS.iter().map(|t| t.to_string()).collect(),
            max_connections: 100,
            allowed_origins: Vec::new(),
            allow_client_publish: true,
            require_channel_key: false,
            max_frame_bytes: ConnectionConfig::default().max_frame_bytes,
            send_buffer_size: ConnectionConfig::default().send_buffer_size,
            faulty_channel: None,
        }
    }
}

impl TestServerConfig {
    /// Create config with strict connection limits (for limit tests)
    pub fn with_strict_limits() -> Self {
        Self {
            max_connections: 2,
            ..Default::default()
        }
    }

    pub fn with_allowed_origins(origins: &[&str]) -> Self {
        Self {
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_max_frame_bytes(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes,
            ..Default::default()
        }
    }

    pub fn with_send_buffer_size(send_buffer_size: usize) -> Self {
        Self {
            send_buffer_size,
            ..Default::default()
        }
    }

    pub fn with_faulty_channel(channel: &str) -> Self {
        Self {
            faulty_channel: Some(channel.to_string()),
            ..Default::default()
        }
    }
}

/// Directory whose lookups of one channel panic
struct FaultyDirectory {
    inner: Arc<InMemoryTenantDirectory>,
    faulty_channel: String,
}

#[async_trait]
impl TenantDirectory for FaultyDirectory {
    async fn lookup(&self, name: &str) -> DbErrorResult<Option<Tenant>> {
        if name == self.faulty_channel {
            panic!("directory lookup of {} exploded", name);
        }
        self.inner.lookup(name).await
    }

    async fn create(&self, name: &str, owner_id: Option<&str>) -> DbErrorResult<Tenant> {
        self.inner.create(name, owner_id).await
    }

    async fn list_names(&self) -> DbErrorResult<Vec<String>> {
        self.inner.list_names().await
    }
}

/// Test server with access to its state and in-memory collaborators
pub struct TestServerWithState {
    pub server: TestServer,
    pub app_state: AppState,
    pub broker: Arc<InMemoryBrokerLink>,
    pub directory: Arc<InMemoryTenantDirectory>,
}

/// Create a TestServer with default configuration
pub fn create_test_server() -> TestServerWithState {
    create_test_server_with_config(TestServerConfig::default())
}

/// Create a TestServer with custom configuration
pub fn create_test_server_with_config(config: TestServerConfig) -> TestServerWithState {
    let broker = Arc::new(InMemoryBrokerLink::new(Duration::from_millis(500)));
    let directory = Arc::new(InMemoryTenantDirectory::with_tenants(config.tenants.clone()));
    let (app, app_state) = create_app(config, broker.clone(), directory.clone());

    let server = TestServer::builder()
        .http_transport()
        .build(app)
        .expect("Failed to create test server");

    TestServerWithState {
        server,
        app_state,
        broker,
        directory,
    }
}

/// Build the Axum Router with AppState
fn create_app(
    config: TestServerConfig,
    broker: Arc<InMemoryBrokerLink>,
    directory: Arc<InMemoryTenantDirectory>,
) -> (Router, AppState) {
    let broker: Arc<dyn BrokerLink> = broker;
    let directory: Arc<dyn TenantDirectory> = match config.faulty_channel {
        Some(faulty_channel) => Arc::new(FaultyDirectory {
            inner: directory,
            faulty_channel,
        }),
        None => directory,
    };
    let metrics = Metrics::default();

    let policy = GatewayPolicy {
        max_connections: config.max_connections,
        allowed_origins: config.allowed_origins,
        allow_client_publish: config.allow_client_publish,
        require_channel_key: config.require_channel_key,
    };

    let connection_config = ConnectionConfig {
        max_frame_bytes: config.max_frame_bytes,
        send_buffer_size: config.send_buffer_size,
        ..Default::default()
    };

    let app_state = AppState {
        channels: ChannelRegistry::new(broker.clone(), metrics.clone()),
        directory,
        publisher: NotificationPublisher::new(broker),
        registry: ConnectionRegistry::new(policy.max_connections),
        metrics,
        shutdown: ShutdownCoordinator::new(),
        config: connection_config,
        policy: Arc::new(policy),
    };

    let router = Router::new()
        .route("/ws", get(nh_ws::handler))
        .with_state(app_state.clone());

    (router, app_state)
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
