//! Assembly of the gateway's collaborators from configuration.

use crate::Result as ServerErrorResult;

use nh_broker::{BackoffConfig, BrokerLink, BrokerOptions, NotificationPublisher};
use nh_config::Config;
use nh_db::{DbError, MIGRATOR, TenantDirectory};
use nh_ws::{
    AppState, ChannelRegistry, ConnectionConfig, ConnectionRegistry, GatewayPolicy, Metrics,
    ShutdownCoordinator,
};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

const MAX_DB_CONNECTIONS: u32 = 10;
const DB_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long shutdown waits for upgraded sockets to leave their channels
pub const CONNECTION_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Open the tenant database and bring its schema up to date.
pub async fn open_pool(database_path: &Path) -> ServerErrorResult<SqlitePool> {
    info!("Connecting to database: {}", database_path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_DB_CONNECTIONS)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .busy_timeout(DB_BUSY_TIMEOUT),
        )
        .await?;

    info!("Running database migrations...");
    MIGRATOR.run(&pool).await.map_err(DbError::from)?;
    info!("Migrations complete");

    Ok(pool)
}

pub fn broker_options(config: &Config) -> BrokerOptions {
    BrokerOptions {
        subscribe_timeout: Duration::from_millis(config.broker.subscribe_timeout_ms),
        health_check_interval: Duration::from_secs(config.broker.health_check_interval_secs),
        reconnect: BackoffConfig {
            initial_delay: Duration::from_millis(config.reconnect.initial_delay_ms),
            max_delay: Duration::from_secs(config.reconnect.max_delay_secs),
            multiplier: config.reconnect.backoff_multiplier,
            jitter: config.reconnect.jitter,
        },
    }
}

/// Build the shared handler state. The channel registry attaches itself to
/// `broker` as its subscription source.
pub fn build_app_state(
    config: &Config,
    directory: Arc<dyn TenantDirectory>,
    broker: Arc<dyn BrokerLink>,
    shutdown: ShutdownCoordinator,
) -> AppState {
    let metrics = Metrics::default();
    let policy = GatewayPolicy::from_config(config);

    AppState {
        channels: ChannelRegistry::new(broker.clone(), metrics.clone()),
        directory,
        publisher: NotificationPublisher::new(broker),
        registry: ConnectionRegistry::new(policy.max_connections),
        metrics,
        shutdown,
        config: ConnectionConfig::from(&config.websocket),
        policy: Arc::new(policy),
    }
}

/// Wait for live connections to finish their cleanup, then close the
/// broker link. Returns false if connections were still open at the
/// deadline; the broker is closed either way.
pub async fn drain_and_close(
    connections: &ConnectionRegistry,
    broker: &dyn BrokerLink,
    timeout: Duration,
) -> bool {
    let drained = connections.wait_drained(timeout).await;
    if !drained {
        warn!(
            "{} connection(s) still open after {:?}, closing broker link anyway",
            connections.total_count().await,
            timeout
        );
    }

    broker.close().await;
    info!("Broker link closed");
    drained
}
