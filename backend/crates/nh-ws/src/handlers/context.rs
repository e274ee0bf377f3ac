use crate::{ChannelRegistry, ConnectionHandle, GatewayPolicy, Metrics};

use nh_broker::NotificationPublisher;
use nh_db::TenantDirectory;

use std::sync::Arc;
use std::time::Instant;

/// Everything a command handler may touch, scoped to one inbound frame.
#[derive(Clone)]
pub struct HandlerContext {
    pub connection: ConnectionHandle,
    pub channels: Arc<ChannelRegistry>,
    pub directory: Arc<dyn TenantDirectory>,
    pub publisher: NotificationPublisher,
    pub policy: Arc<GatewayPolicy>,
    pub metrics: Metrics,
    pub started_at: Instant,
}

impl HandlerContext {
    /// Get log prefix for structured logging
    pub fn log_prefix(&self) -> String {
        self.connection.log_prefix()
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }

    /// Producer identity for publishes originating from this connection
    pub fn sender_identity(&self) -> String {
        format!("connection:{}", self.connection.id())
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("connection", &self.connection)
            .field("policy", &self.policy)
            .finish()
    }
}
