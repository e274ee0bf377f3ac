use crate::{ConnectionId, Result as WsErrorResult, WsError};

use std::collections::HashMap;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use log::{info, warn};
use tokio::sync::{RwLock, watch};

/// Information about an accepted connection
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub origin: Option<String>,
    pub connected_at: DateTime<Utc>,
}

/// Registry of live connections, enforcing the total connection limit
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<ConnectionId, ConnectionInfo>>>,
    live: Arc<watch::Sender<usize>>,
    max_total: usize,
}

impl ConnectionRegistry {
    pub fn new(max_total: usize) -> Self {
        let (live, _) = watch::channel(0);
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            live: Arc::new(live),
            max_total,
        }
    }

    pub async fn register(
        &self,
        connection_id: ConnectionId,
        origin: Option<String>,
    ) -> WsErrorResult<()> {
        let mut connections = self.inner.write().await;

        if connections.len() >= self.max_total {
            warn!(
                "Total connection limit reached: {}/{}",
                connections.len(),
                self.max_total
            );
            return Err(WsError::ConnectionLimitExceeded {
                current: connections.len(),
                max: self.max_total,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        connections.insert(
            connection_id,
            ConnectionInfo {
                origin,
                connected_at: Utc::now(),
            },
        );
        self.live.send_replace(connections.len());
        info!(
            "Registered connection {connection_id} ({} total)",
            connections.len()
        );

        Ok(())
    }

    /// Remove a connection, returning what was recorded when it was accepted.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Option<ConnectionInfo> {
        let mut connections = self.inner.write().await;

        let record = connections.remove(&connection_id)?;
        self.live.send_replace(connections.len());
        let lifetime = Utc::now().signed_duration_since(record.connected_at);
        info!(
            "Unregistered connection {connection_id} from {} after {}s ({} total remaining)",
            record.origin.as_deref().unwrap_or("unknown origin"),
            lifetime.num_seconds(),
            connections.len()
        );
        Some(record)
    }

    pub async fn total_count(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Wait until every connection has unregistered. False if `timeout`
    /// elapsed first.
    pub async fn wait_drained(&self, timeout: Duration) -> bool {
        let mut live = self.live.subscribe();
        matches!(
            tokio::time::timeout(timeout, live.wait_for(|count| *count == 0)).await,
            Ok(Ok(_))
        )
    }
}
