//! In-process broker link.
//!
//! Delivers publishes synchronously to the local handler. Used for
//! single-node deployments and to drive the disconnect/reconnect path in
//! tests without a Redis server.

use crate::{
    BrokerError, BrokerLink, DeliveryHandler, LinkState, Result as BrokerErrorResult,
    SubscriptionSource, SubscriptionTable,
};

use std::sync::Weak;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};

pub struct InMemoryBrokerLink {
    table: SubscriptionTable,
    state: LinkState,
    subscribe_timeout: Duration,
    closed: AtomicBool,
    upstream_subscribes: AtomicUsize,
}

impl InMemoryBrokerLink {
    pub fn new(subscribe_timeout: Duration) -> Self {
        Self {
            table: SubscriptionTable::new(),
            state: LinkState::new(true),
            subscribe_timeout,
            closed: AtomicBool::new(false),
            upstream_subscribes: AtomicUsize::new(0),
        }
    }

    /// Simulate losing the upstream connection.
    pub fn disconnect(&self) {
        self.state.set_connected(false);
        let dropped = self.table.mark_all_inactive();
        warn!(
            "In-memory broker disconnected, {} channel(s) inactive",
            dropped
        );
    }

    /// Simulate the upstream coming back: re-subscribe what the source reports.
    pub async fn reconnect(&self) -> BrokerErrorResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BrokerError::closed());
        }

        {
            let _ops = self.table.lock_ops().await;
            let channels = self.table.desired_channels();
            for channel in &channels {
                self.subscribe_upstream(channel);
            }
            info!(
                "In-memory broker reconnected, {} channel(s) resubscribed",
                channels.len()
            );
        }

        self.state.set_connected(true);
        Ok(())
    }

    /// Number of upstream subscribe operations actually performed.
    pub fn upstream_subscribe_count(&self) -> usize {
        self.upstream_subscribes.load(Ordering::Acquire)
    }

    pub fn active_channel_count(&self) -> usize {
        self.table.active_count()
    }

    fn subscribe_upstream(&self, channel: &str) {
        if self.table.is_active(channel) {
            return;
        }
        self.table.mark_active(channel);
        self.upstream_subscribes.fetch_add(1, Ordering::AcqRel);
        debug!("In-memory broker subscribed to {}", channel);
    }

    fn ensure_open(&self) -> BrokerErrorResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BrokerError::closed());
        }
        Ok(())
    }
}

#[async_trait]
impl BrokerLink for InMemoryBrokerLink {
    async fn publish(&self, channel: &str, payload: String) -> BrokerErrorResult<()> {
        self.ensure_open()?;

        if !self.state.is_connected() {
            return Err(BrokerError::unavailable("broker link is disconnected"));
        }

        let delivered = self.table.dispatch(channel, &payload);
        debug!(
            "In-memory publish to {} ({})",
            channel,
            if delivered { "delivered" } else { "no subscribers" }
        );
        Ok(())
    }

    async fn subscribe(&self, channel: &str, handler: DeliveryHandler) -> BrokerErrorResult<()> {
        self.ensure_open()?;

        if !self.state.wait_connected(self.subscribe_timeout).await {
            return Err(BrokerError::unavailable(format!(
                "no upstream connection after {:?}",
                self.subscribe_timeout
            )));
        }

        let _ops = self.table.lock_ops().await;
        self.table.register(channel, handler);
        self.subscribe_upstream(channel);
        Ok(())
    }

    async fn unsubscribe(&self, channel: &str) -> BrokerErrorResult<()> {
        let _ops = self.table.lock_ops().await;
        if self.table.remove(channel) {
            debug!("In-memory broker unsubscribed from {}", channel);
        }
        Ok(())
    }

    fn attach_source(&self, source: Weak<dyn SubscriptionSource>) {
        self.table.attach_source(source);
    }

    fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    fn is_subscribed(&self, channel: &str) -> bool {
        self.table.is_active(channel)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.state.set_connected(false);
        self.table.mark_all_inactive();
        info!("In-memory broker closed");
    }
}
