use crate::{
    BrokerOptions, DeliveryHandler, InMemoryBrokerLink, MEMORY_URL, RedisBrokerLink,
    Result as BrokerErrorResult, SubscriptionSource,
};

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use log::info;

/// The single shared connection to the pub/sub backend.
#[async_trait]
pub trait BrokerLink: Send + Sync {
    /// Publish a payload. Fails fast when the link is down; never retries.
    async fn publish(&self, channel: &str, payload: String) -> BrokerErrorResult<()>;

    /// Route messages for `channel` to `handler`, subscribing upstream if needed.
    ///
    /// Waits up to the configured subscribe timeout for a disconnected link
    /// to come back. Subscribing an already subscribed channel only replaces
    /// the handler.
    async fn subscribe(&self, channel: &str, handler: DeliveryHandler) -> BrokerErrorResult<()>;

    async fn unsubscribe(&self, channel: &str) -> BrokerErrorResult<()>;

    /// Source consulted for what to re-subscribe after a reconnect.
    fn attach_source(&self, source: Weak<dyn SubscriptionSource>);

    fn is_connected(&self) -> bool;

    /// Whether `channel` is currently subscribed upstream.
    fn is_subscribed(&self, channel: &str) -> bool;

    /// Stop the link. Later calls fail with `BrokerError::Closed`.
    async fn close(&self);
}

/// Open the broker link selected by `url`.
pub async fn connect(url: &str, options: BrokerOptions) -> BrokerErrorResult<Arc<dyn BrokerLink>> {
    if url == MEMORY_URL {
        info!("Using in-memory broker link (single node)");
        return Ok(Arc::new(InMemoryBrokerLink::new(options.subscribe_timeout)));
    }

    let link = RedisBrokerLink::connect(url, options).await?;
    Ok(Arc::new(link))
}
