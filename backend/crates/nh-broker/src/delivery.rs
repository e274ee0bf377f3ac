use std::sync::Arc;

/// Callback invoked with the raw payload of every message on one channel.
///
/// Runs on the broker's read path: it must not block or await.
pub type DeliveryHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Reports which channels currently need an upstream subscription.
///
/// After a reconnect the broker link re-subscribes exactly what the source
/// reports, each with the handler it supplies. Implementations must not
/// block on anything the broker link holds while calling out.
pub trait SubscriptionSource: Send + Sync {
    fn active_channels(&self) -> Vec<(String, DeliveryHandler)>;
}
