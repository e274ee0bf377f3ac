use crate::{BrokerLink, Result as BrokerErrorResult};

use nh_core::{ChannelName, NotificationEnvelope};

use std::sync::Arc;

use log::debug;
use serde_json::Value;

/// Publish path for already-authorized notifications.
///
/// An external validation gate calls this after it has checked producer
/// identity and quota. Client publishes from the gateway go through the same
/// path so every broker payload has the same envelope shape.
#[derive(Clone)]
pub struct NotificationPublisher {
    broker: Arc<dyn BrokerLink>,
}

impl NotificationPublisher {
    pub fn new(broker: Arc<dyn BrokerLink>) -> Self {
        Self { broker }
    }

    pub async fn publish(
        &self,
        sender: &str,
        channel: &ChannelName,
        content: Value,
    ) -> BrokerErrorResult<NotificationEnvelope> {
        let envelope = NotificationEnvelope::new(content, sender);
        let payload = envelope.to_payload()?;

        self.broker.publish(channel.as_str(), payload).await?;
        metrics::counter!("nh_broker_publishes_total").increment(1);
        debug!("Notification from {} published to {}", sender, channel);

        Ok(envelope)
    }
}
