mod channel_registry;
mod commit_ticket;

use crate::{ChannelRegistry, ConnectionHandle, ConnectionId, Metrics, ServerFrame};

use nh_broker::{BrokerLink, InMemoryBrokerLink};
use nh_core::ChannelName;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use tokio::sync::mpsc;

pub(crate) fn connection(buffer: usize) -> (ConnectionHandle, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(buffer);
    (ConnectionHandle::new(ConnectionId::new(), tx), rx)
}

pub(crate) fn memory_registry() -> (Arc<InMemoryBrokerLink>, Arc<ChannelRegistry>) {
    let link = Arc::new(InMemoryBrokerLink::new(Duration::from_millis(50)));
    let broker: Arc<dyn BrokerLink> = link.clone();
    let registry = ChannelRegistry::new(broker, Metrics::default());
    (link, registry)
}

pub(crate) fn channel(name: &str) -> ChannelName {
    ChannelName::parse(name).unwrap()
}

/// Next queued text frame, skipping pings. None when the buffer is empty.
pub(crate) fn next_frame(rx: &mut mpsc::Receiver<Message>) -> Option<ServerFrame> {
    while let Ok(message) = rx.try_recv() {
        if let Message::Text(text) = message {
            return Some(serde_json::from_str(text.as_str()).unwrap());
        }
    }
    None
}
