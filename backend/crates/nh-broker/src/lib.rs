mod backoff;
mod broker_link;
mod broker_options;
mod delivery;
mod error;
mod link_state;
mod memory;
mod notification_publisher;
mod redis_link;
mod subscription_table;

pub use backoff::{Backoff, BackoffConfig};
pub use broker_link::{BrokerLink, connect};
pub use broker_options::BrokerOptions;
pub use delivery::{DeliveryHandler, SubscriptionSource};
pub use error::{BrokerError, Result};
pub use link_state::LinkState;
pub use memory::in_memory_broker_link::InMemoryBrokerLink;
pub use notification_publisher::NotificationPublisher;
pub use redis_link::redis_broker_link::RedisBrokerLink;

pub(crate) use subscription_table::SubscriptionTable;

/// `broker.url` value selecting the in-process broker
pub const MEMORY_URL: &str = "memory://";
