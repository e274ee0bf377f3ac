pub mod error;
pub mod models;

pub use error::{CoreError, Result};
pub use models::channel_name::{ChannelName, MAX_CHANNEL_NAME_LENGTH};
pub use models::notification_envelope::{ANONYMOUS_SENDER, NotificationEnvelope};
pub use models::tenant::Tenant;

#[cfg(test)]
mod tests;
