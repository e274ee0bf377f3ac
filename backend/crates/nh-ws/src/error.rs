use nh_broker::BrokerError;
use nh_core::CoreError;
use nh_db::DbError;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WsError {
    #[error("Connection closed: {reason} {location}")]
    ConnectionClosed {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Invalid JSON frame: {source} {location}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("Frame has no type {location}")]
    TypeRequired { location: ErrorLocation },

    #[error("Unsupported message type: {message_type} {location}")]
    UnsupportedType {
        message_type: String,
        location: ErrorLocation,
    },

    #[error("Channel is required {location}")]
    ChannelRequired { location: ErrorLocation },

    #[error("Invalid channel: {message} {location}")]
    InvalidChannel {
        message: String,
        location: ErrorLocation,
    },

    #[error("Content is required {location}")]
    ContentRequired { location: ErrorLocation },

    #[error("Binary frame rejected {location}")]
    BinaryNotSupported { location: ErrorLocation },

    #[error("Frame of {size} bytes exceeds limit of {max} {location}")]
    FrameTooLarge {
        size: usize,
        max: usize,
        location: ErrorLocation,
    },

    #[error("Channel not found: {channel} {location}")]
    ChannelNotFound {
        channel: String,
        location: ErrorLocation,
    },

    #[error("Channel already exists: {channel} {location}")]
    ChannelExists {
        channel: String,
        location: ErrorLocation,
    },

    #[error("Channel quota exceeded for owner {owner_id} {location}")]
    QuotaExceeded {
        owner_id: String,
        location: ErrorLocation,
    },

    #[error("Unauthorized: {message} {location}")]
    Unauthorized {
        message: String,
        location: ErrorLocation,
    },

    #[error("Client publish is disabled {location}")]
    PublishDisabled { location: ErrorLocation },

    #[error("Publish failed: {source} {location}")]
    PublishFailed {
        #[source]
        source: BrokerError,
        location: ErrorLocation,
    },

    #[error("Upstream unavailable: {source} {location}")]
    UpstreamUnavailable {
        #[source]
        source: BrokerError,
        location: ErrorLocation,
    },

    #[error("Tenant directory error: {source} {location}")]
    Directory {
        #[source]
        source: DbError,
        location: ErrorLocation,
    },

    #[error("Handler timed out after {timeout_secs}s {location}")]
    Timeout {
        timeout_secs: u64,
        location: ErrorLocation,
    },

    #[error("Send buffer full, client too slow {location}")]
    SlowConsumer { location: ErrorLocation },

    #[error("Handler fault: {message} {location}")]
    HandlerFault {
        message: String,
        location: ErrorLocation,
    },

    #[error("Connection limit exceeded: {current} connections (max: {max}) {location}")]
    ConnectionLimitExceeded {
        current: usize,
        max: usize,
        location: ErrorLocation,
    },

    #[error("Heartbeat timeout after {timeout_secs}s {location}")]
    HeartbeatTimeout {
        timeout_secs: u64,
        location: ErrorLocation,
    },

    #[error("Serialization error: {source} {location}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },
}

impl WsError {
    /// Text sent to the client in an error frame. Never carries locations or
    /// internal details.
    pub fn client_message(&self) -> String {
        match self {
            Self::ConnectionClosed { .. } => "connection closed".to_string(),
            Self::InvalidJson { .. } => "invalid json format".to_string(),
            Self::TypeRequired { .. } => "type is required".to_string(),
            Self::UnsupportedType { message_type, .. } => {
                format!("unsupported message type: {}", message_type)
            }
            Self::ChannelRequired { .. } => "channel is required".to_string(),
            Self::InvalidChannel { message, .. } => message.clone(),
            Self::ContentRequired { .. } => "content is required".to_string(),
            Self::BinaryNotSupported { .. } => "binary frames are not supported".to_string(),
            Self::FrameTooLarge { max, .. } => format!("frame exceeds {} bytes", max),
            Self::ChannelNotFound { channel, .. } => format!("channel not found: {}", channel),
            Self::ChannelExists { channel, .. } => format!("channel already exists: {}", channel),
            Self::QuotaExceeded { .. } => "channel quota exceeded".to_string(),
            Self::Unauthorized { .. } => "unauthorized".to_string(),
            Self::PublishDisabled { .. } => "publishing is disabled".to_string(),
            Self::PublishFailed { .. } => "failed to publish message".to_string(),
            Self::UpstreamUnavailable { .. } => "notification service unavailable".to_string(),
            Self::Directory { .. } => "internal error".to_string(),
            Self::Timeout { .. } => "request timed out".to_string(),
            Self::SlowConsumer { .. } => "connection too slow".to_string(),
            Self::HandlerFault { .. } => "internal error".to_string(),
            Self::ConnectionLimitExceeded { .. } => "too many connections".to_string(),
            Self::HeartbeatTimeout { .. } => "heartbeat timeout".to_string(),
            Self::Serialization { .. } => "internal error".to_string(),
        }
    }

    /// Whether the connection must be torn down after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::HandlerFault { .. }
                | Self::SlowConsumer { .. }
                | Self::ConnectionClosed { .. }
                | Self::HeartbeatTimeout { .. }
        )
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionClosed { .. } => "connection_closed",
            Self::InvalidJson { .. }
            | Self::TypeRequired { .. }
            | Self::UnsupportedType { .. }
            | Self::ChannelRequired { .. }
            | Self::InvalidChannel { .. }
            | Self::ContentRequired { .. }
            | Self::BinaryNotSupported { .. }
            | Self::FrameTooLarge { .. } => "protocol",
            Self::ChannelNotFound { .. } => "channel_not_found",
            Self::ChannelExists { .. } => "channel_exists",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::Unauthorized { .. } => "unauthorized",
            Self::PublishDisabled { .. } => "publish_disabled",
            Self::PublishFailed { .. } | Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::Directory { .. } => "directory",
            Self::Timeout { .. } => "timeout",
            Self::SlowConsumer { .. } => "slow_consumer",
            Self::HandlerFault { .. } => "handler_fault",
            Self::ConnectionLimitExceeded { .. } => "connection_limit",
            Self::HeartbeatTimeout { .. } => "heartbeat_timeout",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<CoreError> for WsError {
    #[track_caller]
    fn from(source: CoreError) -> Self {
        let location = ErrorLocation::from(Location::caller());
        match source {
            CoreError::ChannelRequired { .. } => Self::ChannelRequired { location },
            CoreError::Validation { message, .. } => Self::InvalidChannel { message, location },
            CoreError::Serialization { source, .. } => Self::Serialization { source, location },
        }
    }
}

impl From<DbError> for WsError {
    #[track_caller]
    fn from(source: DbError) -> Self {
        let location = ErrorLocation::from(Location::caller());
        match source {
            DbError::Conflict { name, .. } => Self::ChannelExists {
                channel: name,
                location,
            },
            DbError::QuotaExceeded { owner_id, .. } => Self::QuotaExceeded { owner_id, location },
            other => Self::Directory {
                source: other,
                location,
            },
        }
    }
}

impl From<BrokerError> for WsError {
    #[track_caller]
    fn from(source: BrokerError) -> Self {
        Self::UpstreamUnavailable {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for WsError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        Self::Serialization {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, WsError>;
