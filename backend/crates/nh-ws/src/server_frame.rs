//! Outbound JSON frames.

use crate::Result as WsErrorResult;

use nh_core::NotificationEnvelope;

use axum::extract::ws::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Success {
        message: String,
    },
    Error {
        message: String,
    },
    Message {
        channel: String,
        content: Value,
        timestamp: DateTime<Utc>,
    },
    ChannelList {
        channels: Vec<String>,
    },
}

impl ServerFrame {
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Delivery frame for a notification on `channel`.
    pub fn notification(channel: &str, envelope: NotificationEnvelope) -> Self {
        Self::Message {
            channel: channel.to_string(),
            content: envelope.content,
            timestamp: envelope.timestamp,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
            Self::Message { .. } => "message",
            Self::ChannelList { .. } => "channel_list",
        }
    }

    /// Encode as a WebSocket text message.
    #[track_caller]
    pub fn to_message(&self) -> WsErrorResult<Message> {
        let text = serde_json::to_string(self)?;
        Ok(Message::Text(text.into()))
    }
}
