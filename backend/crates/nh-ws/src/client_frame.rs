//! Inbound JSON commands.

use crate::{Result as WsErrorResult, WsError};

use nh_core::ChannelName;

use std::panic::Location;

use error_location::ErrorLocation;
use serde::Deserialize;
use serde_json::Value;

/// Raw shape of an inbound text frame. Every field is optional so that
/// missing fields map to their own error instead of a generic decode error.
#[derive(Debug, Deserialize)]
struct RawClientFrame {
    #[serde(rename = "type")]
    message_type: Option<String>,
    channel: Option<String>,
    content: Option<Value>,
    key: Option<String>,
    owner_id: Option<String>,
}

/// A validated client command
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Subscribe {
        channel: ChannelName,
        key: Option<String>,
    },
    Unsubscribe {
        channel: ChannelName,
    },
    Publish {
        channel: ChannelName,
        content: Value,
    },
    CreateChannel {
        channel: ChannelName,
        owner_id: Option<String>,
    },
    ListChannels,
}

impl ClientCommand {
    /// Decode and validate one text frame.
    #[track_caller]
    pub fn parse(text: &str) -> WsErrorResult<Self> {
        let raw: RawClientFrame =
            serde_json::from_str(text).map_err(|source| WsError::InvalidJson {
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        let message_type = raw.message_type.as_deref().ok_or_else(|| WsError::TypeRequired {
            location: ErrorLocation::from(Location::caller()),
        })?;

        match message_type {
            "subscribe" => Ok(Self::Subscribe {
                channel: channel_of(&raw)?,
                key: raw.key,
            }),
            "unsubscribe" => Ok(Self::Unsubscribe {
                channel: channel_of(&raw)?,
            }),
            "publish" => {
                let channel = channel_of(&raw)?;
                let content = raw.content.ok_or_else(|| WsError::ContentRequired {
                    location: ErrorLocation::from(Location::caller()),
                })?;
                Ok(Self::Publish { channel, content })
            }
            "create_channel" => Ok(Self::CreateChannel {
                channel: channel_of(&raw)?,
                owner_id: raw.owner_id.filter(|owner| !owner.trim().is_empty()),
            }),
            "list_channels" => Ok(Self::ListChannels),
            other => Err(WsError::UnsupportedType {
                message_type: other.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Wire name of the command, used for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Subscribe { .. } => "subscribe",
            Self::Unsubscribe { .. } => "unsubscribe",
            Self::Publish { .. } => "publish",
            Self::CreateChannel { .. } => "create_channel",
            Self::ListChannels => "list_channels",
        }
    }
}

#[track_caller]
fn channel_of(raw: &RawClientFrame) -> WsErrorResult<ChannelName> {
    let channel = raw.channel.as_deref().unwrap_or_default();
    Ok(ChannelName::parse(channel)?)
}
