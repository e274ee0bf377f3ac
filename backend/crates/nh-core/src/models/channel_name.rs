//! Channel identifier shared by the gateway, registry and broker link.

use crate::{CoreError, Result as CoreErrorResult};

use std::borrow::Borrow;
use std::panic::Location;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

pub const MAX_CHANNEL_NAME_LENGTH: usize = 128;

/// A validated channel name.
///
/// A channel is keyed by its tenant's name. Names are trimmed, non-empty,
/// at most [`MAX_CHANNEL_NAME_LENGTH`] bytes and free of control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelName(String);

impl ChannelName {
    #[track_caller]
    pub fn parse(raw: &str) -> CoreErrorResult<Self> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(CoreError::ChannelRequired {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if trimmed.len() > MAX_CHANNEL_NAME_LENGTH {
            return Err(CoreError::Validation {
                message: format!(
                    "channel name exceeds {} bytes (got {})",
                    MAX_CHANNEL_NAME_LENGTH,
                    trimmed.len()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if trimmed.chars().any(char::is_control) {
            return Err(CoreError::Validation {
                message: "channel name contains control characters".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ChannelName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChannelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
