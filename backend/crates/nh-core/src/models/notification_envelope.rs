//! Body carried over the pub/sub backend for every publish.

use crate::{CoreError, Result as CoreErrorResult};

use std::panic::Location;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Producer identity used when a publish carries none.
pub const ANONYMOUS_SENDER: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    pub content: Value,
    pub timestamp: DateTime<Utc>,
    pub sender: String,
}

impl NotificationEnvelope {
    /// Stamp `content` with the current time.
    pub fn new(content: Value, sender: impl Into<String>) -> Self {
        Self {
            content,
            timestamp: Utc::now(),
            sender: sender.into(),
        }
    }

    /// Decode a raw broker payload.
    ///
    /// Payloads published by other producers are not always envelopes. A
    /// payload that is JSON but not an envelope becomes the content as-is,
    /// anything else is carried as a plain string. Both are stamped with the
    /// delivery time.
    pub fn from_broker_payload(payload: &str) -> Self {
        if let Ok(envelope) = serde_json::from_str::<NotificationEnvelope>(payload) {
            return envelope;
        }

        let content = serde_json::from_str::<Value>(payload)
            .unwrap_or_else(|_| Value::String(payload.to_string()));

        Self::new(content, ANONYMOUS_SENDER)
    }

    #[track_caller]
    pub fn to_payload(&self) -> CoreErrorResult<String> {
        serde_json::to_string(self).map_err(|source| CoreError::Serialization {
            source,
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
