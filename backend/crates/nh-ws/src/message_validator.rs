use crate::{Result as WsErrorResult, WsError};

use std::panic::Location;

use error_location::ErrorLocation;

/// Checks applied to raw inbound frames before they are decoded
pub struct MessageValidator;

impl MessageValidator {
    /// Reject text frames larger than `max_bytes`.
    #[track_caller]
    pub fn validate_frame_size(size: usize, max_bytes: usize) -> WsErrorResult<()> {
        if size > max_bytes {
            return Err(WsError::FrameTooLarge {
                size,
                max: max_bytes,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(())
    }

    /// Binary frames carry no command in this protocol.
    #[track_caller]
    pub fn reject_binary() -> WsErrorResult<()> {
        Err(WsError::BinaryNotSupported {
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// A subscribe must present a non-empty key when keys are required.
    #[track_caller]
    pub fn validate_key_present(key: Option<&str>) -> WsErrorResult<&str> {
        match key {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(WsError::Unauthorized {
                message: "channel key is required".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
