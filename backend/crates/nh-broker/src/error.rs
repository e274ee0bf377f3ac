use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Broker unavailable: {message} {location}")]
    Unavailable {
        message: String,
        location: ErrorLocation,
    },

    #[error("Broker link closed {location}")]
    Closed { location: ErrorLocation },

    #[error("Redis error: {source} {location}")]
    Redis {
        source: redis::RedisError,
        location: ErrorLocation,
    },

    #[error("Envelope error: {source} {location}")]
    Envelope {
        source: nh_core::CoreError,
        location: ErrorLocation,
    },
}

impl BrokerError {
    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn closed() -> Self {
        Self::Closed {
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<redis::RedisError> for BrokerError {
    #[track_caller]
    fn from(source: redis::RedisError) -> Self {
        Self::Redis {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<nh_core::CoreError> for BrokerError {
    #[track_caller]
    fn from(source: nh_core::CoreError) -> Self {
        Self::Envelope {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BrokerError>;
