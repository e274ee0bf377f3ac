use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Config error: {0}")]
    Config(#[from] nh_config::ConfigError),

    #[error("Database error: {0}")]
    Db(#[from] nh_db::DbError),

    #[error("Broker error: {0}")]
    Broker(#[from] nh_broker::BrokerError),

    #[error("IO error: {source} {location}")]
    Io {
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Logger error: {message} {location}")]
    Logger {
        message: String,
        location: ErrorLocation,
    },
}

impl From<std::io::Error> for ServerError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<sqlx::Error> for ServerError {
    #[track_caller]
    fn from(source: sqlx::Error) -> Self {
        Self::Db(nh_db::DbError::from(source))
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
