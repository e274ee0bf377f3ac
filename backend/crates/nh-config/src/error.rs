use std::fmt::Display;
use std::panic::Location;
use std::path::{Path, PathBuf};

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} must be {min}-{max}, got {got} {location}")]
    OutOfRange {
        key: &'static str,
        min: String,
        max: String,
        got: String,
        location: ErrorLocation,
    },

    #[error("{key} {message} {location}")]
    Invalid {
        key: &'static str,
        message: String,
        location: ErrorLocation,
    },

    #[error("Cannot access {path}: {source} {location}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Cannot parse {path}: {source} {location}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
        location: ErrorLocation,
    },

    #[error("Cannot determine current working directory: {source} {location}")]
    WorkingDir {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },
}

impl ConfigError {
    #[track_caller]
    pub fn out_of_range(
        key: &'static str,
        min: impl Display,
        max: impl Display,
        got: impl Display,
    ) -> Self {
        Self::OutOfRange {
            key,
            min: min.to_string(),
            max: max.to_string(),
            got: got.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn parse(path: &Path, source: toml::de::Error) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn working_dir(source: std::io::Error) -> Self {
        Self::WorkingDir {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// The offending setting, for validation failures.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Self::OutOfRange { key, .. } | Self::Invalid { key, .. } => Some(key),
            _ => None,
        }
    }
}

pub type ConfigErrorResult<T> = std::result::Result<T, ConfigError>;
