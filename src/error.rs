//! Error types for the CLI

use std::path::PathBuf;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading an input file failed
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Input YAML did not parse
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        /// File holding the YAML
        path: PathBuf,
        /// Parser error
        source: serde_yaml::Error,
    },

    /// Output serialization failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bucket or object operation failed
    #[error(transparent)]
    Bucket(#[from] bootbucket_common::Error),

    /// Ignition document generation failed
    #[error(transparent)]
    Ignition(#[from] bootbucket_ignition::IgnitionError),

    /// Logging could not be set up
    #[error(transparent)]
    Telemetry(#[from] bootbucket_common::telemetry::TelemetryError),

    /// Input was rejected by validation
    #[error("validation error: {message}")]
    Validation {
        /// What failed
        message: String,
    },
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }
}
