//! Ignition-specific error types

use crate::validate::Report;

/// Result type for document generation
pub type Result<T> = std::result::Result<T, IgnitionError>;

/// Errors raised while building or persisting an Ignition config
#[derive(Debug, thiserror::Error)]
pub enum IgnitionError {
    #[error("ignition config validation failed:\n{report}")]
    Validation { report: Report },

    #[error("invalid permissions {value:?} for file {path}: {source}")]
    Permissions {
        path: String,
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Common(#[from] bootbucket_common::Error),
}

impl IgnitionError {
    /// The validation report behind a validation failure
    pub fn report(&self) -> Option<&Report> {
        match self {
            Self::Validation { report } => Some(report),
            _ => None,
        }
    }
}
