//! Error types for bootbucket
//!
//! Every fallible step wraps its cause with a short static description of the
//! operation being attempted (bucket creation, policy attach, object put, ...)
//! so a caller can log the causal chain without re-deriving which step failed.

use thiserror::Error;

/// Errors surfaced by the cloud capability clients (object store, identity)
///
/// The concrete SDK clients map their transport failures onto these variants.
/// `Timeout` and `Cancelled` are carried through bootbucket unchanged as the
/// source of an [`Error::Transport`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The bucket already exists and is owned by the calling account
    #[error("bucket already owned by you")]
    BucketAlreadyOwnedByYou,

    /// The requested object key does not exist
    #[error("no such key")]
    NoSuchKey,

    /// Any other API failure reported by the service
    #[error("{code}: {message}")]
    Api {
        /// Service error code (e.g., "AccessDenied", "BucketNotEmpty")
        code: String,
        /// Human-readable message from the service
        message: String,
    },

    /// The transport deadline elapsed before the call completed
    #[error("request timed out")]
    Timeout,

    /// The call was cancelled by the caller's context
    #[error("request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Create an API error with the given code and message
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Main error type for bootbucket operations
#[derive(Debug, Error)]
pub enum Error {
    /// Operation requested while bucket management is turned off
    ///
    /// Callers usually treat this as a legitimate short-circuit.
    #[error("requested {operation} but bucket management is not enabled")]
    Disabled {
        /// Operation that was requested (e.g., "object creation")
        operation: &'static str,
    },

    /// A required argument was missing or empty
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the offending input
        message: String,
    },

    /// A capability client call failed
    #[error("{operation}: {source}")]
    Transport {
        /// Operation being attempted (e.g., "creating S3 bucket")
        operation: &'static str,
        /// The client failure, kept unchanged
        #[source]
        source: ClientError,
    },

    /// Hashing, JSON or number encoding failed
    #[error("encoding error [{context}]: {message}")]
    Encoding {
        /// Step that failed (e.g., "generating bucket name")
        context: &'static str,
        /// Description of what failed
        message: String,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("configuration error: {message}")]
    Config {
        /// Description of what is wrong
        message: String,
    },
}

impl Error {
    /// Create a disabled-management error for the given operation
    pub fn disabled(operation: &'static str) -> Self {
        Self::Disabled { operation }
    }

    /// Create an invalid-input error with the given message
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Wrap a client failure with the operation being attempted
    pub fn transport(operation: &'static str, source: ClientError) -> Self {
        Self::Transport { operation, source }
    }

    /// Create an encoding error for the given step
    pub fn encoding(context: &'static str, msg: impl Into<String>) -> Self {
        Self::Encoding {
            context,
            message: msg.into(),
        }
    }

    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error is a disabled-management short-circuit
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled { .. })
    }

    /// Whether the underlying transport reported a timeout or cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                source: ClientError::Timeout | ClientError::Cancelled,
                ..
            }
        )
    }

    /// The client failure behind a transport error, if any
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}
