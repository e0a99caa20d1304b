//! Error types for equipzone
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for equipzone operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for equipzone
#[derive(Error, Debug)]
pub enum Error {
    /// Host resolution or network failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Host or record could not be found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The directory server answered with a non-success status
    #[error("Protocol error ({operation} in {zone}): server answered {rcode}")]
    Protocol {
        /// Zone the message was addressed to
        zone: String,
        /// Operation that was attempted
        operation: String,
        /// Response code returned by the server
        rcode: String,
    },

    /// Signature or key rejected
    #[error("Authentication failed ({operation} in {zone}): {message}")]
    Auth {
        /// Zone the message was addressed to
        zone: String,
        /// Operation that was attempted
        operation: String,
        /// Reason reported by the transport or server
        message: String,
    },

    /// Zone transfer aborted mid-stream
    #[error("Zone transfer of {zone} failed: {message}")]
    Transfer {
        /// Zone being transferred
        zone: String,
        /// Underlying failure
        message: String,
    },

    /// Malformed or self-referential record graph
    #[error("Correlation error: {0}")]
    Correlation(String),

    /// Remote inventory retrieval failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid query pattern
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(
        zone: impl Into<String>,
        operation: impl Into<String>,
        rcode: impl std::fmt::Display,
    ) -> Self {
        Self::Protocol {
            zone: zone.into(),
            operation: operation.into(),
            rcode: rcode.to_string(),
        }
    }

    /// Create an authentication error
    pub fn auth(
        zone: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Auth {
            zone: zone.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a zone transfer error
    pub fn transfer(zone: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transfer {
            zone: zone.into(),
            message: message.into(),
        }
    }

    /// Create a correlation error
    pub fn correlation(msg: impl Into<String>) -> Self {
        Self::Correlation(msg.into())
    }

    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True for rejected signatures or keys; these must not be retried with the same credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// True when a zone transfer was aborted and any partial result discarded.
    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::Transfer { .. })
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
