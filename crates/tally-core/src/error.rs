//! Error types for tally.

use crate::session::Phase;
use thiserror::Error;

/// A shared error type for every tally crate.
///
/// Only `Validation`, `NotFound`, `IncompleteBallot` and `InvalidTransition`
/// are meant to reach a participant or organizer. Persistence failures are
/// swallowed by the replicated store and only appear here when a caller
/// asks a single substrate directly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TallyError {
    /// A required input was missing or malformed
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A pairwise ballot did not designate a winner for every pair
    #[error("Incomplete ballot: {designated} of {required} pairs designated")]
    IncompleteBallot { designated: usize, required: usize },

    /// A lifecycle transition that the session's phase does not allow
    #[error("Cannot move session from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    /// A storage substrate rejected a read or write
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TallyError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an IncompleteBallot error
    pub fn is_incomplete_ballot(&self) -> bool {
        matches!(self, Self::IncompleteBallot { .. })
    }

    /// Returns `true` if the caller can fix the input and retry.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::IncompleteBallot { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for TallyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TallyError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for TallyError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for TallyError {
    fn from(err: url::ParseError) -> Self {
        Self::validation("invitation", err.to_string())
    }
}

/// A type alias for `Result<T, TallyError>`.
pub type Result<T> = std::result::Result<T, TallyError>;
