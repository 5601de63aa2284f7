//! Error types for repomove.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every repomove layer.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum RepoMoveError {
    /// A required secret is absent for the requested scope.
    ///
    /// Carries every name the caller could have used to supply it.
    #[error(
        "Missing {kind}: supply header '{header}' or query parameter '{query}', or set {}",
        .env_vars.join(" / ")
    )]
    ConfigurationMissing {
        kind: String,
        header: String,
        query: String,
        env_vars: Vec<String>,
    },

    /// The origin or target platform call failed.
    #[error("External API error during {operation}{}: {message}", status_suffix(.status))]
    ExternalApi {
        operation: String,
        status: Option<u16>,
        message: String,
    },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Concurrent writers raced on the persisted state.
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepoMoveError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an ExternalApi error without an HTTP status.
    pub fn external(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalApi {
            operation: operation.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Creates an ExternalApi error carrying the HTTP status returned by the platform.
    pub fn external_with_status(
        operation: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::ExternalApi {
            operation: operation.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a StateConflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::StateConflict(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a missing-credential error
    pub fn is_configuration_missing(&self) -> bool {
        matches!(self, Self::ConfigurationMissing { .. })
    }

    /// Check if this is an external platform error
    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalApi { .. })
    }

    /// Check if this is a state conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::StateConflict(_))
    }

    /// Stable machine-readable label for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing { .. } => "configuration_missing",
            Self::ExternalApi { .. } => "external_api_error",
            Self::NotFound { .. } => "not_found",
            Self::StateConflict(_) => "state_conflict",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }

    /// Converts the error into the structured shape handed back to callers.
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind().to_string(),
            detail: self.to_string(),
        }
    }
}

/// Structured failure returned to callers instead of terminating the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: String,
    pub detail: String,
}

impl From<&RepoMoveError> for ErrorReport {
    fn from(err: &RepoMoveError) -> Self {
        err.to_report()
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for RepoMoveError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for RepoMoveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for RepoMoveError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {})", code),
        None => String::new(),
    }
}

/// A type alias for `Result<T, RepoMoveError>`.
pub type Result<T> = std::result::Result<T, RepoMoveError>;
