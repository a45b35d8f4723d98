//! Error types for the Elysian Gateway.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire gateway.
///
/// Typed, structured variants with automatic conversion from common
/// error types via the `From` trait. Simulated domain failures (a portal
/// that refuses to open, a denied permission) are *not* errors; they are
/// boolean outcomes that move the workflow to its `Error` step. This type
/// covers genuine programming and environment faults.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ElysianError {
    /// Entity not found with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Synchronous input validation failure
    #[error("Validation error: {0}")]
    Validation(String),

    /// An operation was invoked in a workflow step that does not permit it
    #[error("Workflow error: cannot {operation} while in step '{step}'")]
    Workflow {
        operation: &'static str,
        step: String,
    },

    /// Chat backend failure (already formatted for display)
    #[error("Chat error: {0}")]
    Chat(String),

    /// Ritual script compilation failure
    #[error("Ritual error: {0}")]
    Ritual(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Data access error (repository/storage layer)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ElysianError {
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

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Workflow error
    pub fn workflow(operation: &'static str, step: impl Into<String>) -> Self {
        Self::Workflow {
            operation,
            step: step.into(),
        }
    }

    /// Creates a Chat error
    pub fn chat(message: impl Into<String>) -> Self {
        Self::Chat(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
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

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a Workflow error
    pub fn is_workflow(&self) -> bool {
        matches!(self, Self::Workflow { .. })
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ElysianError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ElysianError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ElysianError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ElysianError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (application-edge glue)
impl From<anyhow::Error> for ElysianError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, ElysianError>`.
pub type Result<T> = std::result::Result<T, ElysianError>;
