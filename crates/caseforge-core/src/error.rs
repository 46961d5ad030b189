//! Error types for the Caseforge import pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Caseforge workspace.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CaseforgeError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound { entity_type: String, id: String },

    /// Caller supplied input that cannot be processed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A session was fetched but contained no user messages
    #[error("Session '{session_id}' contains no user messages")]
    EmptySession { session_id: String },

    /// A session never produced an assistant turn, so no expected
    /// output can be derived from it
    #[error("Session '{session_id}' has no assistant response")]
    NoAssistantResponse { session_id: String },

    /// Retrieval chunk lookup failed (recoverable; callers may proceed
    /// with an empty chunk list)
    #[error("Chunk retrieval failed: {0}")]
    ChunkFetch(String),

    /// Data access error (repository/storage layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "JSON", etc.
        message: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CaseforgeError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an EmptySession error
    pub fn empty_session(session_id: impl Into<String>) -> Self {
        Self::EmptySession {
            session_id: session_id.into(),
        }
    }

    /// Creates a NoAssistantResponse error
    pub fn no_assistant_response(session_id: impl Into<String>) -> Self {
        Self::NoAssistantResponse {
            session_id: session_id.into(),
        }
    }

    /// Creates a ChunkFetch error
    pub fn chunk_fetch(message: impl Into<String>) -> Self {
        Self::ChunkFetch(message.into())
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
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

    /// Check if this is an InvalidInput error
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if this is an EmptySession error
    pub fn is_empty_session(&self) -> bool {
        matches!(self, Self::EmptySession { .. })
    }

    /// Check if this is a NoAssistantResponse error
    pub fn is_no_assistant_response(&self) -> bool {
        matches!(self, Self::NoAssistantResponse { .. })
    }

    /// Check if this is a ChunkFetch error
    pub fn is_chunk_fetch(&self) -> bool {
        matches!(self, Self::ChunkFetch(_))
    }

    /// Check if this is a DataAccess error
    pub fn is_data_access(&self) -> bool {
        matches!(self, Self::DataAccess(_))
    }

    /// Check if this error means a session cannot yield a test case.
    ///
    /// Returns true for:
    /// - `EmptySession` errors
    /// - `NoAssistantResponse` errors
    ///
    /// The import worker counts these as per-session failures without
    /// aborting the surrounding task.
    pub fn is_unusable_session(&self) -> bool {
        matches!(
            self,
            Self::EmptySession { .. } | Self::NoAssistantResponse { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<serde_json::Error> for CaseforgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from String (for error messages)
impl From<String> for CaseforgeError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, CaseforgeError>`.
pub type Result<T> = std::result::Result<T, CaseforgeError>;
