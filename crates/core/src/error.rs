//! Error types shared across the markup subsystem
//!
//! All synchronous mutation errors abort with zero observable state change;
//! preconditions are checked before any store is touched.

use uuid::Uuid;

/// Error type for all markup operations
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    /// Invalid input (blank layer name, non-positive reference length,
    /// attempt to delete a default layer)
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown or already-deleted entity id
    #[error("not found: {0}")]
    NotFound(Uuid),

    /// Mutation attempted against an annotation on a locked layer
    #[error("layer '{0}' is locked")]
    LockedLayer(String),

    /// Surfaced from the external persistence collaborator, never
    /// generated internally
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Result type for markup operations
pub type MarkupResult<T> = Result<T, MarkupError>;
