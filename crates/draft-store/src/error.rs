use thiserror::Error;

use crate::DraftId;

/// Errors that can occur when interacting with a draft store.
#[derive(Debug, Error)]
pub enum DraftStoreError {
    /// No draft exists with the given id.
    #[error("Draft not found: {0}")]
    NotFound(DraftId),

    /// The store refused the operation.
    #[error("Draft store unavailable: {0}")]
    Unavailable(String),

    /// A stored stage name could not be parsed.
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for draft store operations.
pub type Result<T> = std::result::Result<T, DraftStoreError>;
