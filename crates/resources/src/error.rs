//! Resource service error types.

use thiserror::Error;

/// Errors returned by a resource service call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    /// No record of this kind exists with the given id.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The backing service rejected or could not complete the call.
    #[error("{kind} service unavailable: {reason}")]
    Unavailable { kind: &'static str, reason: String },
}

impl ResourceError {
    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        ResourceError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn unavailable(kind: &'static str, reason: impl Into<String>) -> Self {
        ResourceError::Unavailable {
            kind,
            reason: reason.into(),
        }
    }
}
