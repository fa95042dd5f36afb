//! Saga error types.

use common::{ClientId, DraftId, FieldErrors};
use draft_store::{Draft, DraftStoreError, Stage};
use ledger::LedgerError;
use resources::ResourceError;
use thiserror::Error;

/// Errors that can occur while advancing a draft.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Stage input failed its required-field rules. Nothing was created.
    #[error("Invalid {stage} input: {errors}")]
    Validation { stage: Stage, errors: FieldErrors },

    /// A resource service call failed. The draft stays at its last good stage.
    #[error("Saga stage '{stage}' failed: {source}")]
    ResourceCreationFailure {
        stage: Stage,
        #[source]
        source: ResourceError,
    },

    /// The paid invoice could not be turned into stock movements and a payment.
    #[error("Saga stage 'payment' failed to settle invoice: {0}")]
    Settlement(#[source] LedgerError),

    /// The draft already reached the completed stage.
    #[error("Draft {0} is completed and cannot be advanced")]
    DraftCompleted(DraftId),

    /// `completed` is an outcome, not a stage callers can ask for.
    #[error("Cannot advance to stage '{0}'")]
    InvalidTarget(Stage),

    /// The client stage was already persisted with another client or mode.
    #[error("Draft {draft_id} is already bound to client {client_id}")]
    ClientModeLocked {
        draft_id: DraftId,
        client_id: ClientId,
    },

    #[error("Draft not found: {0}")]
    DraftNotFound(DraftId),

    /// A client the draft refers to no longer exists.
    #[error("Client not found: {0}")]
    ClientNotFound(ClientId),

    #[error("Draft store error: {0}")]
    DraftStore(#[from] DraftStoreError),
}

impl SagaError {
    /// The stage the failure belongs to, when there is one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            SagaError::Validation { stage, .. }
            | SagaError::ResourceCreationFailure { stage, .. } => Some(*stage),
            SagaError::Settlement(_) => Some(Stage::Payment),
            SagaError::ClientModeLocked { .. } | SagaError::ClientNotFound(_) => {
                Some(Stage::Client)
            }
            _ => None,
        }
    }
}

/// A failed `advance`, carrying the draft as last persisted.
///
/// `draft` is None when the run failed before anything was saved.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct AdvanceError {
    pub draft: Option<Box<Draft>>,
    #[source]
    pub source: SagaError,
}

impl AdvanceError {
    pub fn new(draft: Option<Draft>, source: SagaError) -> Self {
        Self {
            draft: draft.map(Box::new),
            source,
        }
    }

    pub fn without_draft(source: SagaError) -> Self {
        Self::new(None, source)
    }
}

impl From<SagaError> for AdvanceError {
    fn from(source: SagaError) -> Self {
        Self::without_draft(source)
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
