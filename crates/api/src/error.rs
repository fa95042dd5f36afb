//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ledger::LedgerError;
use resources::ResourceError;
use saga::{AdvanceError, SagaError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Saga error outside of an advance call.
    Saga(SagaError),
    /// Failed advance; the body carries the last persisted draft.
    Advance(AdvanceError),
    /// Inventory ledger error.
    Ledger(LedgerError),
    /// Resource service error.
    Resource(ResourceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg }))
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::Saga(err) => (saga_status(&err), saga_body(&err)),
            ApiError::Advance(err) => {
                let mut body = saga_body(&err.source);
                body["draft"] = serde_json::to_value(&err.draft).unwrap_or_default();
                (saga_status(&err.source), body)
            }
            ApiError::Ledger(err) => (
                ledger_status(&err),
                serde_json::json!({ "error": err.to_string() }),
            ),
            ApiError::Resource(err) => (
                resource_status(&err),
                serde_json::json!({ "error": err.to_string() }),
            ),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %body["error"], "request failed");
        }
        (status, axum::Json(body)).into_response()
    }
}

fn saga_body(err: &SagaError) -> serde_json::Value {
    let mut body = serde_json::json!({ "error": err.to_string() });
    if let Some(stage) = err.stage() {
        body["stage"] = serde_json::Value::from(stage.as_str());
    }
    if let SagaError::Validation { errors, .. } = err {
        body["fields"] = serde_json::to_value(errors).unwrap_or_default();
    }
    body
}

fn saga_status(err: &SagaError) -> StatusCode {
    match err {
        SagaError::Validation { .. } | SagaError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
        SagaError::DraftNotFound(_) | SagaError::ClientNotFound(_) => StatusCode::NOT_FOUND,
        SagaError::DraftCompleted(_) | SagaError::ClientModeLocked { .. } => StatusCode::CONFLICT,
        SagaError::ResourceCreationFailure { .. } | SagaError::Settlement(_) => {
            StatusCode::BAD_GATEWAY
        }
        SagaError::DraftStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
        LedgerError::PermissionDenied { .. } | LedgerError::InvoiceLinkNotAllowed(_) => {
            StatusCode::FORBIDDEN
        }
        LedgerError::MovementNotFound(_)
        | LedgerError::ProductNotFound(_)
        | LedgerError::InvoiceNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::InvoiceNotPaid(_) => StatusCode::CONFLICT,
        LedgerError::Resource(err) => resource_status(err),
    }
}

fn resource_status(err: &ResourceError) -> StatusCode {
    match err {
        ResourceError::NotFound { .. } => StatusCode::NOT_FOUND,
        ResourceError::Unavailable { .. } => StatusCode::BAD_GATEWAY,
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

impl From<AdvanceError> for ApiError {
    fn from(err: AdvanceError) -> Self {
        ApiError::Advance(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<ResourceError> for ApiError {
    fn from(err: ResourceError) -> Self {
        ApiError::Resource(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{InvoiceId, MovementId};
    use draft_store::Stage;

    #[test]
    fn test_permission_denied_is_forbidden() {
        let err = LedgerError::PermissionDenied {
            movement_id: MovementId::new(),
            invoice_id: InvoiceId::new(),
        };
        assert_eq!(ledger_status(&err), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_resource_failure_is_bad_gateway() {
        let err = SagaError::ResourceCreationFailure {
            stage: Stage::Appointment,
            source: ResourceError::unavailable("appointment", "down"),
        };
        assert_eq!(saga_status(&err), StatusCode::BAD_GATEWAY);
        assert_eq!(saga_body(&err)["stage"], "appointment");
    }
}
