//! Ledger error types.

use common::{FieldErrors, InvoiceId, MovementId, ProductId};
use resources::ResourceError;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Movement input failed its rules; nothing was written.
    #[error("Invalid movement: {0}")]
    Validation(FieldErrors),

    /// The movement is system-derived from an invoice and cannot be
    /// created, edited or deleted manually.
    #[error("Movement {movement_id} is linked to invoice {invoice_id} and cannot be changed manually")]
    PermissionDenied {
        movement_id: MovementId,
        invoice_id: InvoiceId,
    },

    /// Manual movements may not carry an invoice reference.
    #[error("Movements linked to invoice {0} are created by invoice materialization only")]
    InvoiceLinkNotAllowed(InvoiceId),

    #[error("Movement not found: {0}")]
    MovementNotFound(MovementId),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    #[error("Invoice {0} is not paid")]
    InvoiceNotPaid(InvoiceId),

    /// A resource service call failed.
    #[error("Resource service error: {0}")]
    Resource(#[from] ResourceError),
}

impl LedgerError {
    /// Returns true for errors that reject a manual change outright.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            LedgerError::PermissionDenied { .. } | LedgerError::InvoiceLinkNotAllowed(_)
        )
    }
}

/// Convenience type alias for ledger results.
pub type Result<T> = std::result::Result<T, LedgerError>;
