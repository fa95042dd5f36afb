//! Shared types used across the clinic operations crates.
//!
//! - Typed identifiers for every resource and for drafts/movements
//! - [`Money`] stored as integer cents
//! - [`FieldError`] used by stage validation

mod ids;
mod money;
mod validation;

pub use ids::{AppointmentId, ClientId, DraftId, InvoiceId, MovementId, PaymentId, ProductId};
pub use money::Money;
pub use validation::{FieldError, FieldErrors};
