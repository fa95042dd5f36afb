//! Creation saga for clinic visits.
//!
//! One saga run stitches together four independent resources:
//! 1. Client (created, or an existing one reused)
//! 2. Appointment
//! 3. Products (line items, no resource of their own)
//! 4. Invoice
//! 5. Payment (settles the invoice and takes sold goods out of stock)
//!
//! Progress is kept in a [`Draft`](draft_store::Draft). Every created
//! resource id is saved on the draft before the next stage starts, so a run
//! can stop at any stage and be resumed without creating anything twice.
//! Nothing is rolled back when a run is abandoned.

pub mod coordinator;
pub mod error;
pub mod stages;
pub mod workflow;

pub use coordinator::CreationSaga;
pub use error::{AdvanceError, SagaError};
pub use stages::{StageStep, validate_through};
pub use workflow::WorkflowRecord;
