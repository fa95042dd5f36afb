//! Draft storage for the creation saga.
//!
//! A [`Draft`] is the resumable snapshot of one client → appointment →
//! products → invoice → payment run. Stores implement [`DraftStore`]; an
//! in-memory store is provided for tests and a PostgreSQL store for
//! persistence across restarts.

pub mod draft;
pub mod error;
pub mod form;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::DraftId;
pub use draft::{Draft, Stage};
pub use error::{DraftStoreError, Result};
pub use form::{AppointmentForm, ClientForm, ClientMode, FormData, InvoiceForm, PaymentForm};
pub use memory::InMemoryDraftStore;
pub use postgres::PostgresDraftStore;
pub use store::DraftStore;
