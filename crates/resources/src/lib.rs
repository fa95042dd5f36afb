//! Record services consumed by the creation saga and the inventory ledger.
//!
//! Every resource (client, appointment, invoice, payment, product) is an
//! independent CRUD store behind the [`ResourceService`] trait. Calls succeed
//! or fail atomically one at a time; there is no cross-resource transaction
//! here, which is why the saga and ledger crates exist.

pub mod appointment;
pub mod client;
pub mod error;
pub mod invoice;
pub mod memory;
pub mod payment;
pub mod product;
pub mod service;

pub use appointment::{Appointment, AppointmentInput};
pub use client::{Client, ClientInput};
pub use error::ResourceError;
pub use invoice::{
    ChequeDetails, Invoice, InvoiceInput, InvoiceStatus, LineItem, LineItemKind, PaymentDetails,
    PaymentMethod,
};
pub use memory::{InMemoryResourceService, InMemoryResources};
pub use payment::{Payment, PaymentInput};
pub use product::{Product, ProductInput};
pub use service::{Resource, ResourceService, ResourceServices};
