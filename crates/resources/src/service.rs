//! The CRUD contract every resource store fulfils.

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ResourceError;
use crate::{Appointment, Client, Invoice, Payment, Product};

/// A record type managed by a [`ResourceService`].
pub trait Resource: Clone + Send + Sync + 'static {
    type Id: Copy + Eq + Hash + Display + Send + Sync + 'static;
    type Input: Clone + Send + Sync + 'static;

    /// Human-readable resource kind used in errors and logs.
    const KIND: &'static str;

    fn id(&self) -> Self::Id;

    fn generate_id() -> Self::Id;

    /// Builds a freshly created record from caller input.
    fn from_input(id: Self::Id, input: Self::Input, now: DateTime<Utc>) -> Self;

    /// Replaces the caller-controlled fields, keeping identity and creation time.
    fn apply_input(&mut self, input: Self::Input, now: DateTime<Utc>);
}

/// CRUD operations exposed by an independent record store.
#[async_trait]
pub trait ResourceService<R: Resource>: Send + Sync {
    /// Creates a record and returns it with its assigned identifier.
    async fn create(&self, input: R::Input) -> Result<R, ResourceError>;

    async fn get_by_id(&self, id: R::Id) -> Result<Option<R>, ResourceError>;

    /// Replaces the record's fields. Fails with `NotFound` for unknown ids.
    async fn update(&self, id: R::Id, input: R::Input) -> Result<R, ResourceError>;

    async fn delete(&self, id: R::Id) -> Result<(), ResourceError>;

    /// Lists all records in creation order.
    async fn list(&self) -> Result<Vec<R>, ResourceError>;
}

/// The five resource services, shared behind trait objects.
#[derive(Clone)]
pub struct ResourceServices {
    pub clients: Arc<dyn ResourceService<Client>>,
    pub appointments: Arc<dyn ResourceService<Appointment>>,
    pub invoices: Arc<dyn ResourceService<Invoice>>,
    pub payments: Arc<dyn ResourceService<Payment>>,
    pub products: Arc<dyn ResourceService<Product>>,
}
