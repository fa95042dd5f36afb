//! In-memory resource services for tests and local runs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::ResourceError;
use crate::service::{Resource, ResourceService, ResourceServices};
use crate::{Appointment, Client, Invoice, Payment, Product};

struct InMemoryState<R: Resource> {
    records: Vec<R>,
    created: usize,
    fail_on_create: bool,
    fail_on_update: bool,
}

/// In-memory store for any [`Resource`], with failure injection.
///
/// Records are kept in creation order. Clones share the same storage.
pub struct InMemoryResourceService<R: Resource> {
    state: Arc<RwLock<InMemoryState<R>>>,
}

impl<R: Resource> Clone for InMemoryResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: Resource> Default for InMemoryResourceService<R> {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryState {
                records: Vec::new(),
                created: 0,
                fail_on_create: false,
                fail_on_update: false,
            })),
        }
    }
}

impl<R: Resource> InMemoryResourceService<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `create` call fail until reset.
    pub async fn set_fail_on_create(&self, fail: bool) {
        self.state.write().await.fail_on_create = fail;
    }

    /// Makes every following `update` call fail until reset.
    pub async fn set_fail_on_update(&self, fail: bool) {
        self.state.write().await.fail_on_update = fail;
    }

    /// Number of records currently stored.
    pub async fn count(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Number of successful `create` calls over the service's lifetime.
    pub async fn created_count(&self) -> usize {
        self.state.read().await.created
    }
}

#[async_trait]
impl<R: Resource> ResourceService<R> for InMemoryResourceService<R> {
    async fn create(&self, input: R::Input) -> Result<R, ResourceError> {
        let mut state = self.state.write().await;
        if state.fail_on_create {
            return Err(ResourceError::unavailable(R::KIND, "create rejected"));
        }

        let record = R::from_input(R::generate_id(), input, Utc::now());
        state.records.push(record.clone());
        state.created += 1;
        tracing::debug!(kind = R::KIND, id = %record.id(), "resource created");
        Ok(record)
    }

    async fn get_by_id(&self, id: R::Id) -> Result<Option<R>, ResourceError> {
        let state = self.state.read().await;
        Ok(state.records.iter().find(|r| r.id() == id).cloned())
    }

    async fn update(&self, id: R::Id, input: R::Input) -> Result<R, ResourceError> {
        let mut state = self.state.write().await;
        if state.fail_on_update {
            return Err(ResourceError::unavailable(R::KIND, "update rejected"));
        }

        let record = state
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| ResourceError::not_found(R::KIND, id))?;
        record.apply_input(input, Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, id: R::Id) -> Result<(), ResourceError> {
        let mut state = self.state.write().await;
        let before = state.records.len();
        state.records.retain(|r| r.id() != id);
        if state.records.len() == before {
            return Err(ResourceError::not_found(R::KIND, id));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<R>, ResourceError> {
        Ok(self.state.read().await.records.clone())
    }
}

/// Concrete in-memory handles for all five services.
///
/// Keeps the typed handles so tests can inject failures and count records,
/// while [`InMemoryResources::services`] hands out the trait-object bundle.
#[derive(Clone, Default)]
pub struct InMemoryResources {
    pub clients: InMemoryResourceService<Client>,
    pub appointments: InMemoryResourceService<Appointment>,
    pub invoices: InMemoryResourceService<Invoice>,
    pub payments: InMemoryResourceService<Payment>,
    pub products: InMemoryResourceService<Product>,
}

impl InMemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn services(&self) -> ResourceServices {
        ResourceServices {
            clients: Arc::new(self.clients.clone()),
            appointments: Arc::new(self.appointments.clone()),
            invoices: Arc::new(self.invoices.clone()),
            payments: Arc::new(self.payments.clone()),
            products: Arc::new(self.products.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientInput, ProductInput};
    use common::{ClientId, Money};

    fn client_input(cin: &str) -> ClientInput {
        ClientInput {
            cin: cin.to_string(),
            first_name: "Amina".to_string(),
            last_name: "Berrada".to_string(),
            phone: "0600000000".to_string(),
            email: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let service = InMemoryResourceService::<Client>::new();

        let created = service.create(client_input("AB1")).await.unwrap();
        assert_eq!(service.count().await, 1);

        let loaded = service.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded, created);

        let updated = service
            .update(created.id, client_input("AB2"))
            .await
            .unwrap();
        assert_eq!(updated.cin, "AB2");
        assert_eq!(updated.created_at, created.created_at);

        service.delete(created.id).await.unwrap();
        assert!(service.get_by_id(created.id).await.unwrap().is_none());
        assert_eq!(service.created_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let service = InMemoryResourceService::<Client>::new();
        let id = ClientId::new();

        let err = service.update(id, client_input("AB1")).await.unwrap_err();
        assert!(matches!(err, ResourceError::NotFound { kind: "client", .. }));
        assert!(service.delete(id).await.is_err());
    }

    #[tokio::test]
    async fn test_fail_on_create() {
        let service = InMemoryResourceService::<Product>::new();
        service.set_fail_on_create(true).await;

        let result = service
            .create(ProductInput {
                name: "Gel".to_string(),
                reference: "GEL-01".to_string(),
                unit_price: Money::from_cents(1500),
            })
            .await;
        assert!(matches!(result, Err(ResourceError::Unavailable { .. })));
        assert_eq!(service.count().await, 0);
    }

    #[tokio::test]
    async fn test_list_preserves_creation_order() {
        let service = InMemoryResourceService::<Client>::new();
        let a = service.create(client_input("A")).await.unwrap();
        let b = service.create(client_input("B")).await.unwrap();

        let ids: Vec<_> = service.list().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_bundle_shares_storage() {
        let resources = InMemoryResources::new();
        let services = resources.services();

        services.clients.create(client_input("AB1")).await.unwrap();
        assert_eq!(resources.clients.count().await, 1);
    }
}
