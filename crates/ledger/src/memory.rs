use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::{InvoiceId, MovementId, ProductId};
use tokio::sync::RwLock;

use crate::movement::net_changes;
use crate::{InventoryMovement, LedgerError, LedgerStore, Result, StockChange, StockDelta};

#[derive(Default)]
struct LedgerState {
    movements: HashMap<MovementId, InventoryMovement>,
    stock: BTreeMap<ProductId, i64>,
}

impl LedgerState {
    fn apply(&mut self, changes: &[StockChange]) -> Vec<StockDelta> {
        net_changes(changes)
            .into_iter()
            .map(|c| {
                let level = self.stock.entry(c.product_id).or_insert(0);
                let before = *level;
                *level += c.change;
                StockDelta {
                    product_id: c.product_id,
                    before,
                    after: *level,
                    change: c.change,
                }
            })
            .collect()
    }
}

/// In-memory ledger store.
///
/// Movements and stock live behind one lock, which makes each mutation
/// atomic with respect to readers.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of movements stored.
    pub async fn movement_count(&self) -> usize {
        self.state.read().await.movements.len()
    }
}

fn sorted(mut movements: Vec<InventoryMovement>) -> Vec<InventoryMovement> {
    movements.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
    movements
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert(
        &self,
        movements: Vec<InventoryMovement>,
        changes: &[StockChange],
    ) -> Result<Vec<StockDelta>> {
        let mut state = self.state.write().await;
        for movement in movements {
            state.movements.insert(movement.id, movement);
        }
        Ok(state.apply(changes))
    }

    async fn replace(
        &self,
        movement: InventoryMovement,
        changes: &[StockChange],
    ) -> Result<Vec<StockDelta>> {
        let mut state = self.state.write().await;
        let slot = state
            .movements
            .get_mut(&movement.id)
            .ok_or(LedgerError::MovementNotFound(movement.id))?;
        *slot = movement;
        Ok(state.apply(changes))
    }

    async fn remove(
        &self,
        id: MovementId,
        changes: &[StockChange],
    ) -> Result<(InventoryMovement, Vec<StockDelta>)> {
        let mut state = self.state.write().await;
        let removed = state
            .movements
            .remove(&id)
            .ok_or(LedgerError::MovementNotFound(id))?;
        let deltas = state.apply(changes);
        Ok((removed, deltas))
    }

    async fn get(&self, id: MovementId) -> Result<Option<InventoryMovement>> {
        Ok(self.state.read().await.movements.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<InventoryMovement>> {
        let state = self.state.read().await;
        Ok(sorted(state.movements.values().cloned().collect()))
    }

    async fn list_for_product(&self, product_id: ProductId) -> Result<Vec<InventoryMovement>> {
        let state = self.state.read().await;
        Ok(sorted(
            state
                .movements
                .values()
                .filter(|m| m.product_id == product_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_invoice(&self, invoice_id: InvoiceId) -> Result<Vec<InventoryMovement>> {
        let state = self.state.read().await;
        Ok(sorted(
            state
                .movements
                .values()
                .filter(|m| m.invoice_id == Some(invoice_id))
                .cloned()
                .collect(),
        ))
    }

    async fn stock(&self, product_id: ProductId) -> Result<i64> {
        Ok(self
            .state
            .read()
            .await
            .stock
            .get(&product_id)
            .copied()
            .unwrap_or(0))
    }

    async fn stock_levels(&self) -> Result<Vec<(ProductId, i64)>> {
        let state = self.state.read().await;
        Ok(state.stock.iter().map(|(id, qty)| (*id, *qty)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewMovement;
    use chrono::Utc;
    use common::Money;

    fn movement(product: ProductId, qty: u32) -> InventoryMovement {
        InventoryMovement::record(
            NewMovement::inbound(product, qty, Money::zero(), "staff"),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_applies_changes() {
        let store = InMemoryLedgerStore::new();
        let product = ProductId::new();
        let m = movement(product, 5);

        let deltas = store.insert(vec![m.clone()], &[m.effect()]).await.unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].before, 0);
        assert_eq!(deltas[0].after, 5);
        assert_eq!(store.stock(product).await.unwrap(), 5);
        assert_eq!(store.movement_count().await, 1);
    }

    #[tokio::test]
    async fn test_replace_unknown_movement_changes_nothing() {
        let store = InMemoryLedgerStore::new();
        let product = ProductId::new();
        let m = movement(product, 5);

        let result = store.replace(m.clone(), &[m.effect()]).await;
        assert!(matches!(result, Err(LedgerError::MovementNotFound(_))));
        assert_eq!(store.stock(product).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remove_returns_record() {
        let store = InMemoryLedgerStore::new();
        let product = ProductId::new();
        let m = movement(product, 5);
        store.insert(vec![m.clone()], &[m.effect()]).await.unwrap();

        let (removed, deltas) = store.remove(m.id, &[m.reversal()]).await.unwrap();
        assert_eq!(removed.id, m.id);
        assert_eq!(deltas[0].after, 0);
        assert!(store.get(m.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_product_has_zero_stock() {
        let store = InMemoryLedgerStore::new();
        assert_eq!(store.stock(ProductId::new()).await.unwrap(), 0);
        assert!(store.stock_levels().await.unwrap().is_empty());
    }
}
