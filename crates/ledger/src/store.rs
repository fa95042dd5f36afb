use async_trait::async_trait;
use common::{InvoiceId, MovementId, ProductId};

use crate::{InventoryMovement, Result, StockChange, StockDelta};

/// Storage for movements and the stock levels derived from them.
///
/// Every mutating call writes the movement records and applies the given
/// stock changes as one atomic step, so the stored stock can never drift
/// from the movements. Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts new movements and applies `changes`.
    async fn insert(
        &self,
        movements: Vec<InventoryMovement>,
        changes: &[StockChange],
    ) -> Result<Vec<StockDelta>>;

    /// Replaces an existing movement and applies `changes`.
    ///
    /// Fails with `MovementNotFound` if no movement has that id.
    async fn replace(
        &self,
        movement: InventoryMovement,
        changes: &[StockChange],
    ) -> Result<Vec<StockDelta>>;

    /// Removes a movement and applies `changes`, returning the removed record.
    async fn remove(
        &self,
        id: MovementId,
        changes: &[StockChange],
    ) -> Result<(InventoryMovement, Vec<StockDelta>)>;

    async fn get(&self, id: MovementId) -> Result<Option<InventoryMovement>>;

    /// All movements ordered by date, then creation time.
    async fn list(&self) -> Result<Vec<InventoryMovement>>;

    async fn list_for_product(&self, product_id: ProductId) -> Result<Vec<InventoryMovement>>;

    async fn list_for_invoice(&self, invoice_id: InvoiceId) -> Result<Vec<InventoryMovement>>;

    /// Current stock of a product; zero for products with no movements.
    async fn stock(&self, product_id: ProductId) -> Result<i64>;

    /// Current stock of every product that has had a movement.
    async fn stock_levels(&self) -> Result<Vec<(ProductId, i64)>>;
}
