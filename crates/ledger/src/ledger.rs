//! The inventory ledger service.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use common::{FieldErrors, InvoiceId, Money, MovementId, ProductId};
use resources::{
    Invoice, Payment, PaymentInput, PaymentMethod, Product, ResourceService, ResourceServices,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{LedgerError, Result};
use crate::movement::{InventoryMovement, MovementType, MovementUpdate, NewMovement, StockDelta};
use crate::store::LedgerStore;

/// `created_by` recorded on movements derived from invoices.
pub const SYSTEM_USER: &str = "system";

/// Movements touched by an operation and the stock deltas it caused.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerOutcome {
    pub movements: Vec<InventoryMovement>,
    pub deltas: Vec<StockDelta>,
}

/// Result of materializing one paid invoice.
#[derive(Debug, Clone, Serialize)]
pub struct MaterializeOutcome {
    pub invoice_id: InvoiceId,
    pub movements: Vec<InventoryMovement>,
    pub deltas: Vec<StockDelta>,
    pub payment: Payment,
    /// True when a payment record already existed and nothing was written.
    pub already_materialized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    pub product_id: ProductId,
    pub quantity: i64,
    pub negative: bool,
}

/// Maintains per-product stock from manual and invoice-derived movements.
#[derive(Clone)]
pub struct InventoryLedger<L: LedgerStore> {
    store: L,
    products: Arc<dyn ResourceService<Product>>,
    invoices: Arc<dyn ResourceService<Invoice>>,
    payments: Arc<dyn ResourceService<Payment>>,
    /// Held across the payment check, the OUT inserts and the payment write.
    settling: Arc<Mutex<()>>,
}

impl<L: LedgerStore> InventoryLedger<L> {
    pub fn new(store: L, services: &ResourceServices) -> Self {
        Self {
            store,
            products: Arc::clone(&services.products),
            invoices: Arc::clone(&services.invoices),
            payments: Arc::clone(&services.payments),
            settling: Arc::new(Mutex::new(())),
        }
    }

    /// Records a manual IN or OUT movement.
    ///
    /// OUT movements may take stock below zero; the resulting delta is
    /// flagged as negative rather than rejected.
    #[tracing::instrument(skip(self, new), fields(product_id = %new.product_id, movement_type = %new.movement_type))]
    pub async fn create_movement(&self, new: NewMovement) -> Result<LedgerOutcome> {
        if let Some(invoice_id) = new.invoice_id {
            return Err(LedgerError::InvoiceLinkNotAllowed(invoice_id));
        }
        validate(new.quantity, new.unit_price, &new.created_by)?;
        self.ensure_product(new.product_id).await?;

        let movement = InventoryMovement::record(new, Utc::now());
        let deltas = self
            .store
            .insert(vec![movement.clone()], &[movement.effect()])
            .await?;

        self.observe(&movement, &deltas, "created");
        Ok(LedgerOutcome {
            movements: vec![movement],
            deltas,
        })
    }

    /// Edits a manual movement as reversal of the old effect followed by the
    /// new one. Changing the product reports one delta per product.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_movement(
        &self,
        id: MovementId,
        update: MovementUpdate,
    ) -> Result<LedgerOutcome> {
        let existing = self.manual_movement(id).await?;
        validate(update.quantity, update.unit_price, &existing.created_by)?;

        let product_id = update.product_id.unwrap_or(existing.product_id);
        if product_id != existing.product_id {
            self.ensure_product(product_id).await?;
        }

        let mut revised = existing.clone();
        revised.product_id = product_id;
        revised.quantity = update.quantity;
        revised.unit_price = update.unit_price;
        revised.total = update.unit_price.multiply(update.quantity);
        revised.date = update.date.unwrap_or(existing.date);
        revised.updated_at = Utc::now();

        let changes = [existing.reversal(), revised.effect()];
        let deltas = self.store.replace(revised.clone(), &changes).await?;

        self.observe(&revised, &deltas, "updated");
        Ok(LedgerOutcome {
            movements: vec![revised],
            deltas,
        })
    }

    /// Removes a manual movement after reversing its effect.
    #[tracing::instrument(skip(self))]
    pub async fn delete_movement(&self, id: MovementId) -> Result<LedgerOutcome> {
        let existing = self.manual_movement(id).await?;
        let (removed, deltas) = self.store.remove(id, &[existing.reversal()]).await?;

        self.observe(&removed, &deltas, "deleted");
        Ok(LedgerOutcome {
            movements: vec![removed],
            deltas,
        })
    }

    /// Takes a paid invoice's goods out of stock and records its payment.
    ///
    /// One OUT movement is written per product line; service lines are
    /// skipped. The payment record is written last and marks the invoice as
    /// done, so calling this again is a no-op. Concurrent calls are
    /// serialized, so an invoice never gets two payments.
    #[tracing::instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    pub async fn materialize_from_paid_invoice(
        &self,
        invoice: &Invoice,
    ) -> Result<MaterializeOutcome> {
        if !invoice.is_paid() {
            return Err(LedgerError::InvoiceNotPaid(invoice.id));
        }

        let _settling = self.settling.lock().await;
        if let Some(payment) = self.payment_for(invoice.id).await? {
            tracing::debug!(payment_id = %payment.id, "invoice already materialized");
            return Ok(MaterializeOutcome {
                invoice_id: invoice.id,
                movements: Vec::new(),
                deltas: Vec::new(),
                payment,
                already_materialized: true,
            });
        }

        // Movements left by a run that stopped before the payment was written
        // are reused instead of being written twice.
        let existing = self.store.list_for_invoice(invoice.id).await?;
        let (movements, deltas) = if existing.is_empty() {
            let now = Utc::now();
            let movements: Vec<InventoryMovement> = invoice
                .product_lines()
                .filter(|(_, item)| item.quantity > 0)
                .map(|(product_id, item)| {
                    InventoryMovement::record(
                        NewMovement {
                            movement_type: MovementType::Out,
                            product_id,
                            quantity: item.quantity,
                            unit_price: item.unit_price,
                            date: Some(invoice.date),
                            invoice_id: Some(invoice.id),
                            created_by: SYSTEM_USER.to_string(),
                        },
                        now,
                    )
                })
                .collect();
            let changes: Vec<_> = movements.iter().map(InventoryMovement::effect).collect();
            let deltas = if movements.is_empty() {
                Vec::new()
            } else {
                self.store.insert(movements.clone(), &changes).await?
            };
            (movements, deltas)
        } else {
            (existing, Vec::new())
        };

        let (method, cheque, paid_at) = match &invoice.payment {
            Some(details) => (details.method, details.cheque.clone(), details.paid_at),
            None => (PaymentMethod::Cash, None, invoice.updated_at),
        };
        let payment = self
            .payments
            .create(PaymentInput {
                invoice_id: invoice.id,
                client_id: invoice.client_id,
                amount: invoice.total(),
                method,
                cheque,
                paid_at,
            })
            .await?;

        for movement in &movements {
            self.observe(movement, &[], "materialized");
        }
        self.warn_negative(&deltas);
        metrics::counter!("ledger_materialized_invoices_total").increment(1);
        tracing::info!(
            payment_id = %payment.id,
            movements = movements.len(),
            "invoice materialized"
        );

        Ok(MaterializeOutcome {
            invoice_id: invoice.id,
            movements,
            deltas,
            payment,
            already_materialized: false,
        })
    }

    /// Materializes every paid invoice that has no payment record yet.
    ///
    /// Stops at the first failure; invoices already processed stay processed.
    #[tracing::instrument(skip(self))]
    pub async fn materialize_pending(&self) -> Result<Vec<MaterializeOutcome>> {
        let settled: HashSet<InvoiceId> = self
            .payments
            .list()
            .await?
            .into_iter()
            .map(|p| p.invoice_id)
            .collect();

        let mut outcomes = Vec::new();
        for invoice in self.invoices.list().await? {
            if invoice.is_paid() && !settled.contains(&invoice.id) {
                let outcome = self.materialize_from_paid_invoice(&invoice).await?;
                // Another caller may have settled it since the payments were listed.
                if !outcome.already_materialized {
                    outcomes.push(outcome);
                }
            }
        }
        Ok(outcomes)
    }

    /// Loads an invoice by id and materializes it.
    pub async fn materialize_invoice(&self, invoice_id: InvoiceId) -> Result<MaterializeOutcome> {
        let invoice = self
            .invoices
            .get_by_id(invoice_id)
            .await?
            .ok_or(LedgerError::InvoiceNotFound(invoice_id))?;
        self.materialize_from_paid_invoice(&invoice).await
    }

    pub async fn movement(&self, id: MovementId) -> Result<InventoryMovement> {
        self.store
            .get(id)
            .await?
            .ok_or(LedgerError::MovementNotFound(id))
    }

    pub async fn movements(&self, product_id: Option<ProductId>) -> Result<Vec<InventoryMovement>> {
        match product_id {
            Some(id) => self.store.list_for_product(id).await,
            None => self.store.list().await,
        }
    }

    /// Incrementally maintained stock of a product.
    pub async fn stock(&self, product_id: ProductId) -> Result<i64> {
        self.store.stock(product_id).await
    }

    pub async fn stock_levels(&self) -> Result<Vec<StockLevel>> {
        Ok(self
            .store
            .stock_levels()
            .await?
            .into_iter()
            .map(|(product_id, quantity)| StockLevel {
                product_id,
                quantity,
                negative: quantity < 0,
            })
            .collect())
    }

    /// Stock recomputed from scratch as Σ IN − Σ OUT.
    pub async fn recompute_stock(&self, product_id: ProductId) -> Result<i64> {
        Ok(self
            .store
            .list_for_product(product_id)
            .await?
            .iter()
            .map(|m| m.effect().change)
            .sum())
    }

    /// Returns true when maintained and recomputed stock agree.
    pub async fn is_consistent(&self, product_id: ProductId) -> Result<bool> {
        Ok(self.stock(product_id).await? == self.recompute_stock(product_id).await?)
    }

    async fn manual_movement(&self, id: MovementId) -> Result<InventoryMovement> {
        let movement = self.movement(id).await?;
        if let Some(invoice_id) = movement.invoice_id {
            tracing::warn!(
                movement_id = %id,
                %invoice_id,
                "manual change to invoice movement refused"
            );
            return Err(LedgerError::PermissionDenied {
                movement_id: id,
                invoice_id,
            });
        }
        Ok(movement)
    }

    async fn ensure_product(&self, product_id: ProductId) -> Result<()> {
        match self.products.get_by_id(product_id).await? {
            Some(_) => Ok(()),
            None => Err(LedgerError::ProductNotFound(product_id)),
        }
    }

    async fn payment_for(&self, invoice_id: InvoiceId) -> Result<Option<Payment>> {
        Ok(self
            .payments
            .list()
            .await?
            .into_iter()
            .find(|p| p.invoice_id == invoice_id))
    }

    fn observe(&self, movement: &InventoryMovement, deltas: &[StockDelta], action: &'static str) {
        metrics::counter!(
            "ledger_movements_total",
            "movement_type" => movement.movement_type.as_str(),
            "action" => action
        )
        .increment(1);
        tracing::info!(
            movement_id = %movement.id,
            product_id = %movement.product_id,
            quantity = movement.quantity,
            action,
            "inventory movement applied"
        );
        self.warn_negative(deltas);
    }

    fn warn_negative(&self, deltas: &[StockDelta]) {
        for delta in deltas.iter().filter(|d| d.is_negative()) {
            metrics::counter!("ledger_negative_stock_total").increment(1);
            tracing::warn!(
                product_id = %delta.product_id,
                stock = delta.after,
                "stock is negative"
            );
        }
    }
}

fn validate(quantity: u32, unit_price: Money, created_by: &str) -> Result<()> {
    let mut errors = FieldErrors::new();
    if quantity == 0 {
        errors.push("quantity", "must be a positive integer");
    }
    if unit_price.checked_multiply(quantity).is_none() {
        errors.push("unit_price", "total is out of range");
    }
    errors.require("created_by", created_by);
    errors.into_result().map_err(LedgerError::Validation)
}
