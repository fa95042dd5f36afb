//! Movement types and stock arithmetic.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use common::{InvoiceId, Money, MovementId, ProductId};
use serde::{Deserialize, Serialize};

/// Direction of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    /// Stock increase (purchase, restock, opening balance).
    In,
    /// Stock decrease (sale, loss, consumption).
    Out,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
        }
    }

    /// Applies the direction to a quantity.
    pub fn signed(&self, quantity: u32) -> i64 {
        match self {
            MovementType::In => i64::from(quantity),
            MovementType::Out => -i64::from(quantity),
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single dated stock-affecting event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub movement_type: MovementType,
    pub quantity: u32,
    pub unit_price: Money,
    /// Always `quantity × unit_price`.
    pub total: Money,
    pub date: NaiveDate,
    /// Set only on movements derived from a paid invoice.
    pub invoice_id: Option<InvoiceId>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryMovement {
    pub(crate) fn record(new: NewMovement, now: DateTime<Utc>) -> Self {
        Self {
            id: MovementId::new(),
            product_id: new.product_id,
            movement_type: new.movement_type,
            quantity: new.quantity,
            unit_price: new.unit_price,
            total: new.unit_price.multiply(new.quantity),
            date: new.date.unwrap_or_else(|| now.date_naive()),
            invoice_id: new.invoice_id,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// System-derived movements carry the invoice they were materialized from.
    pub fn is_system_derived(&self) -> bool {
        self.invoice_id.is_some()
    }

    /// The stock change this movement contributes.
    pub fn effect(&self) -> StockChange {
        StockChange {
            product_id: self.product_id,
            change: self.movement_type.signed(self.quantity),
        }
    }

    /// The stock change that undoes this movement.
    pub fn reversal(&self) -> StockChange {
        StockChange {
            product_id: self.product_id,
            change: -self.movement_type.signed(self.quantity),
        }
    }
}

/// Input for a new movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub movement_type: MovementType,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    /// Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Only materialization may set this; the manual path rejects it.
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    pub created_by: String,
}

impl NewMovement {
    pub fn inbound(
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            movement_type: MovementType::In,
            product_id,
            quantity,
            unit_price,
            date: None,
            invoice_id: None,
            created_by: created_by.into(),
        }
    }

    pub fn outbound(
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            movement_type: MovementType::Out,
            ..Self::inbound(product_id, quantity, unit_price, created_by)
        }
    }
}

/// Replacement values for a manual movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementUpdate {
    pub quantity: u32,
    pub unit_price: Money,
    /// Moves the movement to another product when set.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// A signed change to one product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChange {
    pub product_id: ProductId,
    pub change: i64,
}

/// Folds changes into one net change per product.
///
/// Order of first appearance is kept so the caller sees the reversed product
/// before the newly targeted one.
pub fn net_changes(changes: &[StockChange]) -> Vec<StockChange> {
    let mut order: Vec<ProductId> = Vec::new();
    let mut totals: BTreeMap<ProductId, i64> = BTreeMap::new();
    for c in changes {
        if !totals.contains_key(&c.product_id) {
            order.push(c.product_id);
        }
        *totals.entry(c.product_id).or_insert(0) += c.change;
    }

    order
        .into_iter()
        .map(|product_id| StockChange {
            product_id,
            change: totals.get(&product_id).copied().unwrap_or_default(),
        })
        .collect()
}

/// Stock of one product before and after a change, reported back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDelta {
    pub product_id: ProductId,
    pub before: i64,
    pub after: i64,
    pub change: i64,
}

impl StockDelta {
    /// Negative stock is a valid, flagged state rather than an error.
    pub fn is_negative(&self) -> bool {
        self.after < 0
    }
}
