//! Stocked products.
//!
//! Product records carry catalogue data only. Current stock is derived by the
//! inventory ledger from movements and is not a field here.

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::service::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub reference: String,
    pub unit_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub reference: String,
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Product {
    type Id = ProductId;
    type Input = ProductInput;

    const KIND: &'static str = "product";

    fn id(&self) -> ProductId {
        self.id
    }

    fn generate_id() -> ProductId {
        ProductId::new()
    }

    fn from_input(id: ProductId, input: ProductInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            reference: input.reference,
            unit_price: input.unit_price,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_input(&mut self, input: ProductInput, now: DateTime<Utc>) {
        self.name = input.name;
        self.reference = input.reference;
        self.unit_price = input.unit_price;
        self.updated_at = now;
    }
}
