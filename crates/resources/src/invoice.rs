//! Invoice records, their line items and payment details.

use chrono::{DateTime, NaiveDate, Utc};
use common::{AppointmentId, ClientId, InvoiceId, Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::service::Resource;

/// What a line item bills for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineItemKind {
    /// A stocked good. Selling it moves inventory.
    Product { product_id: ProductId },
    /// A service (soin). Never touches inventory.
    Service { service_ref: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(flatten)]
    pub kind: LineItemKind,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    pub fn product(
        product_id: ProductId,
        description: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            kind: LineItemKind::Product { product_id },
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    pub fn service(
        service_ref: impl Into<String>,
        description: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            kind: LineItemKind::Service {
                service_ref: service_ref.into(),
            },
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the product id when this line sells a stocked good.
    pub fn product_id(&self) -> Option<ProductId> {
        match &self.kind {
            LineItemKind::Product { product_id } => Some(*product_id),
            LineItemKind::Service { .. } => None,
        }
    }

    /// A line is empty when it bills nothing identifiable.
    pub fn is_empty(&self) -> bool {
        let blank_ref = match &self.kind {
            LineItemKind::Product { .. } => false,
            LineItemKind::Service { service_ref } => service_ref.trim().is_empty(),
        };
        self.quantity == 0 || (blank_ref && self.description.trim().is_empty())
    }

    pub fn total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Cheque,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChequeDetails {
    pub number: String,
    pub bank: String,
    pub holder: String,
    pub due_date: Option<NaiveDate>,
}

/// Settlement information attached to an invoice at the payment stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    pub cheque: Option<ChequeDetails>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceInput {
    pub client_id: ClientId,
    pub patient_cin: String,
    pub appointment_id: Option<AppointmentId>,
    pub date: NaiveDate,
    pub items: Vec<LineItem>,
    pub status: InvoiceStatus,
    pub payment: Option<PaymentDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub client_id: ClientId,
    pub patient_cin: String,
    pub appointment_id: Option<AppointmentId>,
    pub date: NaiveDate,
    pub items: Vec<LineItem>,
    pub status: InvoiceStatus,
    pub payment: Option<PaymentDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn total(&self) -> Money {
        self.items.iter().map(LineItem::total).sum()
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// Line items that sell stocked goods.
    pub fn product_lines(&self) -> impl Iterator<Item = (ProductId, &LineItem)> {
        self.items
            .iter()
            .filter_map(|item| item.product_id().map(|id| (id, item)))
    }
}

impl Resource for Invoice {
    type Id = InvoiceId;
    type Input = InvoiceInput;

    const KIND: &'static str = "invoice";

    fn id(&self) -> InvoiceId {
        self.id
    }

    fn generate_id() -> InvoiceId {
        InvoiceId::new()
    }

    fn from_input(id: InvoiceId, input: InvoiceInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            client_id: input.client_id,
            patient_cin: input.patient_cin,
            appointment_id: input.appointment_id,
            date: input.date,
            items: input.items,
            status: input.status,
            payment: input.payment,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_input(&mut self, input: InvoiceInput, now: DateTime<Utc>) {
        self.client_id = input.client_id;
        self.patient_cin = input.patient_cin;
        self.appointment_id = input.appointment_id;
        self.date = input.date;
        self.items = input.items;
        self.status = input.status;
        self.payment = input.payment;
        self.updated_at = now;
    }
}
