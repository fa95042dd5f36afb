//! Payment records.
//!
//! A payment record exists once per settled invoice and doubles as the marker
//! that the invoice's goods have been taken out of stock.

use chrono::{DateTime, Utc};
use common::{ClientId, InvoiceId, Money, PaymentId};
use serde::{Deserialize, Serialize};

use crate::invoice::{ChequeDetails, PaymentMethod};
use crate::service::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInput {
    pub invoice_id: InvoiceId,
    pub client_id: ClientId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub cheque: Option<ChequeDetails>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub invoice_id: InvoiceId,
    pub client_id: ClientId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub cheque: Option<ChequeDetails>,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Payment {
    type Id = PaymentId;
    type Input = PaymentInput;

    const KIND: &'static str = "payment";

    fn id(&self) -> PaymentId {
        self.id
    }

    fn generate_id() -> PaymentId {
        PaymentId::new()
    }

    fn from_input(id: PaymentId, input: PaymentInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            invoice_id: input.invoice_id,
            client_id: input.client_id,
            amount: input.amount,
            method: input.method,
            cheque: input.cheque,
            paid_at: input.paid_at,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_input(&mut self, input: PaymentInput, now: DateTime<Utc>) {
        self.invoice_id = input.invoice_id;
        self.client_id = input.client_id;
        self.amount = input.amount;
        self.method = input.method;
        self.cheque = input.cheque;
        self.paid_at = input.paid_at;
        self.updated_at = now;
    }
}
