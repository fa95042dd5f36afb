//! Accumulated saga input.
//!
//! [`FormData`] is a superset snapshot across all stages: later stages read
//! earlier stages' fields, e.g. the invoice needs the client CIN.

use chrono::{DateTime, NaiveDate, Utc};
use common::ClientId;
use resources::{ChequeDetails, ClientInput, LineItem, PaymentMethod};
use serde::{Deserialize, Serialize};

/// Whether the client stage creates a new client or reuses an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClientMode {
    #[default]
    New,
    Existing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientForm {
    pub mode: ClientMode,
    /// Selected client when `mode` is `Existing`.
    pub existing_client_id: Option<ClientId>,
    pub cin: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl ClientForm {
    pub fn to_input(&self) -> ClientInput {
        ClientInput {
            cin: self.cin.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.clone(),
            address: self.address.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentForm {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub subject: String,
    pub location: String,
    pub service_ref: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceForm {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentForm {
    pub method: Option<PaymentMethod>,
    pub cheque: Option<ChequeDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormData {
    pub client: ClientForm,
    pub appointment: AppointmentForm,
    pub items: Vec<LineItem>,
    pub invoice: InvoiceForm,
    pub payment: PaymentForm,
}
