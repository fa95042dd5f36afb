//! Client (patient) records.

use chrono::{DateTime, Utc};
use common::ClientId;
use serde::{Deserialize, Serialize};

use crate::service::Resource;

/// Caller-supplied client fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInput {
    /// National identity card number; the patient identifier used to join records.
    pub cin: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub cin: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Resource for Client {
    type Id = ClientId;
    type Input = ClientInput;

    const KIND: &'static str = "client";

    fn id(&self) -> ClientId {
        self.id
    }

    fn generate_id() -> ClientId {
        ClientId::new()
    }

    fn from_input(id: ClientId, input: ClientInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            cin: input.cin,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            email: input.email,
            address: input.address,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_input(&mut self, input: ClientInput, now: DateTime<Utc>) {
        self.cin = input.cin;
        self.first_name = input.first_name;
        self.last_name = input.last_name;
        self.phone = input.phone;
        self.email = input.email;
        self.address = input.address;
        self.updated_at = now;
    }
}
