//! Appointment records.

use chrono::{DateTime, Utc};
use common::{AppointmentId, ClientId};
use serde::{Deserialize, Serialize};

use crate::service::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentInput {
    pub client_id: ClientId,
    pub patient_cin: String,
    pub scheduled_at: DateTime<Utc>,
    pub subject: String,
    pub location: String,
    /// Reference of the service (soin) the appointment is booked for.
    pub service_ref: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub client_id: ClientId,
    pub patient_cin: String,
    pub scheduled_at: DateTime<Utc>,
    pub subject: String,
    pub location: String,
    pub service_ref: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Appointment {
    type Id = AppointmentId;
    type Input = AppointmentInput;

    const KIND: &'static str = "appointment";

    fn id(&self) -> AppointmentId {
        self.id
    }

    fn generate_id() -> AppointmentId {
        AppointmentId::new()
    }

    fn from_input(id: AppointmentId, input: AppointmentInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            client_id: input.client_id,
            patient_cin: input.patient_cin,
            scheduled_at: input.scheduled_at,
            subject: input.subject,
            location: input.location,
            service_ref: input.service_ref,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_input(&mut self, input: AppointmentInput, now: DateTime<Utc>) {
        self.client_id = input.client_id;
        self.patient_cin = input.patient_cin;
        self.scheduled_at = input.scheduled_at;
        self.subject = input.subject;
        self.location = input.location;
        self.service_ref = input.service_ref;
        self.notes = input.notes;
        self.updated_at = now;
    }
}
