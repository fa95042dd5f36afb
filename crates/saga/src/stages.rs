//! The ordered stage table.
//!
//! Each pipeline stage maps to one validator. The coordinator folds over
//! this table instead of branching on stage names at every call site.

use common::{FieldErrors, Money};
use draft_store::{ClientMode, FormData, Stage};
use resources::PaymentMethod;

use crate::error::SagaError;

type Validator = fn(&FormData) -> Result<(), FieldErrors>;

/// One row of the stage table.
#[derive(Clone, Copy)]
pub struct StageStep {
    pub stage: Stage,
    pub validate: Validator,
}

/// Pipeline stages in execution order.
pub static STAGES: [StageStep; 5] = [
    StageStep {
        stage: Stage::Client,
        validate: validate_client,
    },
    StageStep {
        stage: Stage::Appointment,
        validate: validate_appointment,
    },
    StageStep {
        stage: Stage::Products,
        validate: validate_products,
    },
    StageStep {
        stage: Stage::Invoice,
        validate: validate_invoice,
    },
    StageStep {
        stage: Stage::Payment,
        validate: validate_payment,
    },
];

/// Steps from `client` up to and including `target`.
pub fn steps_through(target: Stage) -> impl Iterator<Item = &'static StageStep> {
    STAGES.iter().filter(move |step| step.stage <= target)
}

/// Checks every stage's rules up to `target`, reporting the first failing stage.
pub fn validate_through(target: Stage, form: &FormData) -> Result<(), SagaError> {
    for step in steps_through(target) {
        (step.validate)(form).map_err(|errors| SagaError::Validation {
            stage: step.stage,
            errors,
        })?;
    }
    Ok(())
}

fn validate_client(form: &FormData) -> Result<(), FieldErrors> {
    let client = &form.client;
    let mut errors = FieldErrors::new();
    match client.mode {
        ClientMode::Existing => {
            if client.existing_client_id.is_none() {
                errors.push("client.existing_client_id", "is required");
            }
        }
        ClientMode::New => {
            errors.require("client.cin", &client.cin);
            errors.require("client.first_name", &client.first_name);
            errors.require("client.last_name", &client.last_name);
            errors.require("client.phone", &client.phone);
        }
    }
    errors.into_result()
}

fn validate_appointment(form: &FormData) -> Result<(), FieldErrors> {
    let appointment = &form.appointment;
    let mut errors = FieldErrors::new();
    if appointment.scheduled_at.is_none() {
        errors.push("appointment.scheduled_at", "is required");
    }
    errors.require("appointment.subject", &appointment.subject);
    errors.require("appointment.location", &appointment.location);
    errors.require("appointment.service_ref", &appointment.service_ref);
    errors.into_result()
}

fn validate_products(form: &FormData) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if !form.items.iter().any(|item| !item.is_empty()) {
        errors.push("items", "at least one line item is required");
    }
    let totals: Option<Vec<Money>> = form
        .items
        .iter()
        .map(|item| item.unit_price.checked_multiply(item.quantity))
        .collect();
    let in_range = totals
        .and_then(|totals| {
            totals
                .iter()
                .try_fold(0i64, |acc, total| acc.checked_add(total.cents()))
        })
        .is_some();
    if !in_range {
        errors.push("items", "invoice total is out of range");
    }
    errors.into_result()
}

fn validate_invoice(form: &FormData) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if form.invoice.date.is_none() {
        errors.push("invoice.date", "is required");
    }
    errors.into_result()
}

fn validate_payment(form: &FormData) -> Result<(), FieldErrors> {
    let payment = &form.payment;
    let mut errors = FieldErrors::new();
    match payment.method {
        None => errors.push("payment.method", "is required"),
        Some(PaymentMethod::Cheque) => match &payment.cheque {
            None => errors.push("payment.cheque", "is required for cheque payments"),
            Some(cheque) => {
                errors.require("payment.cheque.number", &cheque.number);
                errors.require("payment.cheque.bank", &cheque.bank);
                errors.require("payment.cheque.holder", &cheque.holder);
            }
        },
        Some(_) => {}
    }
    errors.into_result()
}
