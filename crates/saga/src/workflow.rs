//! Read-only join of the records a completed saga leaves behind.

use resources::{Appointment, Client, Invoice, ResourceError, ResourceServices};
use serde::Serialize;

/// One settled visit: the appointment, its paid invoice and the patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowRecord {
    pub client: Client,
    pub appointment: Appointment,
    pub invoice: Invoice,
}

/// Joins paid invoices to their client and appointment, newest invoice first.
///
/// Unpaid invoices belong to sagas still in progress and are left out. The
/// client is the one the invoice was billed to. The appointment is the one
/// the invoice points at, falling back to the patient's first appointment.
/// Invoices missing either side are skipped.
pub fn join_records(
    clients: &[Client],
    appointments: &[Appointment],
    invoices: &[Invoice],
) -> Vec<WorkflowRecord> {
    let mut records: Vec<WorkflowRecord> = invoices
        .iter()
        .filter(|invoice| invoice.is_paid())
        .filter_map(|invoice| {
            let client = clients.iter().find(|c| c.id == invoice.client_id)?;
            let appointment = invoice
                .appointment_id
                .and_then(|id| appointments.iter().find(|a| a.id == id))
                .or_else(|| {
                    appointments
                        .iter()
                        .find(|a| a.patient_cin == invoice.patient_cin)
                })?;
            Some(WorkflowRecord {
                client: client.clone(),
                appointment: appointment.clone(),
                invoice: invoice.clone(),
            })
        })
        .collect();

    records.sort_by(|a, b| {
        b.invoice
            .date
            .cmp(&a.invoice.date)
            .then_with(|| b.invoice.created_at.cmp(&a.invoice.created_at))
    });
    records
}

/// Loads every client, appointment and invoice and joins them.
pub async fn workflow_records(
    services: &ResourceServices,
) -> Result<Vec<WorkflowRecord>, ResourceError> {
    let clients = services.clients.list().await?;
    let appointments = services.appointments.list().await?;
    let invoices = services.invoices.list().await?;
    Ok(join_records(&clients, &appointments, &invoices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use common::{AppointmentId, ClientId, InvoiceId};
    use resources::InvoiceStatus;

    fn client(cin: &str) -> Client {
        let now = Utc::now();
        Client {
            id: ClientId::new(),
            cin: cin.to_string(),
            first_name: "Amina".to_string(),
            last_name: "Berrada".to_string(),
            phone: "0600000000".to_string(),
            email: None,
            address: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn appointment(client: &Client) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: AppointmentId::new(),
            client_id: client.id,
            patient_cin: client.cin.clone(),
            scheduled_at: Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap(),
            subject: "Check-up".to_string(),
            location: "Room 1".to_string(),
            service_ref: "SOIN-01".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn invoice(client: &Client, appointment: Option<&Appointment>, day: u32) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: InvoiceId::new(),
            client_id: client.id,
            patient_cin: client.cin.clone(),
            appointment_id: appointment.map(|a| a.id),
            date: NaiveDate::from_ymd_opt(2026, 5, day).unwrap(),
            items: Vec::new(),
            status: InvoiceStatus::Paid,
            payment: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_joins_by_cin_newest_first() {
        let amina = client("AB1");
        let youssef = client("CD2");
        let a1 = appointment(&amina);
        let a2 = appointment(&youssef);
        let older = invoice(&amina, Some(&a1), 2);
        let newer = invoice(&youssef, Some(&a2), 9);

        let records = join_records(
            &[amina.clone(), youssef.clone()],
            &[a1.clone(), a2.clone()],
            &[older.clone(), newer.clone()],
        );

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].invoice.id, newer.id);
        assert_eq!(records[0].client.id, youssef.id);
        assert_eq!(records[1].appointment.id, a1.id);
    }

    #[test]
    fn test_prefers_linked_appointment() {
        let amina = client("AB1");
        let first = appointment(&amina);
        let linked = appointment(&amina);
        let inv = invoice(&amina, Some(&linked), 3);

        let records = join_records(&[amina], &[first, linked.clone()], &[inv]);
        assert_eq!(records[0].appointment.id, linked.id);
    }

    #[test]
    fn test_falls_back_to_patient_appointment() {
        let amina = client("AB1");
        let a1 = appointment(&amina);
        let inv = invoice(&amina, None, 3);

        let records = join_records(&[amina], &[a1.clone()], &[inv]);
        assert_eq!(records[0].appointment.id, a1.id);
    }

    #[test]
    fn test_skips_incomplete_joins() {
        let amina = client("AB1");
        let stranger = client("ZZ9");
        let inv = invoice(&amina, None, 3);
        let orphan = invoice(&stranger, None, 4);

        let records = join_records(&[amina.clone()], &[appointment(&amina)], &[inv, orphan]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].client.cin, "AB1");
    }

    #[test]
    fn test_unpaid_invoices_are_in_progress() {
        let amina = client("AB1");
        let a1 = appointment(&amina);
        let paid = invoice(&amina, Some(&a1), 3);
        let mut unpaid = invoice(&amina, Some(&a1), 5);
        unpaid.status = InvoiceStatus::Unpaid;

        let records = join_records(&[amina], &[a1], &[paid.clone(), unpaid]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].invoice.id, paid.id);
    }

    #[test]
    fn test_client_is_the_billed_one_when_cins_collide() {
        let first = client("AB1");
        let billed = client("AB1");
        let a1 = appointment(&billed);
        let inv = invoice(&billed, Some(&a1), 3);

        let records = join_records(&[first, billed.clone()], &[a1], &[inv]);
        assert_eq!(records[0].client.id, billed.id);
    }
}
