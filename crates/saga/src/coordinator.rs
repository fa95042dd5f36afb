//! Creation saga coordinator.

use chrono::Utc;
use common::{DraftId, FieldErrors};
use draft_store::{ClientMode, Draft, DraftStore, FormData, Stage};
use ledger::{InventoryLedger, LedgerStore};
use resources::{
    AppointmentInput, Client, InvoiceInput, InvoiceStatus, PaymentDetails, ResourceError,
    ResourceServices,
};

use crate::error::{AdvanceError, Result, SagaError};
use crate::stages::{steps_through, validate_through};
use crate::workflow::{self, WorkflowRecord};

/// Drives drafts through client → appointment → products → invoice → payment.
///
/// Every stage first looks at the draft: a resource whose id is already
/// recorded is reused, never created again. Each newly captured id is saved
/// to the draft store before the next stage starts.
pub struct CreationSaga<D, L>
where
    D: DraftStore,
    L: LedgerStore,
{
    drafts: D,
    resources: ResourceServices,
    ledger: InventoryLedger<L>,
}

impl<D, L> CreationSaga<D, L>
where
    D: DraftStore,
    L: LedgerStore,
{
    /// Creates a new saga coordinator.
    pub fn new(drafts: D, resources: ResourceServices, ledger: InventoryLedger<L>) -> Self {
        Self {
            drafts,
            resources,
            ledger,
        }
    }

    pub fn drafts(&self) -> &D {
        &self.drafts
    }

    pub fn ledger(&self) -> &InventoryLedger<L> {
        &self.ledger
    }

    pub fn resources(&self) -> &ResourceServices {
        &self.resources
    }

    /// Persists the saga up through `target`.
    ///
    /// "Next" and "save and quit" both call this; only `target` differs.
    /// On failure the returned error carries the draft as last saved, which
    /// sits at its last successfully persisted stage.
    #[tracing::instrument(skip(self, draft, form), fields(draft_id, target = %target))]
    pub async fn advance(
        &self,
        draft: Option<Draft>,
        target: Stage,
        form: FormData,
    ) -> std::result::Result<Draft, AdvanceError> {
        metrics::counter!("saga_advance_total").increment(1);
        let started = std::time::Instant::now();

        if target.is_terminal() {
            return Err(AdvanceError::new(draft, SagaError::InvalidTarget(target)));
        }

        let mut last_saved = draft.clone();
        let mut draft = draft.unwrap_or_else(|| Draft::new(form.clone()));
        tracing::Span::current().record("draft_id", tracing::field::display(draft.id));

        if draft.is_completed() {
            let err = SagaError::DraftCompleted(draft.id);
            return Err(AdvanceError::new(Some(draft), err));
        }

        // Nothing below this point runs unless the whole input is acceptable.
        let checked =
            validate_through(target, &form).and_then(|()| check_client_lock(&draft, &form));
        if let Err(err) = checked {
            return Err(AdvanceError::new(last_saved, err));
        }
        draft.form_data = form;

        for step in steps_through(target) {
            let stage = step.stage;
            if let Err(err) = self.persist_stage(&mut draft, stage).await {
                metrics::counter!("saga_stage_failed_total", "stage" => stage.as_str())
                    .increment(1);
                tracing::warn!(draft_id = %draft.id, %stage, error = %err, "saga stage failed");
                return Err(AdvanceError::new(last_saved, err));
            }

            let reached = if stage == Stage::Payment {
                Stage::Completed
            } else {
                stage
            };
            draft.mark_persisted(reached);
            if let Err(err) = self.drafts.save(&draft).await {
                return Err(AdvanceError::new(last_saved, err.into()));
            }
            last_saved = Some(draft.clone());

            metrics::counter!("saga_stage_persisted_total", "stage" => stage.as_str())
                .increment(1);
            tracing::info!(draft_id = %draft.id, %stage, "saga stage persisted");
        }

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("saga_advance_duration_seconds").record(duration);
        if draft.is_completed() {
            metrics::counter!("saga_completed").increment(1);
            tracing::info!(draft_id = %draft.id, duration, "saga completed");
        }

        Ok(draft)
    }

    /// Loads a saved draft and advances it.
    pub async fn resume(
        &self,
        draft_id: DraftId,
        target: Stage,
        form: FormData,
    ) -> std::result::Result<Draft, AdvanceError> {
        let draft = self.load_draft(draft_id).await?;
        self.advance(Some(draft), target, form).await
    }

    pub async fn load_draft(&self, draft_id: DraftId) -> Result<Draft> {
        self.drafts
            .load(draft_id)
            .await?
            .ok_or(SagaError::DraftNotFound(draft_id))
    }

    /// Drafts that have not completed, most recently touched first.
    pub async fn pending_drafts(&self) -> Result<Vec<Draft>> {
        Ok(self.drafts.list_pending().await?)
    }

    /// Drops a draft. Resources it created stay in place.
    #[tracing::instrument(skip(self))]
    pub async fn discard(&self, draft_id: DraftId) -> Result<()> {
        self.drafts.delete(draft_id).await.map_err(|err| match err {
            draft_store::DraftStoreError::NotFound(id) => SagaError::DraftNotFound(id),
            other => SagaError::DraftStore(other),
        })
    }

    /// Completed visits joined from appointments, invoices and clients.
    pub async fn workflow_records(
        &self,
    ) -> std::result::Result<Vec<WorkflowRecord>, ResourceError> {
        workflow::workflow_records(&self.resources).await
    }

    /// Runs the creator for one stage, reusing anything already on the draft.
    async fn persist_stage(&self, draft: &mut Draft, stage: Stage) -> Result<()> {
        let creation_failed = |source| SagaError::ResourceCreationFailure { stage, source };

        match stage {
            Stage::Client => {
                if draft.client_id.is_some() {
                    return Ok(());
                }
                let form = &draft.form_data.client;
                let client_id = match (form.mode, form.existing_client_id) {
                    (ClientMode::Existing, Some(id)) => {
                        self.resources
                            .clients
                            .get_by_id(id)
                            .await
                            .map_err(creation_failed)?
                            .ok_or(SagaError::ClientNotFound(id))?
                            .id
                    }
                    _ => {
                        self.resources
                            .clients
                            .create(form.to_input())
                            .await
                            .map_err(creation_failed)?
                            .id
                    }
                };
                draft.client_id = Some(client_id);
            }
            Stage::Appointment => {
                if draft.appointment_id.is_some() {
                    return Ok(());
                }
                let client = self.draft_client(draft, stage).await?;
                let form = &draft.form_data.appointment;
                let input = AppointmentInput {
                    client_id: client.id,
                    patient_cin: client.cin,
                    scheduled_at: form.scheduled_at.unwrap_or_else(Utc::now),
                    subject: form.subject.trim().to_string(),
                    location: form.location.trim().to_string(),
                    service_ref: form.service_ref.trim().to_string(),
                    notes: form.notes.clone(),
                };
                let appointment = self
                    .resources
                    .appointments
                    .create(input)
                    .await
                    .map_err(creation_failed)?;
                draft.appointment_id = Some(appointment.id);
            }
            // Line items live in the form data until the invoice is created.
            Stage::Products => {}
            Stage::Invoice => {
                if draft.invoice_id.is_some() {
                    return Ok(());
                }
                let input = self.invoice_input(draft, stage, None).await?;
                let invoice = self
                    .resources
                    .invoices
                    .create(input)
                    .await
                    .map_err(creation_failed)?;
                draft.invoice_id = Some(invoice.id);
            }
            Stage::Payment => {
                let form = &draft.form_data.payment;
                // Validated before the loop; re-checked so a missing method never pays.
                let Some(method) = form.method else {
                    let mut errors = FieldErrors::new();
                    errors.push("payment.method", "is required");
                    return Err(SagaError::Validation { stage, errors });
                };
                let details = PaymentDetails {
                    method,
                    cheque: form.cheque.clone(),
                    paid_at: Utc::now(),
                };
                let input = self.invoice_input(draft, stage, Some(details)).await?;

                // Payment details attach to the draft's invoice; a second
                // invoice is never created here.
                let invoice = match draft.invoice_id {
                    Some(id) => self.resources.invoices.update(id, input).await,
                    None => self.resources.invoices.create(input).await,
                }
                .map_err(creation_failed)?;
                draft.invoice_id = Some(invoice.id);

                let settled = self
                    .ledger
                    .materialize_from_paid_invoice(&invoice)
                    .await
                    .map_err(SagaError::Settlement)?;
                tracing::info!(
                    invoice_id = %invoice.id,
                    payment_id = %settled.payment.id,
                    movements = settled.movements.len(),
                    "invoice settled"
                );
            }
            Stage::Completed => return Err(SagaError::InvalidTarget(stage)),
        }
        Ok(())
    }

    /// Resolves the draft's client record, whether it was created or reused.
    async fn draft_client(&self, draft: &Draft, stage: Stage) -> Result<Client> {
        let Some(client_id) = draft.client_id else {
            let mut errors = FieldErrors::new();
            errors.push("client", "must be persisted first");
            return Err(SagaError::Validation { stage, errors });
        };
        self.resources
            .clients
            .get_by_id(client_id)
            .await
            .map_err(|source| SagaError::ResourceCreationFailure { stage, source })?
            .ok_or(SagaError::ClientNotFound(client_id))
    }

    async fn invoice_input(
        &self,
        draft: &Draft,
        stage: Stage,
        payment: Option<PaymentDetails>,
    ) -> Result<InvoiceInput> {
        let client = self.draft_client(draft, stage).await?;
        let form = &draft.form_data;
        Ok(InvoiceInput {
            client_id: client.id,
            patient_cin: client.cin,
            appointment_id: draft.appointment_id,
            date: form
                .invoice
                .date
                .unwrap_or_else(|| Utc::now().date_naive()),
            items: form
                .items
                .iter()
                .filter(|item| !item.is_empty())
                .cloned()
                .collect(),
            status: if payment.is_some() {
                InvoiceStatus::Paid
            } else {
                InvoiceStatus::Unpaid
            },
            payment,
        })
    }
}

/// Rejects a form that would re-point an already persisted client stage.
///
/// Once a client is bound, switching between new and existing mode, or
/// selecting a different existing client, is refused rather than reconciled.
fn check_client_lock(draft: &Draft, form: &FormData) -> Result<()> {
    let Some(client_id) = draft.client_id else {
        return Ok(());
    };
    let requested = &form.client;
    let mode_changed = requested.mode != draft.form_data.client.mode;
    let other_client = requested.mode == ClientMode::Existing
        && requested.existing_client_id != Some(client_id);

    if mode_changed || other_client {
        return Err(SagaError::ClientModeLocked {
            draft_id: draft.id,
            client_id,
        });
    }
    Ok(())
}
