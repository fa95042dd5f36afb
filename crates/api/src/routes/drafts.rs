//! Creation saga endpoints: advance, resume, list and discard drafts.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::DraftId;
use draft_store::{Draft, DraftStore, FormData, Stage};
use ledger::LedgerStore;
use saga::WorkflowRecord;
use serde::Deserialize;

use super::{AppState, parse_id};
use crate::error::ApiError;

// -- Request types --

/// Body of `POST /drafts/advance`.
///
/// "Next" sends the following screen's stage as `target`; "save and quit"
/// sends the current screen's stage.
#[derive(Deserialize)]
pub struct AdvanceRequest {
    /// Omitted on the first save of a new saga.
    pub draft_id: Option<DraftId>,
    pub target: Stage,
    #[serde(default)]
    pub form: FormData,
}

// -- Handlers --

/// POST /drafts/advance — persist the saga up through `target`.
#[tracing::instrument(skip(state, req), fields(target = %req.target))]
pub async fn advance<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
    Json(req): Json<AdvanceRequest>,
) -> Result<Json<Draft>, ApiError> {
    let draft = match req.draft_id {
        Some(id) => Some(state.saga.load_draft(id).await?),
        None => None,
    };
    let draft = state.saga.advance(draft, req.target, req.form).await?;
    Ok(Json(draft))
}

/// GET /drafts — drafts not yet completed, most recent first.
#[tracing::instrument(skip(state))]
pub async fn list<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
) -> Result<Json<Vec<Draft>>, ApiError> {
    Ok(Json(state.saga.pending_drafts().await?))
}

/// GET /drafts/{id} — load a draft, completed or not.
#[tracing::instrument(skip(state))]
pub async fn get<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
    Path(id): Path<String>,
) -> Result<Json<Draft>, ApiError> {
    let draft_id: DraftId = parse_id("draft", &id)?;
    Ok(Json(state.saga.load_draft(draft_id).await?))
}

/// DELETE /drafts/{id} — discard a draft without touching its resources.
#[tracing::instrument(skip(state))]
pub async fn discard<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let draft_id: DraftId = parse_id("draft", &id)?;
    state.saga.discard(draft_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /workflows — appointment, invoice and client joined per visit.
#[tracing::instrument(skip(state))]
pub async fn workflows<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
) -> Result<Json<Vec<WorkflowRecord>>, ApiError> {
    Ok(Json(state.saga.workflow_records().await?))
}
