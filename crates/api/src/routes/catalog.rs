//! Minimal product and client listing for local runs.
//!
//! Full CRUD for these records belongs to the resource services; only what
//! the saga and ledger screens need to pick from is exposed here.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use draft_store::DraftStore;
use ledger::LedgerStore;
use resources::{Client, Product, ProductInput, ResourceService};

use super::AppState;
use crate::error::ApiError;

/// GET /products
#[tracing::instrument(skip(state))]
pub async fn products<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.resources().products.list().await?))
}

/// POST /products — register a catalogue entry. Stock starts at zero.
#[tracing::instrument(skip(state, req))]
pub async fn create_product<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
    Json(req): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Product name is required".to_string()));
    }
    let product = state.resources().products.create(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /clients — candidates for the existing-client mode.
#[tracing::instrument(skip(state))]
pub async fn clients<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
) -> Result<Json<Vec<Client>>, ApiError> {
    Ok(Json(state.resources().clients.list().await?))
}
