//! Inventory ledger endpoints: manual movements, stock and materialization.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{InvoiceId, MovementId, ProductId};
use draft_store::DraftStore;
use ledger::{
    InventoryMovement, LedgerOutcome, LedgerStore, MaterializeOutcome, MovementUpdate,
    NewMovement, StockLevel,
};
use serde::{Deserialize, Serialize};

use super::{AppState, parse_id};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<ProductId>,
}

#[derive(Serialize)]
pub struct ProductStockResponse {
    pub product_id: ProductId,
    pub quantity: i64,
    pub negative: bool,
    /// Σ IN − Σ OUT over the product's movements.
    pub recomputed: i64,
    pub consistent: bool,
}

/// GET /movements — all movements, optionally for one product.
#[tracing::instrument(skip(state, filter))]
pub async fn list<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
    Query(filter): Query<MovementFilter>,
) -> Result<Json<Vec<InventoryMovement>>, ApiError> {
    Ok(Json(state.ledger().movements(filter.product_id).await?))
}

/// POST /movements — record a manual IN or OUT movement.
#[tracing::instrument(skip(state, req))]
pub async fn create<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
    Json(req): Json<NewMovement>,
) -> Result<(StatusCode, Json<LedgerOutcome>), ApiError> {
    let outcome = state.ledger().create_movement(req).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// PUT /movements/{id} — edit a manual movement.
#[tracing::instrument(skip(state, req))]
pub async fn update<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
    Path(id): Path<String>,
    Json(req): Json<MovementUpdate>,
) -> Result<Json<LedgerOutcome>, ApiError> {
    let movement_id: MovementId = parse_id("movement", &id)?;
    Ok(Json(state.ledger().update_movement(movement_id, req).await?))
}

/// DELETE /movements/{id} — remove a manual movement and reverse its effect.
#[tracing::instrument(skip(state))]
pub async fn delete<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
    Path(id): Path<String>,
) -> Result<Json<LedgerOutcome>, ApiError> {
    let movement_id: MovementId = parse_id("movement", &id)?;
    Ok(Json(state.ledger().delete_movement(movement_id).await?))
}

/// GET /stock — current stock of every product with movements.
#[tracing::instrument(skip(state))]
pub async fn levels<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
) -> Result<Json<Vec<StockLevel>>, ApiError> {
    Ok(Json(state.ledger().stock_levels().await?))
}

/// GET /stock/{product_id} — maintained stock checked against a recount.
#[tracing::instrument(skip(state))]
pub async fn product_stock<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductStockResponse>, ApiError> {
    let product_id: ProductId = parse_id("product", &product_id)?;
    let ledger = state.ledger();
    let quantity = ledger.stock(product_id).await?;
    let recomputed = ledger.recompute_stock(product_id).await?;

    Ok(Json(ProductStockResponse {
        product_id,
        quantity,
        negative: quantity < 0,
        recomputed,
        consistent: quantity == recomputed,
    }))
}

/// POST /invoices/{id}/materialize — settle one paid invoice.
#[tracing::instrument(skip(state))]
pub async fn materialize_invoice<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
    Path(id): Path<String>,
) -> Result<Json<MaterializeOutcome>, ApiError> {
    let invoice_id: InvoiceId = parse_id("invoice", &id)?;
    Ok(Json(state.ledger().materialize_invoice(invoice_id).await?))
}

/// POST /ledger/materialize — settle every paid invoice without a payment.
#[tracing::instrument(skip(state))]
pub async fn materialize_pending<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
) -> Result<Json<Vec<MaterializeOutcome>>, ApiError> {
    Ok(Json(state.ledger().materialize_pending().await?))
}
