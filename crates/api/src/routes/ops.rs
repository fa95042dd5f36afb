//! Operational endpoints: liveness and Prometheus scrape.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use draft_store::DraftStore;
use ledger::LedgerStore;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Drafts awaiting completion; absent when the draft store is unreachable.
    pub pending_drafts: Option<usize>,
}

/// GET /health — reports whether the draft store answers.
pub async fn check<D: DraftStore + 'static, L: LedgerStore + 'static>(
    State(state): State<Arc<AppState<D, L>>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.saga.pending_drafts().await {
        Ok(drafts) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                pending_drafts: Some(drafts.len()),
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "health check: draft store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    pending_drafts: None,
                }),
            )
        }
    }
}

/// GET /metrics — returns Prometheus-formatted metrics.
pub async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}
