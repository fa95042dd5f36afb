//! HTTP API server for the clinic creation saga and inventory ledger.
//!
//! Provides REST endpoints for advancing and resuming drafts and for
//! recording inventory movements, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post, put};
use draft_store::DraftStore;
use ledger::{InMemoryLedgerStore, InventoryLedger, LedgerStore};
use metrics_exporter_prometheus::PrometheusHandle;
use resources::InMemoryResources;
use saga::CreationSaga;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<D, L>(state: Arc<AppState<D, L>>, metrics_handle: PrometheusHandle) -> Router
where
    D: DraftStore + 'static,
    L: LedgerStore + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::check::<D, L>))
        .route("/drafts", get(routes::drafts::list::<D, L>))
        .route("/drafts/advance", post(routes::drafts::advance::<D, L>))
        .route(
            "/drafts/{id}",
            get(routes::drafts::get::<D, L>).delete(routes::drafts::discard::<D, L>),
        )
        .route("/workflows", get(routes::drafts::workflows::<D, L>))
        .route(
            "/movements",
            get(routes::inventory::list::<D, L>).post(routes::inventory::create::<D, L>),
        )
        .route(
            "/movements/{id}",
            put(routes::inventory::update::<D, L>).delete(routes::inventory::delete::<D, L>),
        )
        .route("/stock", get(routes::inventory::levels::<D, L>))
        .route(
            "/stock/{product_id}",
            get(routes::inventory::product_stock::<D, L>),
        )
        .route(
            "/invoices/{id}/materialize",
            post(routes::inventory::materialize_invoice::<D, L>),
        )
        .route(
            "/ledger/materialize",
            post(routes::inventory::materialize_pending::<D, L>),
        )
        .route(
            "/products",
            get(routes::catalog::products::<D, L>).post(routes::catalog::create_product::<D, L>),
        )
        .route("/clients", get(routes::catalog::clients::<D, L>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over in-memory resources and ledger storage.
///
/// The resource handles are returned so callers can seed records or inject
/// failures.
pub fn create_default_state<D: DraftStore + 'static>(
    drafts: D,
) -> (Arc<AppState<D, InMemoryLedgerStore>>, InMemoryResources) {
    let resources = InMemoryResources::new();
    let services = resources.services();
    let ledger = InventoryLedger::new(InMemoryLedgerStore::new(), &services);
    let saga = CreationSaga::new(drafts, services, ledger);

    (Arc::new(AppState { saga }), resources)
}

/// Periodically materializes paid invoices that have no payment yet.
pub fn spawn_materialize_sweep<D, L>(
    state: Arc<AppState<D, L>>,
    every: Duration,
) -> tokio::task::JoinHandle<()>
where
    D: DraftStore + 'static,
    L: LedgerStore + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match state.ledger().materialize_pending().await {
                Ok(outcomes) if !outcomes.is_empty() => {
                    tracing::info!(invoices = outcomes.len(), "materialize sweep settled invoices");
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(error = %err, "materialize sweep failed"),
            }
        }
    })
}
