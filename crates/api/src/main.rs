//! API server entry point.

use api::config::Config;
use draft_store::{DraftStore, InMemoryDraftStore, PostgresDraftStore};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Builds the app over the given draft store and serves it until shutdown.
async fn serve<D: DraftStore + 'static>(
    config: Config,
    drafts: D,
    metrics_handle: PrometheusHandle,
) {
    let (state, _resources) = api::create_default_state(drafts);

    if let Some(every) = config.sweep_interval() {
        tracing::info!(?every, "starting materialization sweep");
        api::spawn_materialize_sweep(state.clone(), every);
    }

    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick the draft store and serve
    match config.database_url.clone() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&url)
                .await
                .expect("failed to connect to PostgreSQL");
            let drafts = PostgresDraftStore::new(pool);
            drafts
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("drafts stored in PostgreSQL");
            serve(config, drafts, metrics_handle).await;
        }
        None => {
            tracing::info!("drafts stored in memory");
            serve(config, InMemoryDraftStore::new(), metrics_handle).await;
        }
    }

    tracing::info!("server shut down gracefully");
}
