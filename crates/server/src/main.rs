//! Ecowatch server entry point.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use ecowatch_api::{AppState, router as api_router};
use ecowatch_common::Config;
use ecowatch_core::{LocalStorage, SqlStore};
use ecowatch_db::repositories::{AssessmentRepository, CommentRepository, ReportRepository};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on a single request, uploads included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecowatch=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting ecowatch server...");

    let config = Config::load()?;

    let db = Arc::new(ecowatch_db::connect(&config.database).await?);
    info!("Connected to database");

    ecowatch_db::migrate(&db).await?;

    let store = SqlStore::new(
        ReportRepository::new(db.clone()),
        CommentRepository::new(db.clone()),
        AssessmentRepository::new(db),
    );
    let storage = LocalStorage::new(&config.storage.path, config.storage_base_url());
    let state = AppState::new(store, Arc::new(storage), config.admin.token.clone());
    if state.admin_token.is_none() {
        info!("No admin token configured; administrative endpoints are disabled");
    }

    let app = Router::new()
        .nest("/api", api_router())
        .with_state(state)
        .nest_service("/files", ServeDir::new(&config.storage.path))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = config.bind_address();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
