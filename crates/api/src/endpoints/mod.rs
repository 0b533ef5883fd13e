//! API endpoints.

mod admin;
mod comments;
mod metrics;
mod reports;

use axum::{Router, middleware};

use crate::middleware::{AppState, metrics_middleware};

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/reports", reports::router())
        .nest("/comments", comments::router())
        .nest("/admin", admin::router())
        .nest("/metrics", metrics::router())
        .layer(middleware::from_fn(metrics_middleware))
}
