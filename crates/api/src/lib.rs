//! HTTP API layer for ecowatch.
//!
//! - **Endpoints**: report submission, verification, consensus, comments,
//!   administration and metrics, all under one router
//! - **Extractors**: caller identity and the admin bearer token
//! - **Middleware**: application state and request metrics
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
