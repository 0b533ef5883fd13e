//! Metrics endpoints for monitoring and observability.
//!
//! Provides endpoints for:
//! - JSON and Prometheus metrics export
//! - Liveness and readiness checks

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use ecowatch_common::metrics::{MetricsSnapshot, get_metrics};
use ecowatch_core::ReportQuery;
use serde::Serialize;

use crate::middleware::AppState;

/// Create the metrics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_metrics_json))
        .route("/prometheus", get(get_metrics_prometheus))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
}

/// JSON metrics response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub http: HttpMetrics,
    pub workflow: WorkflowMetrics,
    pub store: StoreMetrics,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpMetrics {
    pub requests_total: u64,
    pub requests_active: u64,
    pub requests_2xx: u64,
    pub requests_4xx: u64,
    pub requests_5xx: u64,
    pub latency_avg_us: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetrics {
    pub reports_created: u64,
    pub reports_deleted: u64,
    pub upvotes: u64,
    pub verifications_committed: u64,
    pub verifications_failed: u64,
    pub proximity_rejections: u64,
    pub assessments: u64,
    pub comments: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetrics {
    pub errors_total: u64,
}

impl From<MetricsSnapshot> for MetricsResponse {
    fn from(s: MetricsSnapshot) -> Self {
        Self {
            http: HttpMetrics {
                requests_total: s.http_requests_total,
                requests_active: s.http_requests_active,
                requests_2xx: s.http_requests_2xx,
                requests_4xx: s.http_requests_4xx,
                requests_5xx: s.http_requests_5xx,
                latency_avg_us: s.http_request_latency_avg_us,
            },
            workflow: WorkflowMetrics {
                reports_created: s.reports_created,
                reports_deleted: s.reports_deleted,
                upvotes: s.upvotes_recorded,
                verifications_committed: s.verifications_committed,
                verifications_failed: s.verifications_failed,
                proximity_rejections: s.proximity_rejections,
                assessments: s.assessments_recorded,
                comments: s.comments_created,
            },
            store: StoreMetrics {
                errors_total: s.store_errors_total,
            },
        }
    }
}

/// Get metrics in JSON format.
async fn get_metrics_json() -> Json<MetricsResponse> {
    Json(MetricsResponse::from(get_metrics().snapshot()))
}

/// Get metrics in Prometheus text format.
async fn get_metrics_prometheus() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        get_metrics().to_prometheus(),
    )
        .into_response()
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    pub ready: bool,
    pub store: String,
    pub latency_ms: Option<u64>,
}

/// Readiness probe: one cheap read against the store.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let start = std::time::Instant::now();
    let probe = ReportQuery {
        limit: Some(1),
        ..Default::default()
    };

    match state.report_service.list(&probe).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                store: "ok".to_string(),
                latency_ms: Some(start.elapsed().as_millis() as u64),
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                store: format!("error: {e}"),
                latency_ms: None,
            }),
        ),
    }
}
