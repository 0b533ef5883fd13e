//! Administrative endpoints.
//!
//! Guarded by the configured admin bearer token.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::post,
};
use ecowatch_common::AppResult;
use ecowatch_core::ActionStatus;
use serde::Deserialize;

use super::reports::{ReportIdRequest, ReportResponse};
use crate::{
    extractors::AdminAuth,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Set action status request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStatusRequest {
    pub report_id: String,
    pub acted: bool,
    pub status: String,
}

/// Record the authority's outcome for a report.
async fn set_action_status(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<ActionStatusRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state
        .report_service
        .set_action_status(
            &req.report_id,
            ActionStatus {
                acted: req.acted,
                status: req.status,
            },
        )
        .await?;
    Ok(ApiResponse::ok(report.into()))
}

/// Delete a report and everything attached to it.
async fn delete_report(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<ReportIdRequest>,
) -> AppResult<impl IntoResponse> {
    state.report_service.delete(&req.report_id).await?;
    Ok(no_content())
}

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/action-status", post(set_action_status))
        .route("/reports/delete", post(delete_report))
}
