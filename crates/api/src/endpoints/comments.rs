//! Comment endpoints.

use axum::{Json, Router, extract::State, routing::post};
use ecowatch_common::AppResult;
use ecowatch_core::CreateCommentInput;
use ecowatch_db::entities::comment;
use serde::{Deserialize, Serialize};

use crate::{middleware::AppState, response::ApiResponse};

/// Comment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub report_id: String,
    pub text: String,
    pub user_name: String,
    pub timestamp: String,
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            report_id: c.report_id,
            text: c.text,
            user_name: c.user_name,
            timestamp: c.created_at.to_rfc3339(),
        }
    }
}

/// List comments request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsRequest {
    #[serde(default)]
    pub report_id: Option<String>,
}

/// Add a comment.
async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.create(input).await?;
    Ok(ApiResponse::created(comment.into()))
}

/// List comments newest first.
async fn list(
    State(state): State<AppState>,
    Json(req): Json<ListCommentsRequest>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state
        .comment_service
        .list(req.report_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(comments.into_iter().map(Into::into).collect()))
}

/// Create the comments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/list", post(list))
}
