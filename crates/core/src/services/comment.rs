//! Comment service.

use chrono::Utc;
use ecowatch_common::{AppError, AppResult, get_metrics};
use ecowatch_db::entities::comment;
use serde::Deserialize;
use tracing::debug;
use validator::Validate;

use crate::generate_id;
use crate::store::{CommentStoreService, ReportStoreService};

/// Name stored when the commenter gives none.
pub const ANONYMOUS: &str = "Anonymous";

/// Input for adding a comment.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    #[validate(required)]
    pub report_id: Option<String>,
    #[validate(required, length(min = 1, max = 2000))]
    pub text: Option<String>,
    #[validate(length(max = 100))]
    pub user_name: Option<String>,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    reports: ReportStoreService,
    comments: CommentStoreService,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(reports: ReportStoreService, comments: CommentStoreService) -> Self {
        Self { reports, comments }
    }

    /// Add a comment to an existing report.
    pub async fn create(&self, input: CreateCommentInput) -> AppResult<comment::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let report_id = input
            .report_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::Validation("reportId is required".to_string()))?;
        let text = input
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Validation("text is required".to_string()))?;

        if self.reports.find(&report_id).await?.is_none() {
            return Err(AppError::ReportNotFound(report_id));
        }

        let user_name = input
            .user_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| ANONYMOUS.to_string());

        let comment = self
            .comments
            .insert(comment::Model {
                id: generate_id(),
                report_id,
                text,
                user_name,
                created_at: Utc::now().into(),
            })
            .await?;

        get_metrics().record_comment();
        debug!(comment_id = %comment.id, report_id = %comment.report_id, "Comment created");
        Ok(comment)
    }

    /// Comments newest first, optionally for one report.
    pub async fn list(&self, report_id: Option<&str>) -> AppResult<Vec<comment::Model>> {
        self.comments.list(report_id).await
    }
}
