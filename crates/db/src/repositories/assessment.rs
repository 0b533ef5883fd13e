//! Severity assessment repository.

use std::sync::Arc;

use crate::entities::{Report, SeverityAssessment, report, severity_assessment};
use chrono::Utc;
use ecowatch_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};

/// Severity assessment repository for database operations.
#[derive(Clone)]
pub struct AssessmentRepository {
    db: Arc<DatabaseConnection>,
}

impl AssessmentRepository {
    /// Create a new assessment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All live assessments of a report, oldest first.
    pub async fn find_by_report(
        &self,
        report_id: &str,
    ) -> AppResult<Vec<severity_assessment::Model>> {
        SeverityAssessment::find()
            .filter(severity_assessment::Column::ReportId.eq(report_id))
            .order_by_asc(severity_assessment::Column::CreatedAt)
            .order_by_asc(severity_assessment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert or replace a submitter's score and bump the report's
    /// engagement count, in one transaction.
    ///
    /// Returns false (and writes nothing) when the report does not exist.
    pub async fn upsert(&self, assessment: severity_assessment::Model) -> AppResult<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let bumped = Report::update_many()
            .col_expr(
                report::Column::EngagementCount,
                Expr::col(report::Column::EngagementCount).add(1),
            )
            .col_expr(report::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(report::Column::Id.eq(assessment.report_id.as_str()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if bumped.rows_affected == 0 {
            return Ok(false);
        }

        let model = severity_assessment::ActiveModel {
            id: Set(assessment.id),
            report_id: Set(assessment.report_id),
            submitter_id: Set(assessment.submitter_id),
            severity: Set(assessment.severity),
            created_at: Set(assessment.created_at),
            updated_at: Set(assessment.updated_at),
        };

        SeverityAssessment::insert(model)
            .on_conflict(
                OnConflict::columns([
                    severity_assessment::Column::ReportId,
                    severity_assessment::Column::SubmitterId,
                ])
                .update_columns([
                    severity_assessment::Column::Severity,
                    severity_assessment::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(true)
    }
}
