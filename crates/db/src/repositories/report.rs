//! Report repository.

use std::sync::Arc;

use crate::entities::{Report, ReportVerification, report, report_verification};
use chrono::{DateTime, Utc};
use ecowatch_common::{AppError, AppResult, BoundingBox};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, TransactionTrait, sea_query::Expr,
};

/// Row filter shared by listing and counting.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub report_type: Option<report::ReportType>,
    /// Only reports created at or after this instant.
    pub since: Option<DateTime<Utc>>,
    pub bounds: Option<BoundingBox>,
    pub limit: Option<u64>,
}

impl ReportFilter {
    fn apply(&self, mut query: Select<Report>) -> Select<Report> {
        if let Some(report_type) = self.report_type {
            query = query.filter(report::Column::ReportType.eq(report_type));
        }
        if let Some(since) = self.since {
            query = query.filter(report::Column::CreatedAt.gte(since));
        }
        if let Some(bounds) = self.bounds {
            query = query
                .filter(report::Column::Latitude.between(bounds.min_lat, bounds.max_lat))
                .filter(report::Column::Longitude.between(bounds.min_lng, bounds.max_lng));
        }
        query
    }
}

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new report.
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reports matching `filter`, newest first.
    pub async fn find_filtered(&self, filter: &ReportFilter) -> AppResult<Vec<report::Model>> {
        let mut query = filter
            .apply(Report::find())
            .order_by_desc(report::Column::CreatedAt)
            .order_by_desc(report::Column::Id);

        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reports matching `filter`, optionally leaving one out.
    pub async fn count_filtered(
        &self,
        filter: &ReportFilter,
        exclude_id: Option<&str>,
    ) -> AppResult<u64> {
        let mut query = filter.apply(Report::find());
        if let Some(id) = exclude_id {
            query = query.filter(report::Column::Id.ne(id));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment upvotes atomically. Returns false when the report does not exist.
    pub async fn increment_upvotes(&self, id: &str) -> AppResult<bool> {
        let result = Report::update_many()
            .col_expr(
                report::Column::Upvotes,
                Expr::col(report::Column::Upvotes).add(1),
            )
            .col_expr(report::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(report::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Record a verification: bump upvotes, append the row and claim
    /// `verified_by` if still empty, all in one transaction.
    ///
    /// Returns false (and writes nothing) when the report does not exist.
    pub async fn record_verification(
        &self,
        verification: report_verification::Model,
    ) -> AppResult<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let bumped = Report::update_many()
            .col_expr(
                report::Column::Upvotes,
                Expr::col(report::Column::Upvotes).add(1),
            )
            .col_expr(report::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(report::Column::Id.eq(verification.report_id.as_str()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if bumped.rows_affected == 0 {
            // Dropping the transaction rolls it back.
            return Ok(false);
        }

        let report_id = verification.report_id.clone();
        let verified_by = verification.verified_by.clone();

        report_verification::ActiveModel {
            id: Set(verification.id),
            report_id: Set(verification.report_id),
            description: Set(verification.description),
            photo_url: Set(verification.photo_url),
            verified_by: Set(verification.verified_by),
            created_at: Set(verification.created_at),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Report::update_many()
            .col_expr(report::Column::VerifiedBy, Expr::value(verified_by))
            .filter(report::Column::Id.eq(report_id))
            .filter(report::Column::VerifiedBy.is_null())
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(true)
    }

    /// Set the authority action status. Returns false when the report does not exist.
    pub async fn set_action_status(&self, id: &str, acted: bool, status: &str) -> AppResult<bool> {
        let result = Report::update_many()
            .col_expr(report::Column::ActionActed, Expr::value(acted))
            .col_expr(report::Column::ActionStatus, Expr::value(status))
            .col_expr(report::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(report::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Delete a report. Dependent rows go with it via `ON DELETE CASCADE`.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Report::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Verifications of one report, oldest first.
    pub async fn find_verifications(
        &self,
        report_id: &str,
    ) -> AppResult<Vec<report_verification::Model>> {
        ReportVerification::find()
            .filter(report_verification::Column::ReportId.eq(report_id))
            .order_by_asc(report_verification::Column::CreatedAt)
            .order_by_asc(report_verification::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Verifications of several reports at once, oldest first.
    pub async fn find_verifications_for(
        &self,
        report_ids: &[String],
    ) -> AppResult<Vec<report_verification::Model>> {
        if report_ids.is_empty() {
            return Ok(Vec::new());
        }

        ReportVerification::find()
            .filter(report_verification::Column::ReportId.is_in(report_ids.iter().cloned()))
            .order_by_asc(report_verification::Column::CreatedAt)
            .order_by_asc(report_verification::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::report::ReportType;
    use ecowatch_common::Coordinates;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_report(id: &str, report_type: ReportType, lat: f64, lng: f64) -> report::Model {
        report::Model {
            id: id.to_string(),
            image_url: "https://img.example/1.jpg".to_string(),
            label: "Plastic waste".to_string(),
            description: None,
            report_type,
            severity: 3,
            latitude: lat,
            longitude: lng,
            location_name: "Riverside".to_string(),
            notify_authority: false,
            upvotes: 0,
            engagement_count: 0,
            verified_by: None,
            action_acted: None,
            action_status: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_verification(id: &str, report_id: &str) -> report_verification::Model {
        report_verification::Model {
            id: id.to_string(),
            report_id: report_id.to_string(),
            description: "Verified in person".to_string(),
            photo_url: "http://localhost/files/v.jpg".to_string(),
            verified_by: "alice".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let report = create_test_report("r1", ReportType::Dumping, 1.0, 2.0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report.clone()]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let found = repo.find_by_id("r1").await.unwrap().unwrap();

        assert_eq!(found.id, "r1");
        assert_eq!(found.report_type, ReportType::Dumping);
    }

    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<report::Model>::new()])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_filtered() {
        let r1 = create_test_report("r2", ReportType::Dumping, 1.0, 2.0);
        let r2 = create_test_report("r1", ReportType::Dumping, 1.001, 2.001);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r1, r2]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let filter = ReportFilter {
            report_type: Some(ReportType::Dumping),
            bounds: Some(BoundingBox::around(Coordinates::new(1.0, 2.0), 0.01)),
            limit: Some(10),
            ..Default::default()
        };
        let result = repo.find_filtered(&filter).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "r2");
    }

    #[tokio::test]
    async fn test_count_filtered() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(4))
                }]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let count = repo
            .count_filtered(&ReportFilter::default(), Some("r1"))
            .await
            .unwrap();

        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_increment_upvotes_missing_report() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        assert!(!repo.increment_upvotes("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_record_verification() {
        let verification = create_test_verification("v1", "r1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .append_query_results([[verification.clone()]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        assert!(repo.record_verification(verification).await.unwrap());
    }

    #[tokio::test]
    async fn test_record_verification_missing_report() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let recorded = repo
            .record_verification(create_test_verification("v1", "missing"))
            .await
            .unwrap();

        assert!(!recorded);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        assert!(repo.delete("r1").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_verifications_for_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = ReportRepository::new(db);
        assert!(repo.find_verifications_for(&[]).await.unwrap().is_empty());
    }
}
