//! Postgres-backed store over the sea-orm repositories.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use ecowatch_common::{AppResult, Severity};
use ecowatch_db::{
    entities::{comment, report, severity_assessment},
    repositories::{AssessmentRepository, CommentRepository, ReportFilter, ReportRepository},
};
use sea_orm::Set;

use super::{
    ActionStatus, AssessmentStore, CommentStore, NewVerification, ReportAggregate, ReportQuery,
    ReportStore,
};
use crate::{generate_id, services::consensus::CommunityAssessment};

/// Store backed by Postgres.
#[derive(Clone)]
pub struct SqlStore {
    report_repo: ReportRepository,
    comment_repo: CommentRepository,
    assessment_repo: AssessmentRepository,
}

impl SqlStore {
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        comment_repo: CommentRepository,
        assessment_repo: AssessmentRepository,
    ) -> Self {
        Self {
            report_repo,
            comment_repo,
            assessment_repo,
        }
    }

    async fn aggregate(&self, report: report::Model) -> AppResult<ReportAggregate> {
        let verifications = self.report_repo.find_verifications(&report.id).await?;
        Ok(ReportAggregate {
            report,
            verifications,
        })
    }

    async fn find_aggregate(&self, id: &str) -> AppResult<Option<ReportAggregate>> {
        match self.report_repo.find_by_id(id).await? {
            Some(report) => Ok(Some(self.aggregate(report).await?)),
            None => Ok(None),
        }
    }

    async fn assessment_for(&self, report: &report::Model) -> AppResult<CommunityAssessment> {
        let scores: BTreeMap<String, Severity> = self
            .assessment_repo
            .find_by_report(&report.id)
            .await?
            .into_iter()
            .filter_map(|row| {
                Severity::new(row.severity)
                    .ok()
                    .map(|severity| (row.submitter_id, severity))
            })
            .collect();

        Ok(CommunityAssessment::from_parts(
            &report.id,
            report.severity,
            scores,
            report.engagement_count,
        ))
    }
}

#[async_trait]
impl ReportStore for SqlStore {
    async fn insert(&self, report: report::Model) -> AppResult<report::Model> {
        let model = report::ActiveModel {
            id: Set(report.id),
            image_url: Set(report.image_url),
            label: Set(report.label),
            description: Set(report.description),
            report_type: Set(report.report_type),
            severity: Set(report.severity),
            latitude: Set(report.latitude),
            longitude: Set(report.longitude),
            location_name: Set(report.location_name),
            notify_authority: Set(report.notify_authority),
            upvotes: Set(report.upvotes),
            engagement_count: Set(report.engagement_count),
            verified_by: Set(report.verified_by),
            action_acted: Set(report.action_acted),
            action_status: Set(report.action_status),
            created_at: Set(report.created_at),
            updated_at: Set(report.updated_at),
        };
        self.report_repo.create(model).await
    }

    async fn find(&self, id: &str) -> AppResult<Option<ReportAggregate>> {
        self.find_aggregate(id).await
    }

    async fn list(&self, query: &ReportQuery) -> AppResult<Vec<ReportAggregate>> {
        let reports = self
            .report_repo
            .find_filtered(&ReportFilter::from(query))
            .await?;

        let ids: Vec<String> = reports.iter().map(|r| r.id.clone()).collect();
        let mut by_report: HashMap<String, Vec<_>> = HashMap::new();
        for verification in self.report_repo.find_verifications_for(&ids).await? {
            by_report
                .entry(verification.report_id.clone())
                .or_default()
                .push(verification);
        }

        Ok(reports
            .into_iter()
            .map(|report| {
                let verifications = by_report.remove(&report.id).unwrap_or_default();
                ReportAggregate {
                    report,
                    verifications,
                }
            })
            .collect())
    }

    async fn count(&self, query: &ReportQuery, exclude_id: Option<&str>) -> AppResult<u64> {
        self.report_repo
            .count_filtered(&ReportFilter::from(query), exclude_id)
            .await
    }

    async fn increment_upvotes(&self, id: &str) -> AppResult<Option<ReportAggregate>> {
        if !self.report_repo.increment_upvotes(id).await? {
            return Ok(None);
        }
        self.find_aggregate(id).await
    }

    async fn append_verification(
        &self,
        id: &str,
        verification: NewVerification,
    ) -> AppResult<Option<ReportAggregate>> {
        if !self
            .report_repo
            .record_verification(verification.into_model(id))
            .await?
        {
            return Ok(None);
        }
        self.find_aggregate(id).await
    }

    async fn set_action_status(
        &self,
        id: &str,
        status: ActionStatus,
    ) -> AppResult<Option<ReportAggregate>> {
        if !self
            .report_repo
            .set_action_status(id, status.acted, &status.status)
            .await?
        {
            return Ok(None);
        }
        self.find_aggregate(id).await
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        self.report_repo.delete(id).await
    }
}

#[async_trait]
impl CommentStore for SqlStore {
    async fn insert(&self, comment: comment::Model) -> AppResult<comment::Model> {
        let model = comment::ActiveModel {
            id: Set(comment.id),
            report_id: Set(comment.report_id),
            text: Set(comment.text),
            user_name: Set(comment.user_name),
            created_at: Set(comment.created_at),
        };
        self.comment_repo.create(model).await
    }

    async fn list(&self, report_id: Option<&str>) -> AppResult<Vec<comment::Model>> {
        self.comment_repo.find_recent(report_id).await
    }
}

#[async_trait]
impl AssessmentStore for SqlStore {
    async fn record(
        &self,
        report_id: &str,
        submitter: &str,
        severity: Severity,
    ) -> AppResult<Option<CommunityAssessment>> {
        let now = chrono::Utc::now();
        let row = severity_assessment::Model {
            id: generate_id(),
            report_id: report_id.to_string(),
            submitter_id: submitter.to_string(),
            severity: i32::from(severity),
            created_at: now.into(),
            updated_at: now.into(),
        };

        if !self.assessment_repo.upsert(row).await? {
            return Ok(None);
        }
        self.load(report_id).await
    }

    async fn load(&self, report_id: &str) -> AppResult<Option<CommunityAssessment>> {
        match self.report_repo.find_by_id(report_id).await? {
            Some(report) => Ok(Some(self.assessment_for(&report).await?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::fixtures;
    use chrono::Utc;
    use ecowatch_db::entities::{report::ReportType, report_verification};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn store(db: DatabaseConnection) -> SqlStore {
        let db = Arc::new(db);
        SqlStore::new(
            ReportRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            AssessmentRepository::new(db),
        )
    }

    fn verification_row(id: &str, report_id: &str) -> report_verification::Model {
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
    async fn test_find_loads_verifications() {
        let report = fixtures::report("r1", ReportType::Dumping, 1.0, 1.0);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[report]])
            .append_query_results([[verification_row("v1", "r1"), verification_row("v2", "r1")]])
            .into_connection();

        let found = store(db).find("r1").await.unwrap().unwrap();
        assert_eq!(found.id(), "r1");
        assert_eq!(found.verifications.len(), 2);
    }

    #[tokio::test]
    async fn test_list_attaches_verifications_per_report() {
        let r1 = fixtures::report("r2", ReportType::Dumping, 1.0, 1.0);
        let r2 = fixtures::report("r1", ReportType::Dumping, 1.0, 1.0);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[r1, r2]])
            .append_query_results([[verification_row("v1", "r1")]])
            .into_connection();

        let listed = ReportStore::list(&store(db), &ReportQuery::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].verifications.is_empty());
        assert_eq!(listed[1].verifications.len(), 1);
    }

    #[tokio::test]
    async fn test_increment_upvotes_missing_report() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        assert!(store(db).increment_upvotes("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_without_assessments_falls_back() {
        let report = fixtures::report("r1", ReportType::Other, 0.0, 0.0);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[report]])
            .append_query_results([Vec::<severity_assessment::Model>::new()])
            .into_connection();

        let assessment = store(db).load("r1").await.unwrap().unwrap();
        assert!(assessment.mean().is_none());
        assert_eq!(assessment.engagement_count(), 0);
    }
}
