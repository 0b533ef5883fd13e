//! Report service.

use chrono::Utc;
use ecowatch_common::{AppError, AppResult, Coordinates, get_metrics};
use ecowatch_db::entities::report::{self, ReportType};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use super::feed::FeedFilter;
use super::similarity::{ReportGroup, count_similar, group_for_feed};
use crate::generate_id;
use crate::store::{
    ActionStatus, AssessmentStoreService, ReportAggregate, ReportQuery, ReportStoreService,
};

/// Place name used when the reporter gives none.
pub const DEFAULT_LOCATION_NAME: &str = "Unknown location";

/// Input for submitting a report.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportInput {
    #[validate(required, length(min = 1, max = 2048))]
    pub image_url: Option<String>,
    #[validate(required, length(min = 1, max = 512))]
    pub label: Option<String>,
    /// Inferred from the label when absent.
    #[serde(default, rename = "type")]
    pub report_type: Option<ReportType>,
    #[validate(required, range(min = 1, max = 5))]
    pub severity: Option<i32>,
    #[validate(required)]
    pub location: Option<Coordinates>,
    #[validate(length(max = 256))]
    pub location_name: Option<String>,
    pub notify_authority: Option<bool>,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
}

/// A freshly stored report and how many similar ones already existed.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedReport {
    pub report: ReportAggregate,
    pub similar_reports_count: u64,
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// Report service for business logic.
#[derive(Clone)]
pub struct ReportService {
    reports: ReportStoreService,
    assessments: AssessmentStoreService,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub fn new(reports: ReportStoreService, assessments: AssessmentStoreService) -> Self {
        Self {
            reports,
            assessments,
        }
    }

    /// Store a new report and count its near-duplicates.
    pub async fn create(&self, input: CreateReportInput) -> AppResult<CreatedReport> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let image_url = required(input.image_url, "imageUrl")?;
        let label = required(input.label, "label")?;
        let severity = input
            .severity
            .ok_or_else(|| AppError::Validation("severity is required".to_string()))?;
        let location = input
            .location
            .ok_or_else(|| AppError::Validation("location is required".to_string()))?;
        if !location.is_valid() {
            return Err(AppError::Validation(format!(
                "location ({}, {}) is out of range",
                location.lat, location.lng
            )));
        }

        let report_type = input
            .report_type
            .unwrap_or_else(|| ReportType::infer_from_label(&label));
        let location_name = input
            .location_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCATION_NAME.to_string());

        let model = report::Model {
            id: generate_id(),
            image_url,
            label,
            description: input.description.filter(|d| !d.trim().is_empty()),
            report_type,
            severity,
            latitude: location.lat,
            longitude: location.lng,
            location_name,
            notify_authority: input.notify_authority.unwrap_or(false),
            upvotes: 0,
            engagement_count: 0,
            verified_by: None,
            action_acted: None,
            action_status: None,
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let report = self
            .reports
            .insert(model)
            .await
            .inspect_err(|_| get_metrics().record_store_error())?;

        // The count is advisory; a failed count must not fail the submission.
        let similar_reports_count = match count_similar(self.reports.as_ref(), &report).await {
            Ok(n) => n,
            Err(e) => {
                warn!(report_id = %report.id, error = %e, "Failed to count similar reports");
                0
            }
        };

        get_metrics().record_report_created();
        info!(
            report_id = %report.id,
            report_type = %report.report_type,
            severity = report.severity,
            similar = similar_reports_count,
            "Report created"
        );

        Ok(CreatedReport {
            report: ReportAggregate::new(report),
            similar_reports_count,
        })
    }

    /// Get a report by ID.
    pub async fn get(&self, id: &str) -> AppResult<ReportAggregate> {
        self.reports
            .find(id)
            .await?
            .ok_or_else(|| AppError::ReportNotFound(id.to_string()))
    }

    /// Reports newest first.
    pub async fn list(&self, query: &ReportQuery) -> AppResult<Vec<ReportAggregate>> {
        self.reports.list(query).await
    }

    /// Filtered reports, with near-duplicates merged into one entry.
    pub async fn feed(&self, filter: &FeedFilter) -> AppResult<Vec<ReportGroup>> {
        let mut reports: Vec<ReportAggregate> = self
            .reports
            .list(&ReportQuery::default())
            .await?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();

        if filter.filters_community_severity() {
            let mut kept = Vec::with_capacity(reports.len());
            for report in reports {
                let consensus = self
                    .assessments
                    .load(report.id())
                    .await?
                    .filter(|a| !a.scores().is_empty())
                    .map(|a| a.consensus_label());
                if filter.matches_consensus(consensus) {
                    kept.push(report);
                }
            }
            reports = kept;
        }

        Ok(group_for_feed(reports))
    }

    /// Plain confirmation without a photo.
    pub async fn upvote(&self, id: &str) -> AppResult<ReportAggregate> {
        let report = self
            .reports
            .increment_upvotes(id)
            .await
            .inspect_err(|_| get_metrics().record_store_error())?
            .ok_or_else(|| AppError::ReportNotFound(id.to_string()))?;

        get_metrics().record_upvote();
        Ok(report)
    }

    /// Record the authority's outcome for a report.
    pub async fn set_action_status(
        &self,
        id: &str,
        status: ActionStatus,
    ) -> AppResult<ReportAggregate> {
        if status.status.trim().is_empty() {
            return Err(AppError::Validation("status is required".to_string()));
        }

        let acted = status.acted;
        let report = self
            .reports
            .set_action_status(id, status)
            .await?
            .ok_or_else(|| AppError::ReportNotFound(id.to_string()))?;

        info!(report_id = %id, acted, "Action status updated");
        Ok(report)
    }

    /// Administrative delete.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.reports.delete(id).await? {
            return Err(AppError::ReportNotFound(id.to_string()));
        }

        get_metrics().record_report_deleted();
        info!(report_id = %id, "Report deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{AssessmentStore, MemoryStore, ReportStore, fixtures};
    use ecowatch_common::{Severity, SeverityLabel};
    use std::sync::Arc;

    fn input(label: &str, lat: f64, lng: f64) -> CreateReportInput {
        CreateReportInput {
            image_url: Some("https://img.example/1.jpg".to_string()),
            label: Some(label.to_string()),
            severity: Some(3),
            location: Some(Coordinates::new(lat, lng)),
            ..Default::default()
        }
    }

    fn service() -> (ReportService, MemoryStore) {
        let store = MemoryStore::new();
        (
            ReportService::new(Arc::new(store.clone()), Arc::new(store.clone())),
            store,
        )
    }

    #[tokio::test]
    async fn test_create_applies_defaults_and_infers_type() {
        let (service, _) = service();
        let created = service
            .create(input("Trash bags by the road", 10.0, 20.0))
            .await
            .unwrap();

        let report = &created.report.report;
        assert_eq!(report.report_type, ReportType::Dumping);
        assert_eq!(report.location_name, DEFAULT_LOCATION_NAME);
        assert!(!report.notify_authority);
        assert_eq!(report.upvotes, 0);
        assert!(created.report.verifications.is_empty());
        assert_eq!(created.similar_reports_count, 0);
    }

    #[tokio::test]
    async fn test_explicit_type_is_kept() {
        let (service, _) = service();
        let mut input = input("River full of trash", 0.0, 0.0);
        input.report_type = Some(ReportType::WaterPollution);

        let created = service.create(input).await.unwrap();
        assert_eq!(created.report.report.report_type, ReportType::WaterPollution);
    }

    #[tokio::test]
    async fn test_create_counts_similar_reports() {
        let (service, _) = service();
        service.create(input("Dumped waste", 1.0, 1.0)).await.unwrap();
        service.create(input("More waste", 1.009, 0.991)).await.unwrap();
        service.create(input("Far waste", 1.02, 1.0)).await.unwrap();
        service.create(input("Smoke", 1.0, 1.0)).await.unwrap();

        let created = service.create(input("Waste again", 1.0, 1.0)).await.unwrap();
        assert_eq!(created.similar_reports_count, 2);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields() {
        let (service, store) = service();

        let mut no_image = input("Waste", 0.0, 0.0);
        no_image.image_url = None;
        let mut blank_label = input("Waste", 0.0, 0.0);
        blank_label.label = Some("   ".to_string());
        let mut no_location = input("Waste", 0.0, 0.0);
        no_location.location = None;
        let mut bad_severity = input("Waste", 0.0, 0.0);
        bad_severity.severity = Some(6);
        let out_of_range = input("Waste", 91.0, 0.0);

        for bad in [no_image, blank_label, no_location, bad_severity, out_of_range] {
            assert!(matches!(
                service.create(bad).await,
                Err(AppError::Validation(_))
            ));
        }
        assert!(store.list(&ReportQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upvote() {
        let (service, store) = service();
        store
            .insert(fixtures::report("r1", ReportType::Other, 0.0, 0.0))
            .await
            .unwrap();

        service.upvote("r1").await.unwrap();
        let report = service.upvote("r1").await.unwrap();
        assert_eq!(report.report.upvotes, 2);
        assert!(report.verifications.is_empty());

        assert!(matches!(
            service.upvote("missing").await,
            Err(AppError::ReportNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_upvotes_are_not_lost() {
        let (service, store) = service();
        store
            .insert(fixtures::report("r1", ReportType::Other, 0.0, 0.0))
            .await
            .unwrap();

        let (a, b) = tokio::join!(service.upvote("r1"), service.upvote("r1"));
        a.unwrap();
        b.unwrap();

        let report = service.get("r1").await.unwrap();
        assert_eq!(report.report.upvotes, 2);
    }

    #[tokio::test]
    async fn test_feed_filters_by_consensus() {
        let (service, store) = service();
        for (id, lat) in [("hot", 0.0), ("mild", 1.0), ("quiet", 2.0)] {
            store
                .insert(fixtures::report(id, ReportType::Dumping, lat, lat))
                .await
                .unwrap();
        }
        let five = Severity::new(5).unwrap();
        let one = Severity::new(1).unwrap();
        AssessmentStore::record(&store, "hot", "alice", five).await.unwrap();
        AssessmentStore::record(&store, "hot", "bob", five).await.unwrap();
        AssessmentStore::record(&store, "mild", "alice", one).await.unwrap();

        let filter = FeedFilter {
            community_severities: vec![SeverityLabel::Critical],
            ..Default::default()
        };
        let groups = service.feed(&filter).await.unwrap();
        let ids: Vec<&str> = groups.iter().map(|g| g.seed().id()).collect();
        assert_eq!(ids, ["hot"]);

        // "quiet" has no assessments, so no label can match it.
        let filter = FeedFilter {
            community_severities: vec![SeverityLabel::Moderate, SeverityLabel::Minor],
            ..Default::default()
        };
        let groups = service.feed(&filter).await.unwrap();
        let ids: Vec<&str> = groups.iter().map(|g| g.seed().id()).collect();
        assert_eq!(ids, ["mild"]);
    }

    #[tokio::test]
    async fn test_feed_groups_filtered_reports() {
        let (service, store) = service();
        for (id, lat) in [("a", 0.0), ("b", 0.005), ("c", 0.02)] {
            let mut report = fixtures::report(id, ReportType::Dumping, lat, lat);
            report.upvotes = 1;
            store.insert(report).await.unwrap();
        }
        store
            .insert(fixtures::report("d", ReportType::AirPollution, 0.0, 0.0))
            .await
            .unwrap();

        let filter = FeedFilter {
            types: vec![ReportType::Dumping],
            ..Default::default()
        };
        let groups = service.feed(&filter).await.unwrap();
        let sizes: Vec<usize> = groups.iter().map(ReportGroup::len).collect();
        let mut sorted = sizes.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, [1, 2]);
        assert_eq!(groups.iter().map(ReportGroup::total_upvotes).sum::<i64>(), 3);
    }

    #[tokio::test]
    async fn test_action_status_and_delete() {
        let (service, store) = service();
        store
            .insert(fixtures::report("r1", ReportType::Other, 0.0, 0.0))
            .await
            .unwrap();

        let report = service
            .set_action_status(
                "r1",
                ActionStatus {
                    acted: true,
                    status: "Cleared by council".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(report.is_acted());

        service.delete("r1").await.unwrap();
        assert!(matches!(
            service.get("r1").await,
            Err(AppError::ReportNotFound(_))
        ));
        assert!(service.delete("r1").await.is_err());
    }
}
