//! Store contracts the core runs against.
//!
//! The services never touch a database directly. They go through
//! [`ReportStore`], [`CommentStore`] and [`AssessmentStore`], which have a
//! Postgres implementation ([`SqlStore`]) and an in-process one
//! ([`MemoryStore`]).

mod memory;
mod sql;

pub use memory::MemoryStore;
pub use sql::SqlStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ecowatch_common::{AppResult, BoundingBox, Coordinates, Severity, SeverityLabel};
use ecowatch_db::{
    entities::{comment, report, report::ReportType, report_verification},
    repositories::ReportFilter,
};
use serde::{Deserialize, Serialize};

use crate::services::consensus::CommunityAssessment;

/// A report together with its verification history, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportAggregate {
    pub report: report::Model,
    pub verifications: Vec<report_verification::Model>,
}

impl ReportAggregate {
    #[must_use]
    pub const fn new(report: report::Model) -> Self {
        Self {
            report,
            verifications: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.report.id
    }

    #[must_use]
    pub const fn location(&self) -> Coordinates {
        Coordinates::new(self.report.latitude, self.report.longitude)
    }

    /// Reporter-assigned severity.
    ///
    /// Rows are range-checked on insert, so an out-of-range value can only come
    /// from outside edits; it is clamped rather than rejected.
    #[must_use]
    pub fn severity(&self) -> Severity {
        Severity::new(self.report.severity.clamp(1, 5)).unwrap_or(Severity::MIN)
    }

    #[must_use]
    pub fn severity_label(&self) -> SeverityLabel {
        self.severity().label()
    }

    /// Whether the authority integration marked this report as acted on.
    #[must_use]
    pub fn is_acted(&self) -> bool {
        self.report.action_acted.unwrap_or(false)
    }

    #[must_use]
    pub fn action_status(&self) -> Option<ActionStatus> {
        match (self.report.action_acted, &self.report.action_status) {
            (Some(acted), Some(status)) => Some(ActionStatus {
                acted,
                status: status.clone(),
            }),
            _ => None,
        }
    }
}

/// A verification about to be appended to a report.
#[derive(Debug, Clone)]
pub struct NewVerification {
    pub id: String,
    pub description: String,
    pub photo_url: String,
    pub verified_by: String,
    pub created_at: DateTime<Utc>,
}

impl NewVerification {
    pub(crate) fn into_model(self, report_id: &str) -> report_verification::Model {
        report_verification::Model {
            id: self.id,
            report_id: report_id.to_string(),
            description: self.description,
            photo_url: self.photo_url,
            verified_by: self.verified_by,
            created_at: self.created_at.into(),
        }
    }
}

/// Outcome recorded by the authority integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStatus {
    pub acted: bool,
    pub status: String,
}

/// Which reports to list or count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    #[serde(default, rename = "type")]
    pub report_type: Option<ReportType>,
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    /// Inclusive on every edge.
    #[serde(default)]
    pub bounds: Option<BoundingBox>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl ReportQuery {
    pub(crate) fn matches(&self, report: &report::Model) -> bool {
        if self.report_type.is_some_and(|t| t != report.report_type) {
            return false;
        }
        if self.since.is_some_and(|since| report.created_at < since) {
            return false;
        }
        self.bounds
            .is_none_or(|bounds| bounds.contains(Coordinates::new(report.latitude, report.longitude)))
    }
}

impl From<&ReportQuery> for ReportFilter {
    fn from(query: &ReportQuery) -> Self {
        Self {
            report_type: query.report_type,
            since: query.since,
            bounds: query.bounds,
            limit: query.limit,
        }
    }
}

/// Persistence of reports and their verification history.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert(&self, report: report::Model) -> AppResult<report::Model>;

    async fn find(&self, id: &str) -> AppResult<Option<ReportAggregate>>;

    /// Matching reports, newest first (ties broken by id, descending).
    async fn list(&self, query: &ReportQuery) -> AppResult<Vec<ReportAggregate>>;

    async fn count(&self, query: &ReportQuery, exclude_id: Option<&str>) -> AppResult<u64>;

    /// Add one upvote atomically. `None` when the report does not exist.
    async fn increment_upvotes(&self, id: &str) -> AppResult<Option<ReportAggregate>>;

    /// Append a verification, add one upvote and claim `verified_by` if it is
    /// still unset, as a single unit. `None` when the report does not exist, in
    /// which case nothing is written.
    async fn append_verification(
        &self,
        id: &str,
        verification: NewVerification,
    ) -> AppResult<Option<ReportAggregate>>;

    async fn set_action_status(
        &self,
        id: &str,
        status: ActionStatus,
    ) -> AppResult<Option<ReportAggregate>>;

    /// Remove a report and everything attached to it.
    async fn delete(&self, id: &str) -> AppResult<bool>;
}

/// Persistence of comments.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert(&self, comment: comment::Model) -> AppResult<comment::Model>;

    /// Newest first, optionally restricted to one report.
    async fn list(&self, report_id: Option<&str>) -> AppResult<Vec<comment::Model>>;
}

/// Persistence of community severity assessments.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Replace `submitter`'s score and add one engagement, atomically.
    /// `None` when the report does not exist.
    async fn record(
        &self,
        report_id: &str,
        submitter: &str,
        severity: Severity,
    ) -> AppResult<Option<CommunityAssessment>>;

    async fn load(&self, report_id: &str) -> AppResult<Option<CommunityAssessment>>;
}

pub type ReportStoreService = Arc<dyn ReportStore>;
pub type CommentStoreService = Arc<dyn CommentStore>;
pub type AssessmentStoreService = Arc<dyn AssessmentStore>;
