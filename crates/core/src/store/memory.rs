//! In-process store.
//!
//! All state sits behind one `RwLock`, so every write is a single critical
//! section and concurrent verifications of the same report serialize.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use ecowatch_common::{AppError, AppResult, Severity};
use ecowatch_db::entities::{comment, report};
use tokio::sync::RwLock;

use super::{
    ActionStatus, AssessmentStore, CommentStore, NewVerification, ReportAggregate, ReportQuery,
    ReportStore,
};
use crate::services::consensus::CommunityAssessment;

#[derive(Default)]
struct State {
    reports: HashMap<String, ReportAggregate>,
    comments: Vec<comment::Model>,
    assessments: HashMap<String, BTreeMap<String, Severity>>,
}

impl State {
    fn assessment(&self, report: &report::Model) -> CommunityAssessment {
        let scores = self
            .assessments
            .get(&report.id)
            .cloned()
            .unwrap_or_default();
        CommunityAssessment::from_parts(
            &report.id,
            report.severity,
            scores,
            report.engagement_count,
        )
    }
}

/// Store keeping everything in memory. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(a: &ReportAggregate, b: &ReportAggregate) -> std::cmp::Ordering {
    b.report
        .created_at
        .cmp(&a.report.created_at)
        .then_with(|| b.report.id.cmp(&a.report.id))
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn insert(&self, report: report::Model) -> AppResult<report::Model> {
        let mut state = self.state.write().await;
        if state.reports.contains_key(&report.id) {
            return Err(AppError::Conflict(format!("report {} already exists", report.id)));
        }
        state
            .reports
            .insert(report.id.clone(), ReportAggregate::new(report.clone()));
        Ok(report)
    }

    async fn find(&self, id: &str) -> AppResult<Option<ReportAggregate>> {
        Ok(self.state.read().await.reports.get(id).cloned())
    }

    async fn list(&self, query: &ReportQuery) -> AppResult<Vec<ReportAggregate>> {
        let state = self.state.read().await;
        let mut reports: Vec<ReportAggregate> = state
            .reports
            .values()
            .filter(|r| query.matches(&r.report))
            .cloned()
            .collect();
        reports.sort_by(newest_first);
        if let Some(limit) = query.limit {
            reports.truncate(limit as usize);
        }
        Ok(reports)
    }

    async fn count(&self, query: &ReportQuery, exclude_id: Option<&str>) -> AppResult<u64> {
        let state = self.state.read().await;
        let count = state
            .reports
            .values()
            .filter(|r| Some(r.report.id.as_str()) != exclude_id)
            .filter(|r| query.matches(&r.report))
            .count();
        Ok(count as u64)
    }

    async fn increment_upvotes(&self, id: &str) -> AppResult<Option<ReportAggregate>> {
        let mut state = self.state.write().await;
        Ok(state.reports.get_mut(id).map(|aggregate| {
            aggregate.report.upvotes += 1;
            aggregate.report.updated_at = Some(Utc::now().into());
            aggregate.clone()
        }))
    }

    async fn append_verification(
        &self,
        id: &str,
        verification: NewVerification,
    ) -> AppResult<Option<ReportAggregate>> {
        let mut state = self.state.write().await;
        Ok(state.reports.get_mut(id).map(|aggregate| {
            let verifier = verification.verified_by.clone();
            aggregate.report.upvotes += 1;
            aggregate.report.updated_at = Some(Utc::now().into());
            if aggregate.report.verified_by.is_none() {
                aggregate.report.verified_by = Some(verifier);
            }
            aggregate.verifications.push(verification.into_model(id));
            aggregate.clone()
        }))
    }

    async fn set_action_status(
        &self,
        id: &str,
        status: ActionStatus,
    ) -> AppResult<Option<ReportAggregate>> {
        let mut state = self.state.write().await;
        Ok(state.reports.get_mut(id).map(|aggregate| {
            aggregate.report.action_acted = Some(status.acted);
            aggregate.report.action_status = Some(status.status);
            aggregate.report.updated_at = Some(Utc::now().into());
            aggregate.clone()
        }))
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state.reports.remove(id).is_none() {
            return Ok(false);
        }
        state.comments.retain(|c| c.report_id != id);
        state.assessments.remove(id);
        Ok(true)
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert(&self, comment: comment::Model) -> AppResult<comment::Model> {
        let mut state = self.state.write().await;
        if !state.reports.contains_key(&comment.report_id) {
            return Err(AppError::ReportNotFound(comment.report_id));
        }
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list(&self, report_id: Option<&str>) -> AppResult<Vec<comment::Model>> {
        let state = self.state.read().await;
        let mut comments: Vec<comment::Model> = state
            .comments
            .iter()
            .filter(|c| report_id.is_none_or(|id| c.report_id == id))
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(comments)
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn record(
        &self,
        report_id: &str,
        submitter: &str,
        severity: Severity,
    ) -> AppResult<Option<CommunityAssessment>> {
        let mut state = self.state.write().await;
        let Some(aggregate) = state.reports.get_mut(report_id) else {
            return Ok(None);
        };
        aggregate.report.engagement_count += 1;
        let report = aggregate.report.clone();

        state
            .assessments
            .entry(report_id.to_string())
            .or_default()
            .insert(submitter.to_string(), severity);

        Ok(Some(state.assessment(&report)))
    }

    async fn load(&self, report_id: &str) -> AppResult<Option<CommunityAssessment>> {
        let state = self.state.read().await;
        Ok(state
            .reports
            .get(report_id)
            .map(|aggregate| state.assessment(&aggregate.report)))
    }
}
