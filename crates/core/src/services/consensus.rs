//! Community severity consensus.
//!
//! Each submitter holds at most one live score per report; a later score from
//! the same submitter replaces the earlier one. The consensus label is derived
//! from the scores on every read and never stored.

use std::collections::BTreeMap;

use ecowatch_common::{AppError, AppResult, Severity, SeverityLabel, get_metrics};
use serde::Serialize;
use tracing::info;

use crate::store::AssessmentStoreService;

/// Per-report community scores.
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityAssessment {
    report_id: String,
    original_severity: Severity,
    scores: BTreeMap<String, Severity>,
    engagement_count: u32,
}

impl CommunityAssessment {
    /// Empty assessment for a report.
    #[must_use]
    pub fn new(report_id: &str, original_severity: Severity) -> Self {
        Self {
            report_id: report_id.to_string(),
            original_severity,
            scores: BTreeMap::new(),
            engagement_count: 0,
        }
    }

    /// Rebuild from persisted columns.
    #[must_use]
    pub fn from_parts(
        report_id: &str,
        original_severity: i32,
        scores: BTreeMap<String, Severity>,
        engagement_count: i32,
    ) -> Self {
        Self {
            report_id: report_id.to_string(),
            original_severity: Severity::new(original_severity.clamp(1, 5))
                .unwrap_or(Severity::MIN),
            scores,
            engagement_count: engagement_count.max(0) as u32,
        }
    }

    /// Record a score. Replaces the submitter's previous score, if any, and
    /// always counts as one more engagement.
    pub fn record(&mut self, submitter: &str, severity: Severity) {
        self.scores.insert(submitter.to_string(), severity);
        self.engagement_count += 1;
    }

    #[must_use]
    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    #[must_use]
    pub const fn original_severity(&self) -> Severity {
        self.original_severity
    }

    #[must_use]
    pub const fn scores(&self) -> &BTreeMap<String, Severity> {
        &self.scores
    }

    #[must_use]
    pub const fn engagement_count(&self) -> u32 {
        self.engagement_count
    }

    /// Mean of the live scores. `None` when nobody has scored yet.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        let total: u32 = self.scores.values().map(|s| u32::from(s.value())).sum();
        Some(f64::from(total) / self.scores.len() as f64)
    }

    /// Label of the mean, or of the reporter's own severity when there are no scores.
    #[must_use]
    pub fn consensus_label(&self) -> SeverityLabel {
        self.mean().map_or_else(
            || self.original_severity.label(),
            SeverityLabel::from_score,
        )
    }

    #[must_use]
    pub fn summary(&self) -> ConsensusSummary {
        ConsensusSummary {
            report_id: self.report_id.clone(),
            consensus_label: self.consensus_label(),
            mean: self.mean(),
            engagement_count: self.engagement_count,
            assessment_count: self.scores.len(),
            original_severity: self.original_severity,
        }
    }
}

/// What callers see of a report's consensus.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusSummary {
    pub report_id: String,
    pub consensus_label: SeverityLabel,
    pub mean: Option<f64>,
    pub engagement_count: u32,
    pub assessment_count: usize,
    pub original_severity: Severity,
}

/// Consensus service for business logic.
#[derive(Clone)]
pub struct ConsensusService {
    store: AssessmentStoreService,
}

impl ConsensusService {
    /// Create a new consensus service.
    #[must_use]
    pub fn new(store: AssessmentStoreService) -> Self {
        Self { store }
    }

    /// Record `submitter`'s score for a report and return the new consensus.
    pub async fn submit(
        &self,
        report_id: &str,
        submitter: &str,
        severity: i32,
    ) -> AppResult<ConsensusSummary> {
        let severity = Severity::new(severity)?;
        let submitter = submitter.trim();
        if submitter.is_empty() {
            return Err(AppError::Validation(
                "submitterIdentity is required".to_string(),
            ));
        }

        let assessment = self
            .store
            .record(report_id, submitter, severity)
            .await
            .inspect_err(|_| get_metrics().record_store_error())?
            .ok_or_else(|| AppError::ReportNotFound(report_id.to_string()))?;

        get_metrics().record_assessment();
        let summary = assessment.summary();
        info!(
            report_id = %report_id,
            severity = %severity,
            consensus = %summary.consensus_label,
            engagement = summary.engagement_count,
            "Severity assessment recorded"
        );
        Ok(summary)
    }

    /// Current consensus for a report.
    pub async fn get(&self, report_id: &str) -> AppResult<ConsensusSummary> {
        self.store
            .load(report_id)
            .await?
            .map(|assessment| assessment.summary())
            .ok_or_else(|| AppError::ReportNotFound(report_id.to_string()))
    }
}
