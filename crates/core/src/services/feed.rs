//! Feed filtering.

use ecowatch_common::SeverityLabel;
use ecowatch_db::entities::report::ReportType;
use serde::Deserialize;

use crate::store::ReportAggregate;

/// Lifecycle state a report can be filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ReportStatus {
    /// Someone has verified it in person.
    Verified,
    /// The authority has acted on it.
    Resolved,
    /// Neither verified nor acted on.
    Pending,
}

impl ReportStatus {
    fn holds_for(self, aggregate: &ReportAggregate) -> bool {
        let verified = aggregate.report.verified_by.is_some();
        let acted = aggregate.is_acted();
        match self {
            Self::Verified => verified,
            Self::Resolved => acted,
            Self::Pending => !verified && !acted,
        }
    }
}

/// Filter applied to the newest-first report list before grouping.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedFilter {
    /// Free text matched against label, description, type name and hashtag.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    /// Empty means every type.
    #[serde(default)]
    pub types: Vec<ReportType>,
    /// Empty means every severity.
    #[serde(default)]
    pub severities: Vec<i32>,
    #[serde(default)]
    pub acted: Option<bool>,
    /// A report passes when any listed status holds. Empty means every status.
    #[serde(default)]
    pub status: Vec<ReportStatus>,
    /// Consensus labels to keep. Reports nobody has assessed never match a
    /// non-empty list.
    #[serde(default, rename = "communitySeverity", alias = "communitySeverities")]
    pub community_severities: Vec<SeverityLabel>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl FeedFilter {
    #[must_use]
    pub fn matches(&self, aggregate: &ReportAggregate) -> bool {
        let report = &aggregate.report;

        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let hit = contains_ci(&report.label, &needle)
                || report
                    .description
                    .as_deref()
                    .is_some_and(|d| contains_ci(d, &needle))
                || contains_ci(report.report_type.name(), &needle)
                || contains_ci(&report.report_type.hashtag(), &needle);
            if !hit {
                return false;
            }
        }

        if let Some(place) = self
            .location_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            if !contains_ci(&report.location_name, &place.to_lowercase()) {
                return false;
            }
        }

        if !self.types.is_empty() && !self.types.contains(&report.report_type) {
            return false;
        }

        if !self.severities.is_empty() && !self.severities.contains(&report.severity) {
            return false;
        }

        if !self.status.is_empty() && !self.status.iter().any(|s| s.holds_for(aggregate)) {
            return false;
        }

        self.acted.is_none_or(|acted| aggregate.is_acted() == acted)
    }

    /// Whether the consensus filter needs assessments loaded at all.
    #[must_use]
    pub fn filters_community_severity(&self) -> bool {
        !self.community_severities.is_empty()
    }

    /// Check a report's consensus label, `None` when it has no assessments.
    #[must_use]
    pub fn matches_consensus(&self, consensus: Option<SeverityLabel>) -> bool {
        if self.community_severities.is_empty() {
            return true;
        }
        consensus.is_some_and(|label| self.community_severities.contains(&label))
    }
}
